//! Fullscreen zoom/pan viewport.
//!
//! Every zoom-changing input (wheel, pinch, buttons, slider, double-tap)
//! funnels through [`ZoomPanViewport::apply_zoom`], which preserves the
//! anchor point and clamps pan against the geometry bounds. The viewport
//! also owns the debounced decision to upgrade the displayed source to a
//! higher-resolution rendition as zoom increases.

use log::debug;
use serde::Serialize;

use crate::config::{Millis, ViewerTunables};
use crate::descriptor::{ImageDescriptor, RenditionRole};
use crate::frame::FrameCoalescer;
use crate::minimap::{self, MinimapView};
use crate::resolver;

/// Zoom comparisons closer than this are treated as no-ops
pub const ZOOM_EPSILON: f32 = 1e-3;

/// A point in viewport coordinates, relative to the viewport center
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero-sized or non-finite dimensions cannot produce geometry; they are
    /// a common transient during initial mount and must never yield NaN pan
    /// bounds downstream.
    pub fn is_renderable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Derived layout of the image inside the container at a given zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportGeometry {
    /// Scale that fits the image in the container at zoom 1
    pub fit_ratio: f32,
    pub base_width: f32,
    pub base_height: f32,
    pub scaled_width: f32,
    pub scaled_height: f32,
    /// Legal pan bound: `pan.x` in `[-max_pan_x, max_pan_x]`
    pub max_pan_x: f32,
    pub max_pan_y: f32,
}

/// Computes the layout for a container/image pair at a zoom level.
///
/// Returns `None` when either size is not renderable or the zoom is not a
/// positive finite number.
pub fn geometry(container: Size, natural: Size, zoom: f32) -> Option<ViewportGeometry> {
    if !container.is_renderable() || !natural.is_renderable() || !zoom.is_finite() || zoom <= 0.0 {
        return None;
    }

    let fit_ratio = (container.width / natural.width).min(container.height / natural.height);
    let base_width = natural.width * fit_ratio;
    let base_height = natural.height * fit_ratio;
    let scaled_width = base_width * zoom;
    let scaled_height = base_height * zoom;

    Some(ViewportGeometry {
        fit_ratio,
        base_width,
        base_height,
        scaled_width,
        scaled_height,
        max_pan_x: ((scaled_width - container.width) / 2.0).max(0.0),
        max_pan_y: ((scaled_height - container.height) / 2.0).max(0.0),
    })
}

/// The rendition currently backing the fullscreen image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSource {
    pub url: String,
    pub width: u32,
}

/// A pending resolution upgrade. The candidate must be fully preloaded
/// before the host passes the id back to `complete_upgrade`; the displayed
/// pixels never regress to a placeholder during an upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeRequest {
    pub id: u64,
    pub url: String,
    pub width: u32,
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    start_distance: f32,
    start_zoom: f32,
}

#[derive(Debug)]
pub struct ZoomPanViewport {
    container: Size,
    natural: Option<Size>,
    device_pixel_ratio: f32,
    touch_primary: bool,
    zoom: f32,
    pan: Point,
    max_zoom: f32,
    dragging: bool,
    drag_origin: Option<(Point, Point)>,
    pan_frames: FrameCoalescer<Point>,
    pinch: Option<PinchState>,
    interacting_until: Option<Millis>,
    active_source: Option<ActiveSource>,
    inflight_upgrade: Option<UpgradeRequest>,
    upgrade_seq: u64,
    needs_upgrade_check: bool,
    tunables: ViewerTunables,
}

impl ZoomPanViewport {
    pub fn new(
        container: Size,
        device_pixel_ratio: f32,
        touch_primary: bool,
        tunables: ViewerTunables,
    ) -> Self {
        let mut viewport = Self {
            container,
            natural: None,
            device_pixel_ratio,
            touch_primary,
            zoom: 1.0,
            pan: Point::ZERO,
            max_zoom: 1.0,
            dragging: false,
            drag_origin: None,
            pan_frames: FrameCoalescer::new(),
            pinch: None,
            interacting_until: None,
            active_source: None,
            inflight_upgrade: None,
            upgrade_seq: 0,
            needs_upgrade_check: true,
            tunables,
        };
        viewport.recompute_max_zoom();
        viewport
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// True while a continuous zoom gesture is in progress or within the
    /// settle window after the last zoom/pan input
    pub fn is_zoom_interacting(&self, now: Millis) -> bool {
        self.pinch.is_some() || self.interacting_until.is_some_and(|until| now < until)
    }

    /// Combined interaction flag; suppresses minimap rendering and animated
    /// transitions while true
    pub fn is_interacting(&self, now: Millis) -> bool {
        self.dragging || self.is_zoom_interacting(now)
    }

    pub fn active_source(&self) -> Option<&ActiveSource> {
        self.active_source.as_ref()
    }

    /// Seeds the displayed source (the hero rendition shown when fullscreen
    /// opened). Upgrades are measured against this width.
    pub fn set_active_source(&mut self, url: impl Into<String>, width: u32) {
        self.active_source = Some(ActiveSource {
            url: url.into(),
            width,
        });
    }

    /// Geometry at the current zoom; `None` until both container and natural
    /// sizes are known and renderable
    pub fn current_geometry(&self) -> Option<ViewportGeometry> {
        geometry(self.container, self.natural?, self.zoom)
    }

    pub fn set_container_size(&mut self, container: Size) {
        self.container = container;
        self.recompute_max_zoom();
        self.pan = self.clamp_pan(self.pan);
        // upgrade choice depends on container width; re-evaluate on resize
        self.needs_upgrade_check = true;
    }

    pub fn set_natural_size(&mut self, natural: Size) {
        self.natural = Some(natural);
        self.recompute_max_zoom();
        self.pan = self.clamp_pan(self.pan);
        self.needs_upgrade_check = true;
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        if ratio.is_finite() && ratio > 0.0 {
            self.device_pixel_ratio = ratio;
            self.needs_upgrade_check = true;
        }
    }

    /// Applies a zoom change, keeping the image point under `anchor` (viewport
    /// coordinates, defaulting to the center) visually fixed up to clamping.
    /// Returns false when the clamped target equals the current zoom.
    pub fn apply_zoom(&mut self, target_zoom: f32, anchor: Option<Point>) -> bool {
        if !target_zoom.is_finite() {
            return false;
        }
        let clamped = target_zoom.clamp(1.0, self.max_zoom);
        if (clamped - self.zoom).abs() < ZOOM_EPSILON {
            return false;
        }

        let anchor = anchor.unwrap_or(Point::ZERO);
        let ratio = clamped / self.zoom;
        let rescaled = Point::new(
            self.pan.x * ratio + (1.0 - ratio) * anchor.x,
            self.pan.y * ratio + (1.0 - ratio) * anchor.y,
        );

        self.zoom = clamped;
        self.pan = self.clamp_pan(rescaled);
        self.needs_upgrade_check = true;
        true
    }

    /// Wheel zoom with exponential response; `cursor` anchors the zoom
    pub fn wheel(&mut self, delta_y: f32, zoom_modifier: bool, cursor: Point, now: Millis) -> bool {
        let rate = if zoom_modifier {
            self.tunables.wheel_zoom_rate_modified
        } else {
            self.tunables.wheel_zoom_rate
        };
        let factor = (-delta_y * rate).exp();
        self.mark_interaction(now);
        self.apply_zoom(self.zoom * factor, Some(cursor))
    }

    pub fn pinch_start(&mut self, a: Point, b: Point) {
        let start_distance = distance(a, b);
        if start_distance <= f32::EPSILON {
            return;
        }
        self.pinch = Some(PinchState {
            start_distance,
            start_zoom: self.zoom,
        });
    }

    /// Continuous pinch: zoom scales with the distance ratio since gesture
    /// start, anchored at the midpoint of the two touches
    pub fn pinch_move(&mut self, a: Point, b: Point) -> bool {
        let Some(state) = self.pinch else {
            return false;
        };
        let current_distance = distance(a, b);
        if current_distance <= f32::EPSILON {
            return false;
        }
        let target = state.start_zoom * (current_distance / state.start_distance);
        let midpoint = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        self.apply_zoom(target, Some(midpoint))
    }

    pub fn pinch_end(&mut self, now: Millis) {
        if self.pinch.take().is_some() {
            self.mark_interaction(now);
        }
    }

    /// Double-tap toggles between fit and a 2x zoom anchored at the tap
    pub fn double_tap(&mut self, point: Point, now: Millis) -> bool {
        self.mark_interaction(now);
        if self.zoom > 1.0 + ZOOM_EPSILON {
            self.apply_zoom(1.0, None)
        } else {
            self.apply_zoom(2.0, Some(point))
        }
    }

    /// Drag panning is only active above zoom 1. Returns false when the
    /// gesture cannot start.
    pub fn drag_start(&mut self, pointer: Point) -> bool {
        if self.zoom <= 1.0 + ZOOM_EPSILON {
            return false;
        }
        self.dragging = true;
        self.drag_origin = Some((pointer, self.pan));
        true
    }

    /// Records pointer movement during a drag. Writes are coalesced; the
    /// return value tells the host to schedule an animation frame, and
    /// `on_animation_frame` commits the latest position.
    pub fn drag_move(&mut self, pointer: Point) -> bool {
        let Some((origin, pan_at_start)) = self.drag_origin else {
            return false;
        };
        let target = Point::new(
            pan_at_start.x + (pointer.x - origin.x),
            pan_at_start.y + (pointer.y - origin.y),
        );
        self.pan_frames.submit(target)
    }

    /// Frame callback: commits the most recent coalesced pan write. Returns
    /// true when the pan actually changed.
    pub fn on_animation_frame(&mut self) -> bool {
        if let Some(target) = self.pan_frames.take() {
            let clamped = self.clamp_pan(target);
            if clamped != self.pan {
                self.pan = clamped;
                return true;
            }
        }
        false
    }

    pub fn drag_end(&mut self, now: Millis) {
        if !self.dragging && self.drag_origin.is_none() {
            return;
        }
        // commit any pan still waiting on a frame
        self.on_animation_frame();
        self.dragging = false;
        self.drag_origin = None;
        self.mark_interaction(now);
    }

    /// Discrete zoom step size for the current zoom band
    pub fn zoom_step(&self) -> f32 {
        if self.zoom < 2.0 {
            0.2
        } else if self.zoom < 4.0 {
            0.35
        } else {
            0.5
        }
    }

    pub fn zoom_in(&mut self) -> bool {
        self.apply_zoom(self.zoom + self.zoom_step(), None)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.apply_zoom(self.zoom - self.zoom_step(), None)
    }

    /// Direct slider value
    pub fn set_zoom(&mut self, value: f32) -> bool {
        self.apply_zoom(value, None)
    }

    /// Restores pan directly (e.g. a host rehydrating state); clamped
    pub fn set_pan(&mut self, pan: Point) {
        self.pan = self.clamp_pan(pan);
    }

    /// Unconditional return to the fitted view
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Point::ZERO;
        self.drag_origin = None;
        self.dragging = false;
        self.pinch = None;
        self.needs_upgrade_check = true;
    }

    /// Minimap overlay for the current state; suppressed at zoom 1 and while
    /// interacting
    pub fn minimap(&self, now: Millis) -> Option<MinimapView> {
        if self.is_interacting(now) {
            return None;
        }
        let geometry = self.current_geometry()?;
        minimap::minimap(
            &geometry,
            self.container,
            self.pan,
            self.zoom,
            self.touch_primary,
        )
    }

    /// Debounced resolution-upgrade decision.
    ///
    /// Never switches sources while interacting; after the settle window plus
    /// the upgrade debounce it compares the zoom-implied target width against
    /// the active source and issues a request when the best candidate clears
    /// the minimum-gain margin. Each request carries a monotonically
    /// increasing id; only the newest id is accepted by `complete_upgrade`.
    pub fn poll_upgrade(
        &mut self,
        descriptor: &ImageDescriptor,
        now: Millis,
    ) -> Option<UpgradeRequest> {
        if !self.needs_upgrade_check {
            return None;
        }
        if self.dragging || self.pinch.is_some() {
            return None;
        }
        if let Some(until) = self.interacting_until {
            if now < until + self.tunables.upgrade_debounce_ms {
                return None;
            }
        }
        self.current_geometry()?;
        self.needs_upgrade_check = false;

        let target_width = (self.container.width
            * self.zoom
            * self.device_pixel_ratio
            * self.tunables.upgrade_headroom)
            .ceil() as u32;
        let candidate =
            resolver::resolve_rendition(descriptor, RenditionRole::Detail, target_width, true)?;

        if let Some(active) = &self.active_source {
            if candidate.url == active.url {
                return None;
            }
            let min_gain = (active.width as f32 * self.tunables.upgrade_min_gain_ratio)
                .max(self.tunables.upgrade_min_gain_px as f32);
            if (candidate.width as f32) < active.width as f32 + min_gain {
                debug!(
                    "skipping source upgrade {} -> {} (gain below margin)",
                    active.width, candidate.width
                );
                return None;
            }
        }

        self.upgrade_seq += 1;
        let request = UpgradeRequest {
            id: self.upgrade_seq,
            url: candidate.url.clone(),
            width: candidate.width,
        };
        self.inflight_upgrade = Some(request.clone());
        Some(request)
    }

    /// Commits a fully preloaded upgrade. Results for any id other than the
    /// newest outstanding request are discarded.
    pub fn complete_upgrade(&mut self, id: u64) -> bool {
        match self.inflight_upgrade.take() {
            Some(request) if request.id == id && id == self.upgrade_seq => {
                debug!("source upgraded to {} ({}px)", request.url, request.width);
                self.active_source = Some(ActiveSource {
                    url: request.url,
                    width: request.width,
                });
                true
            }
            other => {
                debug!("discarding stale upgrade result (request {id})");
                self.inflight_upgrade = other;
                false
            }
        }
    }

    /// Preload failure: the active source stays unchanged; the next settle
    /// cycle may retry.
    pub fn fail_upgrade(&mut self, id: u64) {
        if self
            .inflight_upgrade
            .as_ref()
            .is_some_and(|request| request.id == id)
        {
            self.inflight_upgrade = None;
            self.needs_upgrade_check = true;
        }
    }

    fn mark_interaction(&mut self, now: Millis) {
        self.interacting_until = Some(now + self.tunables.interaction_settle_ms);
    }

    fn clamp_pan(&self, pan: Point) -> Point {
        match self.current_geometry() {
            Some(geometry) => Point::new(
                pan.x.clamp(-geometry.max_pan_x, geometry.max_pan_x),
                pan.y.clamp(-geometry.max_pan_y, geometry.max_pan_y),
            ),
            None => Point::ZERO,
        }
    }

    // Max zoom is derived, not fixed: how many native pixels back each
    // displayed pixel at zoom 1, times a usability headroom, clamped per
    // input modality. The user can never zoom past native resolution plus
    // that margin.
    fn recompute_max_zoom(&mut self) {
        let (low, high, headroom) = if self.touch_primary {
            (3.0, 6.0, 1.5)
        } else {
            (4.0, 10.0, 2.0)
        };

        let density = self
            .natural
            .and_then(|natural| geometry(self.container, natural, 1.0).map(|g| (natural, g)))
            .map(|(natural, g)| (natural.width / g.base_width).min(natural.height / g.base_height));

        self.max_zoom = match density {
            Some(density) => (density * headroom).clamp(low, high),
            None => low,
        };

        if self.zoom > self.max_zoom {
            self.zoom = self.max_zoom;
            self.pan = self.clamp_pan(self.pan);
        }
    }
}

fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}
