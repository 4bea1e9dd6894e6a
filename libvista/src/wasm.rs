//! WebAssembly bindings for the viewer core

use js_sys::Array;
use wasm_bindgen::prelude::*;

use crate::config::ViewerTunables;
use crate::descriptor::ImageDescriptor;
use crate::error::ViewerError;
use crate::prefetch::PrefetchJob;
use crate::session::{Key, SessionOptions, ViewerSession, ViewerState};
use crate::viewport::{Point, Size, ZoomPanViewport};

/// JavaScript-friendly error type
#[wasm_bindgen]
pub struct ViewerWasmError {
    message: String,
}

#[wasm_bindgen]
impl ViewerWasmError {
    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<ViewerError> for ViewerWasmError {
    fn from(error: ViewerError) -> Self {
        Self {
            message: error.to_string(),
        }
    }
}

/// WASM wrapper for the fullscreen zoom/pan viewport
#[wasm_bindgen]
pub struct ViewportHandle {
    inner: ZoomPanViewport,
    descriptor: Option<ImageDescriptor>,
}

#[wasm_bindgen]
impl ViewportHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_width: f64,
        container_height: f64,
        device_pixel_ratio: f64,
        touch_primary: bool,
    ) -> ViewportHandle {
        ViewportHandle {
            inner: ZoomPanViewport::new(
                Size::new(container_width as f32, container_height as f32),
                device_pixel_ratio as f32,
                touch_primary,
                ViewerTunables::default(),
            ),
            descriptor: None,
        }
    }

    /// Supplies the image descriptor (JSON) used for natural dimensions and
    /// resolution upgrades
    pub fn set_descriptor(&mut self, json: &str) -> Result<(), ViewerWasmError> {
        let mut descriptor: ImageDescriptor =
            serde_json::from_str(json).map_err(ViewerError::from)?;
        descriptor.normalize();
        if let Some((width, height)) = descriptor.natural_size() {
            self.inner
                .set_natural_size(Size::new(width as f32, height as f32));
        }
        self.descriptor = Some(descriptor);
        Ok(())
    }

    pub fn set_active_source(&mut self, url: &str, width: u32) {
        self.inner.set_active_source(url, width);
    }

    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.inner
            .set_container_size(Size::new(width as f32, height as f32));
    }

    pub fn zoom(&self) -> f64 {
        f64::from(self.inner.zoom())
    }

    pub fn max_zoom(&self) -> f64 {
        f64::from(self.inner.max_zoom())
    }

    pub fn pan_x(&self) -> f64 {
        f64::from(self.inner.pan().x)
    }

    pub fn pan_y(&self) -> f64 {
        f64::from(self.inner.pan().y)
    }

    /// Pan as a `[x, y]` array
    pub fn pan(&self) -> Array {
        let pan = self.inner.pan();
        let array = Array::new();
        array.push(&JsValue::from(f64::from(pan.x)));
        array.push(&JsValue::from(f64::from(pan.y)));
        array
    }

    pub fn wheel(
        &mut self,
        delta_y: f64,
        zoom_modifier: bool,
        cursor_x: f64,
        cursor_y: f64,
        now_ms: f64,
    ) -> bool {
        self.inner.wheel(
            delta_y as f32,
            zoom_modifier,
            Point::new(cursor_x as f32, cursor_y as f32),
            now_ms,
        )
    }

    pub fn pinch_start(&mut self, ax: f64, ay: f64, bx: f64, by: f64) {
        self.inner.pinch_start(
            Point::new(ax as f32, ay as f32),
            Point::new(bx as f32, by as f32),
        );
    }

    pub fn pinch_move(&mut self, ax: f64, ay: f64, bx: f64, by: f64) -> bool {
        self.inner.pinch_move(
            Point::new(ax as f32, ay as f32),
            Point::new(bx as f32, by as f32),
        )
    }

    pub fn pinch_end(&mut self, now_ms: f64) {
        self.inner.pinch_end(now_ms);
    }

    pub fn double_tap(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.inner.double_tap(Point::new(x as f32, y as f32), now_ms)
    }

    pub fn drag_start(&mut self, x: f64, y: f64) -> bool {
        self.inner.drag_start(Point::new(x as f32, y as f32))
    }

    /// Returns true when the host should schedule an animation frame
    pub fn drag_move(&mut self, x: f64, y: f64) -> bool {
        self.inner.drag_move(Point::new(x as f32, y as f32))
    }

    pub fn on_animation_frame(&mut self) -> bool {
        self.inner.on_animation_frame()
    }

    pub fn drag_end(&mut self, now_ms: f64) {
        self.inner.drag_end(now_ms);
    }

    pub fn zoom_in(&mut self) -> bool {
        self.inner.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.inner.zoom_out()
    }

    pub fn set_zoom(&mut self, value: f64) -> bool {
        self.inner.set_zoom(value as f32)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    pub fn is_interacting(&self, now_ms: f64) -> bool {
        self.inner.is_interacting(now_ms)
    }

    /// Current geometry as a JSON string, or `None` before sizes are known
    pub fn geometry_json(&self) -> Option<String> {
        self.inner
            .current_geometry()
            .and_then(|geometry| serde_json::to_string(&geometry).ok())
    }

    /// Minimap rectangle as a JSON string, when one should be rendered
    pub fn minimap_json(&self, now_ms: f64) -> Option<String> {
        self.inner
            .minimap(now_ms)
            .and_then(|view| serde_json::to_string(&view).ok())
    }

    /// Polls the debounced upgrade decision; returns the request as JSON
    pub fn poll_upgrade(&mut self, now_ms: f64) -> Option<String> {
        let descriptor = self.descriptor.clone()?;
        self.inner
            .poll_upgrade(&descriptor, now_ms)
            .and_then(|request| serde_json::to_string(&request).ok())
    }

    pub fn complete_upgrade(&mut self, id: f64) -> bool {
        self.inner.complete_upgrade(id as u64)
    }

    pub fn fail_upgrade(&mut self, id: f64) {
        self.inner.fail_upgrade(id as u64);
    }
}

/// WASM wrapper for the per-listing viewer session
#[wasm_bindgen]
pub struct SessionHandle {
    inner: ViewerSession,
}

#[wasm_bindgen]
impl SessionHandle {
    /// Creates a session from a JSON array of image descriptors
    #[wasm_bindgen(constructor)]
    pub fn new(
        manifest_json: &str,
        title: &str,
        touch_primary: bool,
    ) -> Result<SessionHandle, ViewerWasmError> {
        let images: Vec<ImageDescriptor> =
            serde_json::from_str(manifest_json).map_err(ViewerError::from)?;
        let options = SessionOptions {
            title: title.to_string(),
            touch_primary,
            ..SessionOptions::default()
        };
        Ok(SessionHandle {
            inner: ViewerSession::new(images, options),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state() == ViewerState::Empty
    }

    pub fn image_count(&self) -> usize {
        self.inner.image_count()
    }

    pub fn current_index(&self) -> usize {
        self.inner.current_index()
    }

    pub fn hero_url(&self) -> Option<String> {
        self.inner.hero_url()
    }

    pub fn thumbnail_url(&self, index: usize) -> Option<String> {
        self.inner.thumbnail_url(index)
    }

    /// Navigation entry points return the started prefetch jobs as JSON
    pub fn next(&mut self, now_ms: f64) -> String {
        jobs_json(&self.inner.next(now_ms))
    }

    pub fn previous(&mut self, now_ms: f64) -> String {
        jobs_json(&self.inner.previous(now_ms))
    }

    pub fn slide_to(&mut self, index: usize, now_ms: f64) -> String {
        jobs_json(&self.inner.slide_to(index, now_ms))
    }

    pub fn arrow_key(&mut self, right: bool, now_ms: f64) -> String {
        let key = if right { Key::ArrowRight } else { Key::ArrowLeft };
        jobs_json(&self.inner.handle_key(key, now_ms))
    }

    pub fn pointer_down(&mut self, now_ms: f64) -> String {
        jobs_json(&self.inner.pointer_down(now_ms))
    }

    pub fn touch_start(&mut self, x: f64, now_ms: f64) -> String {
        jobs_json(&self.inner.touch_start(x as f32, now_ms))
    }

    pub fn touch_end(&mut self, x: f64, now_ms: f64) -> String {
        jobs_json(&self.inner.touch_end(x as f32, now_ms))
    }

    pub fn hero_loaded(&mut self, now_ms: f64) -> String {
        jobs_json(&self.inner.hero_loaded(now_ms))
    }

    pub fn prefetch_complete(&mut self, generation: f64, url: &str, success: bool) -> String {
        jobs_json(&self.inner.prefetch_complete(generation as u64, url, success))
    }

    /// Drains pending events as a JSON array
    pub fn poll_events_json(&mut self) -> String {
        serde_json::to_string(&self.inner.poll_events()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn thumbnail_scroll_offset(&self, thumb_width: f64, gap: f64, strip_width: f64) -> f64 {
        f64::from(self.inner.thumbnail_scroll_offset(
            thumb_width as f32,
            gap as f32,
            strip_width as f32,
        ))
    }

    pub fn close(&mut self) {
        self.inner.close();
    }
}

fn jobs_json(jobs: &[PrefetchJob]) -> String {
    serde_json::to_string(jobs).unwrap_or_else(|_| "[]".to_string())
}
