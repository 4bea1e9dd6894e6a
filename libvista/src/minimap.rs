//! Minimap overlay computation.

use serde::Serialize;

use crate::viewport::{Point, Size, ViewportGeometry};

/// Minimap box width on touch-primary layouts
pub const TOUCH_BOX_WIDTH: f32 = 92.0;

/// Minimap box width on pointer layouts
pub const POINTER_BOX_WIDTH: f32 = 150.0;

/// The overlay box and the visible-crop rectangle inside it, both in
/// minimap-local pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinimapView {
    pub box_width: f32,
    pub box_height: f32,
    pub crop_x: f32,
    pub crop_y: f32,
    pub crop_width: f32,
    pub crop_height: f32,
}

/// Pure function of geometry, pan, and zoom.
///
/// The crop rectangle is the part of the base image visible through the
/// container, clamped into the image and scaled into the minimap box. Returns
/// `None` at zoom 1 or below (nothing is cropped, the overlay carries no
/// information); interaction-based suppression is the caller's concern.
pub fn minimap(
    geometry: &ViewportGeometry,
    container: Size,
    pan: Point,
    zoom: f32,
    touch_primary: bool,
) -> Option<MinimapView> {
    if zoom <= 1.0 || geometry.base_width <= 0.0 || geometry.base_height <= 0.0 {
        return None;
    }

    let box_width = if touch_primary {
        TOUCH_BOX_WIDTH
    } else {
        POINTER_BOX_WIDTH
    };
    let box_height = box_width * geometry.base_height / geometry.base_width;

    let visible_width = geometry.base_width.min(container.width / zoom);
    let visible_height = geometry.base_height.min(container.height / zoom);

    // The viewport center maps to this base-image point; pan offsets the
    // image center from the viewport center in screen pixels.
    let center_x = geometry.base_width / 2.0 - pan.x / zoom;
    let center_y = geometry.base_height / 2.0 - pan.y / zoom;

    let crop_left =
        (center_x - visible_width / 2.0).clamp(0.0, geometry.base_width - visible_width);
    let crop_top =
        (center_y - visible_height / 2.0).clamp(0.0, geometry.base_height - visible_height);

    let scale_x = box_width / geometry.base_width;
    let scale_y = box_height / geometry.base_height;

    Some(MinimapView {
        box_width,
        box_height,
        crop_x: crop_left * scale_x,
        crop_y: crop_top * scale_y,
        crop_width: visible_width * scale_x,
        crop_height: visible_height * scale_y,
    })
}
