use vista::*;

fn viewport(container: Size, natural: Size, touch: bool) -> ZoomPanViewport {
    let mut viewport = ZoomPanViewport::new(container, 1.0, touch, ViewerTunables::default());
    viewport.set_natural_size(natural);
    viewport
}

fn detail_descriptor(widths: &[u32], natural: (u32, u32)) -> ImageDescriptor {
    ImageDescriptor {
        id: "img".to_string(),
        original_path: "photos/img.jpg".to_string(),
        thumbnail_path: String::new(),
        renditions: widths
            .iter()
            .map(|&width| Rendition {
                width,
                url: format!("renditions/img-{width}.webp"),
                role: RenditionRole::Detail,
                encoding: "webp".to_string(),
            })
            .collect(),
        original_width: Some(natural.0),
        original_height: Some(natural.1),
    }
}

#[test]
fn test_geometry_fit_and_pan_bounds() {
    let g = geometry(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), 2.0).expect("geometry");

    assert!((g.fit_ratio - 0.5).abs() < 1e-6);
    assert!((g.base_width - 600.0).abs() < 1e-6);
    assert!((g.base_height - 400.0).abs() < 1e-6);
    assert!((g.scaled_width - 1200.0).abs() < 1e-6);
    assert!((g.max_pan_x - 300.0).abs() < 1e-6);
    assert!((g.max_pan_y - 200.0).abs() < 1e-6);
}

#[test]
fn test_geometry_no_pan_at_fit_zoom() {
    let g = geometry(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), 1.0).expect("geometry");
    assert_eq!(g.max_pan_x, 0.0);
    assert_eq!(g.max_pan_y, 0.0);
}

#[test]
fn test_geometry_defends_degenerate_inputs() {
    assert!(geometry(Size::new(0.0, 400.0), Size::new(1200.0, 800.0), 1.0).is_none());
    assert!(geometry(Size::new(600.0, 400.0), Size::new(0.0, 0.0), 1.0).is_none());
    assert!(geometry(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), f32::NAN).is_none());
    assert!(geometry(Size::new(f32::INFINITY, 400.0), Size::new(1200.0, 800.0), 1.0).is_none());
}

#[test]
fn test_max_zoom_derivation() {
    // density 4 at fit: pointer headroom 2.0 -> 8, touch headroom 1.5 -> 6
    let pointer = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);
    assert!((pointer.max_zoom() - 8.0).abs() < 1e-3);

    let touch = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), true);
    assert!((touch.max_zoom() - 6.0).abs() < 1e-3);
}

#[test]
fn test_max_zoom_clamped_for_small_images() {
    // image smaller than the container: density < 1, clamped to the floor
    let pointer = viewport(Size::new(1000.0, 1000.0), Size::new(500.0, 500.0), false);
    assert!((pointer.max_zoom() - 4.0).abs() < 1e-3);

    let touch = viewport(Size::new(1000.0, 1000.0), Size::new(500.0, 500.0), true);
    assert!((touch.max_zoom() - 3.0).abs() < 1e-3);
}

#[test]
fn test_max_zoom_ceiling() {
    // density 40 would allow 80x; clamped to the modality ceiling
    let pointer = viewport(Size::new(100.0, 75.0), Size::new(4000.0, 3000.0), false);
    assert!((pointer.max_zoom() - 10.0).abs() < 1e-3);
}

#[test]
fn test_apply_zoom_clamps_to_legal_range() {
    let mut v = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);

    v.apply_zoom(99.0, None);
    assert!((v.zoom() - v.max_zoom()).abs() < 1e-3);

    v.apply_zoom(0.1, None);
    assert!((v.zoom() - 1.0).abs() < 1e-3);
}

#[test]
fn test_apply_zoom_is_noop_within_epsilon() {
    let mut v = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);
    v.apply_zoom(2.0, None);
    assert!(!v.apply_zoom(2.0 + 1e-5, None));
}

#[test]
fn test_zoom_anchor_stays_fixed() {
    let mut v = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);

    let anchor = Point::new(120.0, -80.0);
    let z1 = v.zoom();
    let p1 = v.pan();
    // image point under the anchor before the change
    let q1 = Point::new((anchor.x - p1.x) / z1, (anchor.y - p1.y) / z1);

    v.apply_zoom(2.5, Some(anchor));

    let z2 = v.zoom();
    let p2 = v.pan();
    let q2 = Point::new((anchor.x - p2.x) / z2, (anchor.y - p2.y) / z2);

    assert!((q1.x - q2.x).abs() < 1e-3);
    assert!((q1.y - q2.y).abs() < 1e-3);
}

#[test]
fn test_pan_always_clamped() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    v.apply_zoom(2.0, None);

    v.set_pan(Point::new(1e6, -1e6));
    let g = v.current_geometry().expect("geometry");
    assert!(v.pan().x.abs() <= g.max_pan_x);
    assert!(v.pan().y.abs() <= g.max_pan_y);
    assert!((v.pan().x - g.max_pan_x).abs() < 1e-3);
    assert!((v.pan().y + g.max_pan_y).abs() < 1e-3);
}

#[test]
fn test_wheel_zooms_exponentially() {
    let mut v = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);

    // scrolling up (negative delta) zooms in
    v.wheel(-200.0, false, Point::ZERO, 1000.0);
    let plain = v.zoom();
    assert!(plain > 1.0);
    assert!((plain - (200.0f32 * 0.0022).exp()).abs() < 1e-3);

    // the modifier key steepens the response
    let mut v2 = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);
    v2.wheel(-200.0, true, Point::ZERO, 1000.0);
    assert!(v2.zoom() > plain);
}

#[test]
fn test_pinch_scales_with_distance_ratio() {
    let mut v = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);

    v.pinch_start(Point::new(-50.0, 0.0), Point::new(50.0, 0.0));
    v.pinch_move(Point::new(-100.0, 0.0), Point::new(100.0, 0.0));
    assert!((v.zoom() - 2.0).abs() < 1e-3);

    // shrink back toward the start distance
    v.pinch_move(Point::new(-60.0, 0.0), Point::new(60.0, 0.0));
    assert!((v.zoom() - 1.2).abs() < 1e-3);

    v.pinch_end(2000.0);
    assert!(v.is_zoom_interacting(2050.0));
    assert!(!v.is_zoom_interacting(2200.0));
}

#[test]
fn test_drag_requires_zoom() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    assert!(!v.drag_start(Point::ZERO));

    v.apply_zoom(2.0, None);
    assert!(v.drag_start(Point::ZERO));
}

#[test]
fn test_drag_pan_is_frame_coalesced() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    v.apply_zoom(2.0, None);

    v.drag_start(Point::new(0.0, 0.0));
    // first write in a burst schedules a frame; the rest coalesce
    assert!(v.drag_move(Point::new(10.0, 0.0)));
    assert!(!v.drag_move(Point::new(20.0, 5.0)));
    assert_eq!(v.pan(), Point::ZERO);

    // the frame commits only the latest position
    assert!(v.on_animation_frame());
    assert_eq!(v.pan(), Point::new(20.0, 5.0));

    v.drag_end(1000.0);
    assert!(!v.is_dragging());
}

#[test]
fn test_drag_end_commits_pending_pan() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    v.apply_zoom(2.0, None);

    v.drag_start(Point::ZERO);
    v.drag_move(Point::new(15.0, -10.0));
    v.drag_end(1000.0);

    assert_eq!(v.pan(), Point::new(15.0, -10.0));
}

#[test]
fn test_discrete_zoom_steps_by_band() {
    let mut v = viewport(Size::new(1000.0, 750.0), Size::new(4000.0, 3000.0), false);

    assert!((v.zoom_step() - 0.2).abs() < 1e-6);

    v.set_zoom(2.5);
    assert!((v.zoom_step() - 0.35).abs() < 1e-6);

    v.set_zoom(4.5);
    assert!((v.zoom_step() - 0.5).abs() < 1e-6);

    v.zoom_in();
    assert!((v.zoom() - 5.0).abs() < 1e-3);
}

#[test]
fn test_reset_returns_to_fit() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    v.apply_zoom(3.0, None);
    v.set_pan(Point::new(50.0, 50.0));

    v.reset();
    assert_eq!(v.zoom(), 1.0);
    assert_eq!(v.pan(), Point::ZERO);
}

#[test]
fn test_upgrade_end_to_end_scenario() {
    // 600px container, devicePixelRatio 2: target ~= 1320 once settled
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[400, 800, 1200], (2000, 1500));
    v.set_natural_size(Size::new(2000.0, 1500.0));

    let request = v.poll_upgrade(&descriptor, 0.0).expect("initial upgrade");
    assert_eq!(request.width, 1200);
    assert!(request.url.ends_with("img-1200.webp"));
    assert!(v.complete_upgrade(request.id));
    assert_eq!(v.active_source().map(|s| s.width), Some(1200));

    // zoom to 3x: target ~= 3960, but 1200 is still the largest available
    v.set_zoom(3.0);
    assert!(v.poll_upgrade(&descriptor, 100.0).is_none());
    assert_eq!(v.active_source().map(|s| s.width), Some(1200));
}

#[test]
fn test_upgrade_skips_marginal_gains() {
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[1200, 1330], (4000, 3000));
    v.set_natural_size(Size::new(4000.0, 3000.0));
    v.set_active_source("renditions/img-1200.webp", 1200);

    // target 1320 -> candidate 1330, gain 130 below max(140, 144)
    assert!(v.poll_upgrade(&descriptor, 0.0).is_none());
}

#[test]
fn test_upgrade_swaps_when_gain_clears_margin() {
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[1200, 2400], (4000, 3000));
    v.set_natural_size(Size::new(4000.0, 3000.0));
    v.set_active_source("renditions/img-1200.webp", 1200);

    let request = v.poll_upgrade(&descriptor, 0.0).expect("upgrade request");
    assert_eq!(request.width, 2400);
    assert!(v.complete_upgrade(request.id));
    assert_eq!(v.active_source().map(|s| s.width), Some(2400));
}

#[test]
fn test_upgrade_respects_settle_debounce() {
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[400, 800, 1200], (4000, 3000));
    v.set_natural_size(Size::new(4000.0, 3000.0));

    // wheel at t=1000: interaction lingers 90ms, upgrade debounce adds 70ms
    v.wheel(-100.0, false, Point::ZERO, 1000.0);
    assert!(v.poll_upgrade(&descriptor, 1100.0).is_none());
    assert!(v.poll_upgrade(&descriptor, 1150.0).is_none());
    assert!(v.poll_upgrade(&descriptor, 1170.0).is_some());
}

#[test]
fn test_upgrade_suppressed_while_dragging() {
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[400, 800, 1200], (4000, 3000));
    v.set_natural_size(Size::new(4000.0, 3000.0));
    v.set_zoom(2.0);

    v.drag_start(Point::ZERO);
    assert!(v.poll_upgrade(&descriptor, 5000.0).is_none());

    v.drag_end(5000.0);
    assert!(v.poll_upgrade(&descriptor, 5300.0).is_some());
}

#[test]
fn test_stale_upgrade_results_are_discarded() {
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[400, 800, 1200, 2400], (6000, 4500));
    v.set_natural_size(Size::new(6000.0, 4500.0));

    let first = v.poll_upgrade(&descriptor, 0.0).expect("first request");

    // a newer request supersedes the first before it resolves
    v.set_zoom(2.0);
    let second = v.poll_upgrade(&descriptor, 200.0).expect("second request");
    assert!(second.id > first.id);

    assert!(!v.complete_upgrade(first.id));
    assert!(v.active_source().is_none());

    assert!(v.complete_upgrade(second.id));
    assert_eq!(v.active_source().map(|s| s.width), Some(second.width));
}

#[test]
fn test_failed_upgrade_leaves_source_and_retries() {
    let mut v = ZoomPanViewport::new(Size::new(600.0, 400.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[400, 800, 1200], (4000, 3000));
    v.set_natural_size(Size::new(4000.0, 3000.0));
    v.set_active_source("renditions/img-400.webp", 400);

    let request = v.poll_upgrade(&descriptor, 0.0).expect("upgrade request");
    v.fail_upgrade(request.id);
    assert_eq!(v.active_source().map(|s| s.width), Some(400));

    // the next settle cycle retries
    let retry = v.poll_upgrade(&descriptor, 100.0).expect("retry");
    assert!(retry.id > request.id);
}

#[test]
fn test_resize_reevaluates_upgrade() {
    let mut v = ZoomPanViewport::new(Size::new(300.0, 200.0), 2.0, false, ViewerTunables::default());
    let descriptor = detail_descriptor(&[400, 800, 1200, 2400], (6000, 4500));
    v.set_natural_size(Size::new(6000.0, 4500.0));

    // 300px container at dpr 2: target ~= 660 -> 800px candidate
    let first = v.poll_upgrade(&descriptor, 0.0).expect("first request");
    assert_eq!(first.width, 800);
    assert!(v.complete_upgrade(first.id));
    assert!(v.poll_upgrade(&descriptor, 100.0).is_none());

    // a wider container raises the target width past the margin
    v.set_container_size(Size::new(1200.0, 800.0));
    let second = v.poll_upgrade(&descriptor, 200.0).expect("after resize");
    assert_eq!(second.width, 2400);
}

#[test]
fn test_minimap_geometry() {
    let v = {
        let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
        v.apply_zoom(2.0, None);
        v
    };

    let view = v.minimap(10_000.0).expect("minimap");
    assert!((view.box_width - 150.0).abs() < 1e-3);
    assert!((view.box_height - 100.0).abs() < 1e-3);
    assert!((view.crop_x - 37.5).abs() < 1e-3);
    assert!((view.crop_y - 25.0).abs() < 1e-3);
    assert!((view.crop_width - 75.0).abs() < 1e-3);
    assert!((view.crop_height - 50.0).abs() < 1e-3);
}

#[test]
fn test_minimap_uses_touch_box_width() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), true);
    v.apply_zoom(2.0, None);

    let view = v.minimap(10_000.0).expect("minimap");
    assert!((view.box_width - 92.0).abs() < 1e-3);
}

#[test]
fn test_minimap_hidden_at_fit_zoom_and_while_interacting() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    assert!(v.minimap(0.0).is_none());

    v.wheel(-400.0, true, Point::ZERO, 1000.0);
    assert!(v.zoom() > 1.0);
    // suppressed during the settle window, visible afterwards
    assert!(v.minimap(1050.0).is_none());
    assert!(v.minimap(1200.0).is_some());
}

#[test]
fn test_minimap_crop_follows_pan() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(1200.0, 800.0), false);
    v.apply_zoom(2.0, None);
    // pan fully to the positive-x bound: the visible crop hugs the left edge
    v.set_pan(Point::new(1e6, 0.0));

    let view = v.minimap(10_000.0).expect("minimap");
    assert!(view.crop_x.abs() < 1e-3);
}

#[test]
fn test_frame_coalescer_contract() {
    let mut frames: FrameCoalescer<u32> = FrameCoalescer::new();

    assert!(frames.submit(1));
    assert!(!frames.submit(2));
    assert!(frames.is_scheduled());

    assert_eq!(frames.take(), Some(2));
    assert_eq!(frames.take(), None);

    // a new burst schedules again
    assert!(frames.submit(3));
}

#[test]
fn test_double_tap_toggles_zoom() {
    let mut v = viewport(Size::new(600.0, 400.0), Size::new(2400.0, 1600.0), false);

    assert!(v.double_tap(Point::new(40.0, 20.0), 1000.0));
    assert!((v.zoom() - 2.0).abs() < 1e-3);

    assert!(v.double_tap(Point::new(40.0, 20.0), 2000.0));
    assert!((v.zoom() - 1.0).abs() < 1e-3);
    assert_eq!(v.pan(), Point::ZERO);
}
