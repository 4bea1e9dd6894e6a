use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vista::*;

fn descriptor_with_renditions() -> ImageDescriptor {
    ImageDescriptor {
        id: "bench".to_string(),
        original_path: "photos/bench.jpg".to_string(),
        thumbnail_path: String::new(),
        renditions: vec![400, 800, 1200, 1600, 2400]
            .into_iter()
            .map(|width| Rendition {
                width,
                url: format!("renditions/bench-{width}.webp"),
                role: RenditionRole::Detail,
                encoding: "webp".to_string(),
            })
            .collect(),
        original_width: Some(4000),
        original_height: Some(3000),
    }
}

fn bench_geometry(c: &mut Criterion) {
    let container = Size::new(1280.0, 720.0);
    let natural = Size::new(4000.0, 3000.0);

    c.bench_function("geometry", |b| {
        b.iter(|| black_box(geometry(black_box(container), black_box(natural), black_box(2.5))))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let descriptor = descriptor_with_renditions();

    c.bench_function("resolve_rendition", |b| {
        b.iter(|| {
            black_box(resolver::resolve_rendition(
                black_box(&descriptor),
                RenditionRole::Detail,
                black_box(1320),
                true,
            ))
        })
    });
}

fn bench_minimap(c: &mut Criterion) {
    let container = Size::new(1280.0, 720.0);
    let natural = Size::new(4000.0, 3000.0);
    let g = geometry(container, natural, 3.0).unwrap();

    c.bench_function("minimap", |b| {
        b.iter(|| {
            black_box(minimap(
                black_box(&g),
                container,
                Point::new(120.0, -60.0),
                3.0,
                false,
            ))
        })
    });
}

fn bench_apply_zoom(c: &mut Criterion) {
    let tunables = ViewerTunables::default();

    c.bench_function("apply_zoom", |b| {
        b.iter(|| {
            let mut viewport =
                ZoomPanViewport::new(Size::new(1280.0, 720.0), 2.0, false, tunables.clone());
            viewport.set_natural_size(Size::new(4000.0, 3000.0));
            viewport.apply_zoom(black_box(3.2), Some(Point::new(200.0, 100.0)));
            black_box(viewport.pan())
        })
    });
}

criterion_group!(
    benches,
    bench_geometry,
    bench_resolve,
    bench_minimap,
    bench_apply_zoom
);
criterion_main!(benches);
