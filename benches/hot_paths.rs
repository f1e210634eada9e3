use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tui_globe::globe::clipper::{DetailRamp, VectorClipper, VectorShape};
use tui_globe::globe::orientation::Orientation;
use tui_globe::globe::projection::ProjectionKind;
use tui_globe::globe::texture::TextureMapper;
use tui_globe::globe::tiles::ProceduralPyramid;
use tui_globe::globe::viewport::Viewport;

fn viewport(projection: ProjectionKind) -> Viewport {
    Viewport::new(320, 160, 70.0, Orientation::looking_at(0.4, 0.6), projection).unwrap()
}

fn ring(radius_deg: f64, count: usize) -> VectorShape {
    let points: Vec<(f64, f64)> = (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * std::f64::consts::TAU;
            (radius_deg * angle.cos(), radius_deg * angle.sin())
        })
        .collect();
    VectorShape::from_degrees(&points, 5, true)
}

fn bench_texture_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("texture");
    let mut target = vec![0u32; 320 * 160];

    for projection in [
        ProjectionKind::Spherical,
        ProjectionKind::Mercator,
        ProjectionKind::Equirectangular,
    ] {
        let vp = viewport(projection);
        let mut mapper = TextureMapper::new(ProceduralPyramid::new(4));
        group.bench_function(format!("nearest_{}", projection.name()), |b| {
            b.iter(|| mapper.map_texture(black_box(&mut target), black_box(&vp)))
        });
    }

    let vp = viewport(ProjectionKind::Spherical);
    let mut mapper = TextureMapper::new(ProceduralPyramid::new(4));
    mapper.set_smoothing(true);
    group.bench_function("bilinear_spherical", |b| {
        b.iter(|| mapper.map_texture(black_box(&mut target), black_box(&vp)))
    });

    group.finish();
}

fn bench_vector_clipping(c: &mut Criterion) {
    let mut group = c.benchmark_group("clipper");
    let ramp = DetailRamp::default();
    let vp = viewport(ProjectionKind::Spherical);

    // Rings sized to straddle the horizon so the arc path is exercised.
    let shapes: Vec<VectorShape> = (0..50)
        .map(|i| ring(60.0 + (i % 5) as f64 * 5.0, 400))
        .collect();
    group.bench_function("spherical_50_rings", |b| {
        b.iter(|| VectorClipper::clip(black_box(&shapes), black_box(&vp), black_box(&ramp)))
    });

    let flat = viewport(ProjectionKind::Mercator);
    group.bench_function("mercator_50_rings", |b| {
        b.iter(|| VectorClipper::clip(black_box(&shapes), black_box(&flat), black_box(&ramp)))
    });

    group.finish();
}

criterion_group!(benches, bench_texture_mapping, bench_vector_clipping);
criterion_main!(benches);
