//! Gradient rasterization benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prism_paint::{generate, Color, GradientKind, GradientSpec};

fn spec(kind: GradientKind) -> GradientSpec {
    GradientSpec::new(
        kind,
        [
            Color::rgb(0x1e, 0x3a, 0x8a),
            Color::rgb(0xf5, 0x9e, 0x0b),
            Color::rgb(0xdc, 0x26, 0x26),
        ],
    )
    .with_repeat(3)
    .with_angle(30.0)
}

fn rasterize_512(c: &mut Criterion) {
    for kind in [
        GradientKind::Linear,
        GradientKind::Angular,
        GradientKind::Diamond,
    ] {
        let spec = spec(kind);
        c.bench_function(&format!("gradient_{kind:?}_512").to_lowercase(), |b| {
            b.iter(|| generate(black_box(&spec), 512))
        });
    }
}

fn encode_png_512(c: &mut Criterion) {
    let image = generate(&spec(GradientKind::Radial), 512).unwrap();
    c.bench_function("encode_png_512", |b| b.iter(|| black_box(&image).encode_png()));
}

criterion_group!(benches, rasterize_512, encode_png_512);
criterion_main!(benches);
