use criterion::{criterion_group, criterion_main, Criterion, black_box};

use meadow::grass::{GrassSettings, LodSettings, NormalHeightData, TierArgs, UvRect};
use meadow::grass::lod::{double_lerp, single_lerp};
use meadow::terrain::{NoiseTerrain, TerrainParams};

fn bench_single_lerp(c: &mut Criterion) {
    c.bench_function("single_lerp_1k", |b| {
        b.iter(|| {
            let mut total = 0u32;
            for i in 0..1000 {
                total += single_lerp(black_box(256), i as f32 * 0.05, 5.0, 20.0);
            }
            total
        });
    });
}

fn bench_double_lerp(c: &mut Criterion) {
    c.bench_function("double_lerp_1k", |b| {
        b.iter(|| {
            let mut total = 0u32;
            for i in 0..1000 {
                total += double_lerp(black_box(64), i as f32 * 0.05, 10.0, 20.0, 30.0);
            }
            total
        });
    });
}

fn bench_field_lod_pass(c: &mut Criterion) {
    // One frame's LOD work for a 32x32 patch field
    let settings = GrassSettings::default();
    let lod = LodSettings::default();
    let mut args = vec![TierArgs::new(&settings); 1024];

    c.bench_function("field_lod_1024_patches", |b| {
        b.iter(|| {
            for (i, a) in args.iter_mut().enumerate() {
                let distance = (i % 32) as f32 * 8.0 + (i / 32) as f32 * 0.5;
                a.recompute(black_box(distance), &lod);
            }
        });
    });
}

fn bench_texture_bake(c: &mut Criterion) {
    let terrain = NoiseTerrain::new(TerrainParams::default());
    let height = TerrainParams::default().height_scale;
    let rect = UvRect::new(0.25, 0.25, 1.0 / 32.0, 1.0 / 32.0);

    c.bench_function("normal_height_bake_64", |b| {
        b.iter(|| NormalHeightData::bake(black_box(rect), 64, &terrain, &terrain, height));
    });

    let data = NormalHeightData::bake(rect, 64, &terrain, &terrain, height);
    c.bench_function("normal_height_mips_64", |b| {
        b.iter(|| black_box(&data).mip_chain());
    });
}

criterion_group!(
    benches,
    bench_single_lerp,
    bench_double_lerp,
    bench_field_lod_pass,
    bench_texture_bake,
);
criterion_main!(benches);
