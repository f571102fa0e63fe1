//! Benchmark for mesh key computation.
//!
//! TARGET: a fully textured primitive keyed in well under a microsecond
//!
//! Run with: cargo bench --package primmesh_core --bench hash_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use primmesh_core::{
    mesh_key, mesh_key_for, DetailLevel, Primitive, SculptData, TextureEntry, TextureFace, Uuid,
    Vector3, MAX_FACES,
};

fn textured_prim() -> Primitive {
    let mut entry = TextureEntry::uniform(TextureFace::default());
    for index in 0..MAX_FACES {
        entry.set_face(
            index,
            TextureFace {
                glow: index as f32 * 0.1,
                texture_id: Uuid::from_u128(index as u128 + 1),
                ..TextureFace::default()
            },
        );
    }
    Primitive::default()
        .with_sculpt(SculptData::mesh(Uuid::from_u128(0xfeed)))
        .with_textures(entry)
}

fn bench_mesh_key(c: &mut Criterion) {
    let bare = Primitive::default();
    let textured = textured_prim();

    let mut group = c.benchmark_group("mesh_key");
    group.throughput(Throughput::Elements(1));

    group.bench_function("bare_box", |b| {
        b.iter(|| mesh_key_for(black_box(&bare), DetailLevel::Highest));
    });

    group.bench_function("textured_mesh", |b| {
        b.iter(|| mesh_key(black_box(&textured), Vector3::ONE, black_box(3.0)));
    });

    group.finish();
}

criterion_group!(benches, bench_mesh_key);
criterion_main!(benches);
