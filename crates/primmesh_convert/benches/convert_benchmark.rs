//! Benchmark for linkset conversion overhead.
//!
//! TARGET: per-part orchestration cost (path selection, deferred chaining,
//! aggregation) well below the cost of any real mesher
//!
//! Run with: cargo bench --package primmesh_convert --bench convert_benchmark

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use primmesh_assets::mesh_asset::{encode_lod, MeshAssetWriter};
use primmesh_assets::{Bitmap, MemoryAssetSource};
use primmesh_convert::{Mesher, MesherError, PrimToMesh};
use primmesh_core::{DetailLevel, Face, FacetedMesh, Primitive, SculptData, ShapeParams, Uuid};

/// Mesher that returns a single empty face immediately.
struct NullMesher;

impl Mesher for NullMesher {
    fn generate_faceted_mesh(
        &self,
        _prim: &Primitive,
        _detail: DetailLevel,
    ) -> Result<FacetedMesh, MesherError> {
        Ok(FacetedMesh::new(vec![Face::default()]))
    }

    fn generate_sculpt_mesh(
        &self,
        _prim: &Primitive,
        _sculpt: &Bitmap,
        _detail: DetailLevel,
    ) -> Result<FacetedMesh, MesherError> {
        Ok(FacetedMesh::new(vec![Face::default()]))
    }
}

fn bench_linkset(c: &mut Criterion) {
    let converter = PrimToMesh::new(Arc::new(NullMesher));
    let source = MemoryAssetSource::new();

    let mesh_id = Uuid::from_u128(0xbeef);
    let mut writer = MeshAssetWriter::new();
    writer
        .segment(
            "high_lod",
            &encode_lod(&FacetedMesh::new(vec![Face {
                id: 0,
                vertices: vec![Default::default(); 3],
                indices: vec![0, 1, 2],
            }])),
        )
        .unwrap();
    source.insert_raw(mesh_id.into(), writer.finish().unwrap());

    let mut group = c.benchmark_group("create_all_meshes");
    for parts in [1usize, 16, 256] {
        let shapes: Vec<_> = (0..parts)
            .map(|i| Arc::new(Primitive::new(Uuid::from_u128(i as u128), ShapeParams::default())))
            .collect();
        let meshes: Vec<_> = (0..parts)
            .map(|i| {
                Arc::new(
                    Primitive::new(Uuid::from_u128(i as u128), ShapeParams::default())
                        .with_sculpt(SculptData::mesh(mesh_id)),
                )
            })
            .collect();

        group.throughput(Throughput::Elements(parts as u64));
        group.bench_with_input(BenchmarkId::new("shape_only", parts), &shapes, |b, shapes| {
            b.iter(|| {
                converter
                    .create_all_meshes(black_box(shapes.clone()), &source, DetailLevel::Highest)
                    .wait_timeout(Duration::from_secs(1))
            });
        });
        group.bench_with_input(BenchmarkId::new("mesh_asset", parts), &meshes, |b, meshes| {
            b.iter(|| {
                converter
                    .create_all_meshes(black_box(meshes.clone()), &source, DetailLevel::Highest)
                    .wait_timeout(Duration::from_secs(1))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_linkset);
criterion_main!(benches);
