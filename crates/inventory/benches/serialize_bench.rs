//! 인벤토리 직렬화 벤치마크
//!
//! 엔티티 수와 하위 그룹 반복 수에 따른 직렬화/봉투 성능을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use invcollect_inventory::envelope::wrap;
use invcollect_inventory::serializer::serialize;
use invcollect_inventory::{Entity, EntityAccumulator};

fn build_entities(count: usize, packages: usize) -> Vec<Entity> {
    let mut acc = EntityAccumulator::new();
    for i in 0..count {
        acc.start_entity("Device");
        acc.add_property("Name", format!("PC{i}")).unwrap();
        acc.add_property("OperatingSystem.Name", "Windows 11").unwrap();
        acc.add_property("OperatingSystem.Build{channel:ga}", "22631").unwrap();
        for p in 0..packages {
            acc.add_property("SoftwarePackage.Name", format!("pkg-{p}")).unwrap();
            acc.add_property("SoftwarePackage.Version", "1.0.0").unwrap();
        }
    }
    acc.take()
}

fn bench_serialize_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_entities");
    for count in [10, 100, 1000] {
        let entities = build_entities(count, 5);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &entities, |b, entities| {
            b.iter(|| serialize(black_box(entities), "9.0.1", false).unwrap())
        });
    }
    group.finish();
}

fn bench_repeated_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_repeated_groups");
    for packages in [1, 20, 200] {
        let entities = build_entities(10, packages);
        group.bench_with_input(
            BenchmarkId::from_parameter(packages),
            &entities,
            |b, entities| b.iter(|| serialize(black_box(entities), "9.0.1", false).unwrap()),
        );
    }
    group.finish();
}

fn bench_wrap(c: &mut Criterion) {
    let fragment = serialize(&build_entities(100, 5), "9.0.1", false).unwrap();
    c.bench_function("wrap_100_entities", |b| {
        b.iter(|| wrap(black_box(&fragment), "9.0.1", "invcollect").unwrap())
    });
}

criterion_group!(benches, bench_serialize_scaling, bench_repeated_groups, bench_wrap);
criterion_main!(benches);
