use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use las2hdf::{Column, Config, PointCloud, columnar, convert};
use std::hint::black_box;
use tempfile::TempDir;

fn point_cloud(npoints: usize) -> PointCloud {
    let mut point_cloud = PointCloud::new();
    for name in ["X", "Y", "Z"] {
        point_cloud
            .insert(name, Column::F64((0..npoints).map(|i| i as f64 * 0.01).collect()))
            .unwrap();
    }
    point_cloud
        .insert(
            "Intensity",
            Column::U16((0..npoints).map(|i| (i % 65536) as u16).collect()),
        )
        .unwrap();
    point_cloud
}

fn roundtrip(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let mut group = c.benchmark_group("roundtrip");
    for npoints in [1, 100, 10_000] {
        let input = dir.path().join(format!("{npoints}.hdf5"));
        let output = dir.path().join(format!("{npoints}.las"));
        let back = dir.path().join(format!("{npoints}-back.hdf5"));
        let point_cloud = point_cloud(npoints);
        group.bench_with_input(BenchmarkId::new("columnar", npoints), &npoints, |b, _| {
            b.iter(|| {
                columnar::write(&input, black_box(&point_cloud), "{}", &config).unwrap();
                columnar::read(&input).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("las", npoints), &npoints, |b, _| {
            b.iter(|| {
                let _ = convert(&input, &output, &config).unwrap();
                convert(&output, &back, &config).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, roundtrip);
criterion_main!(benches);
