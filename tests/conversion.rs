//! End-to-end conversions between las files and containers.

use las::{Builder, Color, Point, Reader, Writer, point::Classification, point::Format};
use las2hdf::{
    Column, Config, ErrorKind, PointCloud, batch::Batch, columnar, config, container,
    convert::convert,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn points(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| Point {
            x: i as f64,
            y: 10. + i as f64,
            z: 100. + i as f64 / 4.,
            intensity: (i * 100) as u16,
            return_number: 1,
            number_of_returns: 1,
            classification: Classification::Ground,
            gps_time: Some(1000. + i as f64),
            color: Some(Color::new(i as u16, 2 * i as u16, 3 * i as u16)),
            ..Default::default()
        })
        .collect()
}

fn write_las(path: &Path, points: &[Point]) {
    let mut builder = Builder::from((1, 2));
    builder.point_format = Format::new(3).unwrap();
    let mut writer = Writer::from_path(path, builder.into_header().unwrap()).unwrap();
    for point in points {
        writer.write_point(point.clone()).unwrap();
    }
    writer.close().unwrap();
}

fn read_las(path: &Path) -> Vec<Point> {
    Reader::from_path(path)
        .unwrap()
        .points()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn file_names(dir: &TempDir) -> Vec<PathBuf> {
    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| PathBuf::from(entry.unwrap().file_name()))
        .collect();
    names.sort();
    names
}

#[test]
fn las_to_container_and_back() {
    let dir = TempDir::new().unwrap();
    let las = dir.path().join("in.las");
    let hdf5 = dir.path().join("points.hdf5");
    let out = dir.path().join("out.las");
    let original = points(10);
    write_las(&las, &original);

    let report = convert(&las, &hdf5, &Config::default()).unwrap();
    assert_eq!(Some(&10), report.counters.get("points"));
    let columnar = columnar::read(&hdf5).unwrap();
    assert_eq!(10, columnar.point_cloud.number_of_points());
    for name in ["X", "Y", "Z", "Intensity", "Classification", "GpsTime", "Red"] {
        assert!(columnar.point_cloud.contains(name), "{name}");
    }
    let metadata: serde_json::Value = serde_json::from_str(&columnar.metadata).unwrap();
    assert_eq!(10, metadata["readers.las"]["count"]);
    assert_eq!(3, metadata["readers.las"]["dataformat_id"]);

    let _ = convert(&hdf5, &out, &Config::default()).unwrap();
    let restored = read_las(&out);
    assert_eq!(original.len(), restored.len());
    for (expected, actual) in original.iter().zip(&restored) {
        assert!((expected.x - actual.x).abs() < 0.01);
        assert!((expected.y - actual.y).abs() < 0.01);
        assert!((expected.z - actual.z).abs() < 0.01);
        assert_eq!(expected.intensity, actual.intensity);
        assert_eq!(expected.classification, actual.classification);
        assert_eq!(expected.gps_time, actual.gps_time);
        assert_eq!(expected.color, actual.color);
    }
    assert_eq!(
        vec![
            PathBuf::from("in.las"),
            PathBuf::from("out.las"),
            PathBuf::from("points.hdf5")
        ],
        file_names(&dir)
    );
}

#[test]
fn sparse_container_to_las() {
    let dir = TempDir::new().unwrap();
    let hdf5 = dir.path().join("sparse.hdf5");
    let las = dir.path().join("sparse.las");
    let mut point_cloud = PointCloud::new();
    point_cloud.insert("X", Column::F64(vec![1., 2., 3.])).unwrap();
    point_cloud.insert("Y", Column::F64(vec![4., 5., 6.])).unwrap();
    point_cloud.insert("Z", Column::F64(vec![7., 8., 9.])).unwrap();
    point_cloud
        .insert("Intensity", Column::U16(vec![10, 20, 30]))
        .unwrap();
    point_cloud
        .insert("Classification", Column::U8(vec![2, 6, 12]))
        .unwrap();
    columnar::write(&hdf5, &point_cloud, "{}", &Config::default()).unwrap();

    let _ = convert(&hdf5, &las, &Config::default()).unwrap();
    let mut reader = Reader::from_path(&las).unwrap();
    assert_eq!(3, reader.header().point_format().to_u8().unwrap());
    assert_eq!((1, 2), (reader.header().version().major, reader.header().version().minor));
    let points = reader.points().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(vec![10, 20, 30], points.iter().map(|p| p.intensity).collect::<Vec<_>>());
    assert_eq!(Classification::Ground, points[0].classification);
    assert_eq!(Classification::Building, points[1].classification);
    assert_eq!(Classification::Unclassified, points[2].classification);
    assert!(points[2].is_overlap);
    assert_eq!(5., points[1].y);
}

#[test]
fn missing_z_is_a_schema_error() {
    let dir = TempDir::new().unwrap();
    let hdf5 = dir.path().join("flat.hdf5");
    let las = dir.path().join("flat.las");
    let mut point_cloud = PointCloud::new();
    point_cloud.insert("X", Column::F64(vec![1.])).unwrap();
    point_cloud.insert("Y", Column::F64(vec![2.])).unwrap();
    columnar::write(&hdf5, &point_cloud, "{}", &Config::default()).unwrap();

    let error = convert(&hdf5, &las, &Config::default()).unwrap_err();
    assert_eq!(ErrorKind::Schema, error.kind());
    assert!(!error.is_retryable());
    assert!(!las.exists());
    assert_eq!(vec![PathBuf::from("flat.hdf5")], file_names(&dir));
}

#[test]
fn partial_color_is_omitted() {
    let dir = TempDir::new().unwrap();
    let hdf5 = dir.path().join("red.hdf5");
    let las = dir.path().join("red.las");
    let mut point_cloud = PointCloud::new();
    for name in ["X", "Y", "Z"] {
        point_cloud.insert(name, Column::F64(vec![1., 2.])).unwrap();
    }
    point_cloud.insert("Red", Column::U16(vec![100, 200])).unwrap();
    point_cloud.insert("Green", Column::U16(vec![100, 200])).unwrap();
    columnar::write(&hdf5, &point_cloud, "{}", &Config::default()).unwrap();

    let _ = convert(&hdf5, &las, &Config::default()).unwrap();
    for point in read_las(&las) {
        assert_eq!(Some(Color::new(0, 0, 0)), point.color);
    }
}

#[test]
fn chunk_length_follows_point_count() {
    let dir = TempDir::new().unwrap();
    let las = dir.path().join("in.las");
    let hdf5 = dir.path().join("out.hdf5");
    write_las(&las, &points(25));
    let mut builder = config::Builder::default();
    builder.chunk_size = 10;
    let config = builder.into_config().unwrap();

    let _ = convert(&las, &hdf5, &config).unwrap();
    let reader = container::ContainerReader::from_path(&hdf5).unwrap();
    let descriptor = reader.descriptor("X").unwrap();
    assert_eq!(25, descriptor.len);
    assert_eq!(10, descriptor.chunk_len);
    assert_eq!(3, descriptor.chunks.len());

    let small = dir.path().join("small.hdf5");
    let _ = convert(&las, &small, &Config::default()).unwrap();
    let reader = container::ContainerReader::from_path(&small).unwrap();
    assert_eq!(25, reader.descriptor("Intensity").unwrap().chunk_len);
}

#[test]
fn unsupported_extensions() {
    let dir = TempDir::new().unwrap();
    let error = convert(
        dir.path().join("points.txt"),
        dir.path().join("points.hdf5"),
        &Config::default(),
    )
    .unwrap_err();
    assert_eq!(ErrorKind::UnsupportedConversion, error.kind());
    assert!(file_names(&dir).is_empty());
}

#[test]
fn corrupt_las_is_an_ingestion_error() {
    let dir = TempDir::new().unwrap();
    let las = dir.path().join("corrupt.las");
    let hdf5 = dir.path().join("corrupt.hdf5");
    std::fs::write(&las, b"LASF but not really").unwrap();
    let error = convert(&las, &hdf5, &Config::default()).unwrap_err();
    assert_eq!(ErrorKind::Ingestion, error.kind());
    assert!(!hdf5.exists());
}

#[test]
fn batch_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.las");
    write_las(&good, &points(5));
    let pairs = vec![
        (good.clone(), dir.path().join("good.hdf5")),
        (dir.path().join("missing.las"), dir.path().join("missing.hdf5")),
        (good, dir.path().join("bad.txt")),
    ];
    let outcomes = Batch::new(Config::default(), 3).run(pairs);
    assert!(outcomes[0].is_ok());
    assert_eq!(ErrorKind::Ingestion, outcomes[1].as_ref().unwrap_err().kind());
    assert_eq!(
        ErrorKind::UnsupportedConversion,
        outcomes[2].as_ref().unwrap_err().kind()
    );
    assert!(dir.path().join("good.hdf5").exists());
    assert!(!dir.path().join("missing.hdf5").exists());
}

#[test]
fn return_number_past_the_header_limit() {
    let dir = TempDir::new().unwrap();
    let hdf5 = dir.path().join("returns.hdf5");
    let las = dir.path().join("returns.las");
    let mut point_cloud = PointCloud::new();
    for name in ["X", "Y", "Z"] {
        point_cloud.insert(name, Column::F64(vec![1., 2.])).unwrap();
    }
    point_cloud
        .insert("ReturnNumber", Column::U8(vec![1, 9]))
        .unwrap();
    columnar::write(&hdf5, &point_cloud, "{}", &Config::default()).unwrap();

    let error = convert(&hdf5, &las, &Config::default()).unwrap_err();
    assert_eq!(ErrorKind::Schema, error.kind());
    assert_eq!(vec![PathBuf::from("returns.hdf5")], file_names(&dir));
}

#[test]
fn classification_past_the_legacy_limit() {
    let dir = TempDir::new().unwrap();
    let hdf5 = dir.path().join("classes.hdf5");
    let las = dir.path().join("classes.las");
    let mut point_cloud = PointCloud::new();
    for name in ["X", "Y", "Z"] {
        point_cloud.insert(name, Column::F64(vec![1.])).unwrap();
    }
    point_cloud
        .insert("Classification", Column::U8(vec![40]))
        .unwrap();
    columnar::write(&hdf5, &point_cloud, "{}", &Config::default()).unwrap();

    let error = convert(&hdf5, &las, &Config::default()).unwrap_err();
    assert_eq!(ErrorKind::Schema, error.kind());
    assert!(!las.exists());
}

#[test]
fn hdf5_input_is_rejected_clearly() {
    let dir = TempDir::new().unwrap();
    let hdf5 = dir.path().join("real.hdf5");
    let las = dir.path().join("real.las");
    let mut bytes = container::HDF5_SIGNATURE.to_vec();
    bytes.resize(512, 0);
    std::fs::write(&hdf5, bytes).unwrap();

    let error = convert(&hdf5, &las, &Config::default()).unwrap_err();
    assert!(matches!(error, las2hdf::Error::Hdf5File));
    assert!(error.to_string().contains("HDF5"));
    assert!(!error.is_retryable());
    assert!(!las.exists());
}

#[test]
fn batch_rejects_shared_outputs() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.las");
    let second = dir.path().join("second.las");
    write_las(&first, &points(3));
    write_las(&second, &points(4));
    let out = dir.path().join("points.hdf5");
    let outcomes =
        Batch::new(Config::default(), 2).run(vec![(first, out.clone()), (second, out.clone())]);
    for outcome in &outcomes {
        assert_eq!(ErrorKind::Config, outcome.as_ref().unwrap_err().kind());
    }
    assert!(!out.exists());
}

