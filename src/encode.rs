//! Write assembled columns as a las file.
//!
//! Las records have a fixed layout, so fields that the point format demands but the assembled
//! columns lack (gps time, color, nir) are written as zeros. The file is written next to its
//! destination and moved into place only when it is complete.

use crate::{Config, Error, Result, assemble::Assembled, io};
use las::{Builder, Color, Point, Transform, Vector, Writer};
use log::{debug, warn};
use std::{
    fs::File,
    io::BufWriter,
    panic::{self, AssertUnwindSafe},
    path::Path,
};

/// Writes assembled points to a las file at `path`, returning the number of points written.
///
/// # Examples
///
/// ```
/// use las2hdf::{Column, Config, PointCloud, assemble, encode};
///
/// let mut point_cloud = PointCloud::new();
/// for name in ["X", "Y", "Z"] {
///     point_cloud.insert(name, Column::F64(vec![1., 2.])).unwrap();
/// }
/// let config = Config::default();
/// let assembled = assemble::assemble(&point_cloud, &config).unwrap();
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("points.las");
/// assert_eq!(2, encode::write(&path, &assembled, &config).unwrap());
/// ```
pub fn write<P: AsRef<Path>>(path: P, assembled: &Assembled, config: &Config) -> Result<u64> {
    let path = path.as_ref();
    let mut builder = Builder::from(assembled.version());
    builder.point_format = assembled.point_format();
    builder.generating_software = format!("las2hdf {}", env!("CARGO_PKG_VERSION"));
    let transform = Transform {
        scale: config.coordinate_scale(),
        offset: 0.,
    };
    builder.transforms = Vector {
        x: transform,
        y: transform,
        z: transform,
    };
    let header = builder.into_header().map_err(Error::Encode)?;

    let temporary = io::temporary_file(path, "las")?;
    let file: File = temporary.as_file().try_clone()?;
    let mut writer = Writer::new(BufWriter::new(file), header).map_err(Error::Encode)?;
    let count = match write_points(&mut writer, assembled) {
        Ok(count) => count,
        Err(err) => {
            abandon(writer);
            return Err(err);
        }
    };
    drop(writer);
    io::persist(temporary, path)?;
    debug!("wrote {} points to {}", count, path.display());
    Ok(count)
}

fn write_points(writer: &mut Writer<BufWriter<File>>, assembled: &Assembled) -> Result<u64> {
    let mut count = 0;
    for index in 0..assembled.number_of_points() {
        let point = point(assembled, index)?;
        writer.write_point(point).map_err(Error::Encode)?;
        count += 1;
    }
    writer.close().map_err(Error::Encode)?;
    Ok(count)
}

/// Drops a writer whose file will be discarded.
///
/// A las writer closes itself on drop and panics if that fails, which it does when the points
/// written so far cannot be summarized in the header.
fn abandon(writer: Writer<BufWriter<File>>) {
    if panic::catch_unwind(AssertUnwindSafe(move || drop(writer))).is_err() {
        warn!("the las writer could not close an abandoned file");
    }
}

/// Builds the las point at `index`.
///
/// # Examples
///
/// ```
/// use las2hdf::{Column, Config, PointCloud, assemble, encode};
///
/// let mut point_cloud = PointCloud::new();
/// for name in ["X", "Y", "Z"] {
///     point_cloud.insert(name, Column::F64(vec![1., 2.])).unwrap();
/// }
/// let assembled = assemble::assemble(&point_cloud, &Config::default()).unwrap();
/// assert_eq!(2., encode::point(&assembled, 1).unwrap().x);
/// assert!(encode::point(&assembled, 2).is_err());
/// ```
pub fn point(assembled: &Assembled, index: usize) -> Result<Point> {
    if index >= assembled.number_of_points() {
        return Err(Error::PointOutOfRange {
            index,
            number_of_points: assembled.number_of_points(),
        });
    }
    let format = assembled.point_format();
    let mut point = Point::default();
    for (field, column) in assembled.fields() {
        field.set(&mut point, column, index)?;
    }
    if format.has_gps_time {
        point.gps_time = point.gps_time.or(Some(0.));
    } else {
        point.gps_time = None;
    }
    if format.has_color {
        point.color = point.color.or(Some(Color::new(0, 0, 0)));
    } else {
        point.color = None;
    }
    if format.has_nir {
        point.nir = point.nir.or(Some(0));
    }
    Ok(point)
}
