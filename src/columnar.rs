//! Write and read a point cloud as a columnar container.
//!
//! Every dimension becomes one dataset with the same name. The metadata blob goes in a scalar
//! text dataset named `metadata`, which is never read back as a dimension.
//!
//! ```
//! use las2hdf::{Column, Config, PointCloud, columnar};
//!
//! let mut point_cloud = PointCloud::new();
//! point_cloud.insert("X", Column::F64(vec![1., 2.])).unwrap();
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("points.hdf5");
//! columnar::write(&path, &point_cloud, "{}", &Config::default()).unwrap();
//!
//! let columnar = columnar::read(&path).unwrap();
//! assert_eq!(point_cloud, columnar.point_cloud);
//! assert_eq!("{}", columnar.metadata);
//! ```

use crate::{
    Config, Error, PointCloud, Result,
    container::{ContainerReader, ContainerWriter, chunk_length},
    io,
};
use log::{debug, warn};
use std::{io::BufWriter, path::Path};

/// The name of the dataset holding the metadata blob.
pub const METADATA: &str = "metadata";

/// A point cloud read from a container, with its metadata blob.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Columnar {
    /// Every dataset except the metadata.
    pub point_cloud: PointCloud,
    /// The metadata blob, empty if the container has none.
    pub metadata: String,
}

/// Writes a point cloud and its metadata to a container at `path`.
///
/// The container is written to a temporary file in the same directory and renamed over `path`
/// once complete. On error nothing is left at `path`, and an existing file there is untouched.
/// Returns the size of the container in bytes.
pub fn write<P: AsRef<Path>>(
    path: P,
    point_cloud: &PointCloud,
    metadata: &str,
    config: &Config,
) -> Result<u64> {
    let path = path.as_ref();
    if point_cloud.contains(METADATA) {
        return Err(Error::InvalidDatasetName(format!(
            "{METADATA} is reserved for the metadata blob"
        )));
    }
    let temporary = io::temporary_file(path, "hdf5")?;
    let mut writer = ContainerWriter::new(BufWriter::new(temporary.as_file().try_clone()?))?;
    let number_of_points = point_cloud.number_of_points();
    let chunk_len = chunk_length(number_of_points, config.chunk_size());
    for (name, column) in point_cloud.iter() {
        if column.len() != number_of_points {
            return Err(Error::DimensionLength {
                dimension: name.to_string(),
                expected: number_of_points,
                found: column.len(),
            });
        }
        writer.create_dataset(name, column, chunk_len, config.filters())?;
    }
    writer.create_scalar_text(METADATA, metadata)?;
    writer.close()?;
    let bytes_written = writer.bytes_written()?;
    drop(writer);
    io::persist(temporary, path)?;
    debug!(
        "wrote {} datasets ({} bytes) to {}",
        point_cloud.number_of_dimensions() + 1,
        bytes_written,
        path.display()
    );
    Ok(bytes_written)
}

/// Reads every dataset of the container at `path` into memory.
///
/// A container without a `metadata` dataset yields an empty metadata blob.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Columnar> {
    let path = path.as_ref();
    let mut reader = ContainerReader::from_path(path)?;
    let names: Vec<String> = reader
        .list_datasets()
        .filter(|&name| name != METADATA)
        .map(String::from)
        .collect();
    let mut point_cloud = PointCloud::new();
    for name in names {
        let column = reader.read_dataset(&name)?;
        point_cloud.insert(name, column)?;
    }
    let metadata = if reader.contains(METADATA) {
        reader.read_scalar_text(METADATA)?
    } else {
        warn!("{} has no {} dataset", path.display(), METADATA);
        String::new()
    };
    Ok(Columnar {
        point_cloud,
        metadata,
    })
}
