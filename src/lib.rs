//! Convert [ASPRS LAS](https://www.asprs.org/committee-general/laser-las-file-format-exchange-activities.html)
//! point clouds to and from a chunked, compressed, columnar container.
//!
//! # Las to container
//!
//! Every las dimension becomes one dataset, and the las header becomes a json metadata blob:
//!
//! ```no_run
//! use las2hdf::{Config, convert};
//! let report = convert::convert("points.las", "points.hdf5", &Config::default()).unwrap();
//! println!("{} points", report.counters["points"]);
//! ```
//!
//! # Container to las
//!
//! The datasets are assembled back into las points. `X`, `Y`, and `Z` are required, everything
//! else is copied when present:
//!
//! ```
//! use las2hdf::{Column, Config, PointCloud, columnar, convert};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let input = dir.path().join("points.hdf5");
//! let mut point_cloud = PointCloud::new();
//! for name in ["X", "Y", "Z"] {
//!     point_cloud.insert(name, Column::F64(vec![1., 2., 3.])).unwrap();
//! }
//! columnar::write(&input, &point_cloud, "{}", &Config::default()).unwrap();
//!
//! let output = dir.path().join("points.las");
//! let report = convert::convert(&input, &output, &Config::default()).unwrap();
//! assert_eq!(3, report.counters["points_written"]);
//! ```
//!
//! # Many files
//!
//! Use a [Batch](batch::Batch) to convert many pairs on a pool of workers:
//!
//! ```
//! use las2hdf::{Config, batch::Batch};
//! let batch = Batch::new(Config::default(), 4);
//! let outcomes = batch.run(Vec::new());
//! assert!(outcomes.is_empty());
//! ```

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces
)]

pub mod assemble;
pub mod batch;
pub mod columnar;
pub mod config;
pub mod container;
pub mod convert;
pub mod dimension;
pub mod encode;
pub mod ingest;
pub mod phase;

mod column;
mod error;
mod io;

pub use column::{Column, DataType, PointCloud};
pub use config::Config;
pub use convert::{Direction, Report, convert};
pub use error::{Error, ErrorKind};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
