use crate::column::DataType;
use std::path::PathBuf;

/// Crate-specific error enum.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The `ContainerWriter` is closed and cannot be written to.
    #[error("the container writer is closed")]
    ClosedWriter,

    /// A configuration option is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A column could not be cast into the las field it feeds.
    #[error("dimension {dimension} holds a value that does not fit the las field: {value}")]
    DimensionCast {
        /// The dimension name.
        dimension: String,
        /// The offending value, formatted.
        value: String,
    },

    /// A column has a different length than the rest of the point cloud.
    #[error("dimension {dimension} has {found} values, but the point cloud has {expected}")]
    DimensionLength {
        /// The dimension name.
        dimension: String,
        /// The point count of the point cloud.
        expected: usize,
        /// The length of the offending column.
        found: usize,
    },

    /// The `--to-las` assertion disagrees with the file extensions.
    #[error("--to-las was given, but {input} -> {output} is a las to container conversion")]
    DirectionMismatch {
        /// The input path.
        input: PathBuf,
        /// The output path.
        output: PathBuf,
    },

    /// More than one conversion in a batch writes the same output.
    #[error("{0} is the output of more than one conversion")]
    DuplicateOutput(PathBuf),

    /// A dataset with this name is already in the container.
    #[error("duplicate dataset: {0}")]
    DuplicateDataset(String),

    /// The las encoder refused the assembled points.
    #[error("las encoding failed: {0}")]
    Encode(#[source] las::Error),

    /// A chunk inflated to a different size than the directory recorded.
    #[error("chunk {index} of {dataset} inflated to {found} bytes, expected {expected}")]
    InvalidChunk {
        /// The dataset name.
        dataset: String,
        /// The zero-based chunk index.
        index: usize,
        /// The recorded raw size.
        expected: u64,
        /// The actual inflated size.
        found: u64,
    },

    /// The file is HDF5, which is not the container format this crate writes.
    #[error(
        "file is HDF5, not a las2hdf container; only containers written by las2hdf can be read"
    )]
    Hdf5File,

    /// The file signature is not the container signature.
    #[error("file signature is not a columnar container signature, found {0:?}")]
    InvalidSignature([u8; 8]),

    /// The dataset name is empty or not valid utf8.
    #[error("invalid dataset name: {0}")]
    InvalidDatasetName(String),

    /// Wrapper around `std::io::Error`.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper around `las::Error` raised while reading the source point cloud.
    #[error("could not read point cloud {path}: {source}")]
    Las {
        /// The source path.
        path: PathBuf,
        /// The underlying reader error.
        #[source]
        source: las::Error,
    },

    /// The point cloud has no points.
    #[error("point cloud {0} has no points")]
    EmptyPointCloud(PathBuf),

    /// Wrapper around `serde_json::Error`.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A point index is past the end of the point cloud.
    #[error("point {index} is out of range for {number_of_points} points")]
    PointOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of points.
        number_of_points: usize,
    },

    /// The columns lack one or more required dimensions.
    #[error("missing required dimensions: {}", .0.join(", "))]
    MissingDimensions(Vec<String>),

    /// There is no dataset with this name.
    #[error("no such dataset: {0}")]
    NoSuchDataset(String),

    /// The container was never closed, so it has no directory.
    #[error("the container was not closed by its writer")]
    UnclosedContainer,

    /// A directory entry points past the end of the container.
    #[error("{size} bytes at offset {offset} run past the end of the container ({len} bytes)")]
    Truncated {
        /// Where the bytes start.
        offset: u64,
        /// How many bytes were expected.
        size: u64,
        /// The size of the container.
        len: u64,
    },

    /// The dataset has a different shape than the caller asked for.
    #[error("dataset {name} is not {expected}")]
    ShapeMismatch {
        /// The dataset name.
        name: String,
        /// What the caller asked for.
        expected: &'static str,
    },

    /// The data type code is not one we know.
    #[error("unknown data type code: {0}")]
    UnknownDataType(u8),

    /// The shape code is not one we know.
    #[error("unknown dataset shape code: {0}")]
    UnknownShape(u8),

    /// The data type cannot be stored in this kind of dataset.
    #[error("{0} cannot be stored as an array dataset")]
    UnsupportedDataType(DataType),

    /// The container version is newer than this reader.
    #[error("unsupported container version: {0}.{1}")]
    UnsupportedVersion(u8, u8),

    /// The extension pair is neither las -> container nor container -> las.
    #[error("unsupported conversion: {input} to {output}")]
    UnsupportedConversion {
        /// The input path.
        input: PathBuf,
        /// The output path.
        output: PathBuf,
    },

    /// Wrapper around `std::str::Utf8Error`.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// Wrapper around `std::num::TryFromIntError`.
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),
}

/// The broad category of an [Error].
///
/// Callers use this to tell transient i/o trouble from defects in the input or its schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    /// The source point cloud could not be read.
    Ingestion,
    /// Required dimensions are missing or a column does not fit its field.
    Schema,
    /// A container or las file could not be read or written.
    Io,
    /// The input and output extensions do not describe a known conversion.
    UnsupportedConversion,
    /// A configuration option is invalid.
    Config,
}

impl Error {
    /// Returns the kind of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::{Error, ErrorKind};
    /// let error = Error::MissingDimensions(vec!["X".to_string()]);
    /// assert_eq!(error.kind(), ErrorKind::Schema);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Las { .. } | Error::EmptyPointCloud(_) | Error::Json(_) => ErrorKind::Ingestion,
            Error::MissingDimensions(_)
            | Error::DimensionCast { .. }
            | Error::DimensionLength { .. } => ErrorKind::Schema,
            Error::UnsupportedConversion { .. } | Error::DirectionMismatch { .. } => {
                ErrorKind::UnsupportedConversion
            }
            Error::Config(_) | Error::DuplicateOutput(_) => ErrorKind::Config,
            Error::ClosedWriter
            | Error::DuplicateDataset(_)
            | Error::Encode(_)
            | Error::Hdf5File
            | Error::InvalidChunk { .. }
            | Error::InvalidSignature(_)
            | Error::InvalidDatasetName(_)
            | Error::Io(_)
            | Error::NoSuchDataset(_)
            | Error::PointOutOfRange { .. }
            | Error::Truncated { .. }
            | Error::ShapeMismatch { .. }
            | Error::UnclosedContainer
            | Error::UnknownDataType(_)
            | Error::UnknownShape(_)
            | Error::UnsupportedDataType(_)
            | Error::UnsupportedVersion(_, _)
            | Error::Utf8(_)
            | Error::TryFromInt(_) => ErrorKind::Io,
        }
    }

    /// Returns true if retrying the same conversion could succeed.
    ///
    /// Only failures of the underlying file system are retryable. Truncated or malformed bytes
    /// stay malformed on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(err) => !matches!(
                err.kind(),
                std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::InvalidData
            ),
            _ => false,
        }
    }
}

impl ErrorKind {
    /// The process exit code for a conversion that failed with this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::ErrorKind;
    /// assert_eq!(ErrorKind::Schema.exit_code(), 3);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Ingestion => 2,
            ErrorKind::Schema => 3,
            ErrorKind::Io => 4,
            ErrorKind::UnsupportedConversion => 5,
            ErrorKind::Config => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let kinds = [
            ErrorKind::Ingestion,
            ErrorKind::Schema,
            ErrorKind::Io,
            ErrorKind::UnsupportedConversion,
            ErrorKind::Config,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(ErrorKind::exit_code).collect();
        assert!(codes.iter().all(|&code| code != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn io_is_retryable() {
        let error = Error::from(std::io::Error::other("disk full"));
        assert_eq!(ErrorKind::Io, error.kind());
        assert!(error.is_retryable());
        assert!(!Error::MissingDimensions(vec!["Z".to_string()]).is_retryable());
    }

    #[test]
    fn corrupt_bytes_are_not_retryable() {
        let error = Error::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert_eq!(ErrorKind::Io, error.kind());
        assert!(!error.is_retryable());
        assert!(
            !Error::Truncated {
                offset: 24,
                size: 1 << 46,
                len: 100
            }
            .is_retryable()
        );
    }

    #[test]
    fn direction_mismatch_is_unsupported_conversion() {
        let error = Error::DirectionMismatch {
            input: "a.las".into(),
            output: "b.hdf5".into(),
        };
        assert_eq!(ErrorKind::UnsupportedConversion, error.kind());
    }
}
