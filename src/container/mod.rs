//! A single-file container of named, chunked, compressed columnar datasets.
//!
//! The layout follows the HDF5 model that matters for point clouds: every dataset has a name, an
//! element type, a chunk length, and a filter pipeline (byte shuffle, then deflate). Chunks are
//! written as they are produced and the directory goes at the end of the file, so the header is
//! re-written when the writer closes.
//!
//! It is not an HDF5 file, and HDF5 tools cannot read it. Reading an HDF5 file fails with
//! [Error::Hdf5File](crate::Error::Hdf5File).
//!
//! ```
//! use std::io::Cursor;
//! use las2hdf::Column;
//! use las2hdf::container::{ContainerReader, ContainerWriter, Filters};
//!
//! let mut writer = ContainerWriter::new(Cursor::new(Vec::new())).unwrap();
//! let column = Column::U16(vec![1, 2, 3]);
//! writer.create_dataset("Intensity", &column, 2, Filters::default()).unwrap();
//! writer.create_scalar_text("metadata", "{}").unwrap();
//! let cursor = writer.into_inner().unwrap();
//!
//! let mut reader = ContainerReader::new(cursor).unwrap();
//! assert_eq!(vec!["Intensity", "metadata"], reader.list_datasets().collect::<Vec<_>>());
//! assert_eq!(column, reader.read_dataset("Intensity").unwrap());
//! assert_eq!("{}", reader.read_scalar_text("metadata").unwrap());
//! ```

pub mod filter;
pub mod raw;
mod reader;
mod writer;

pub use filter::Filters;
pub use reader::ContainerReader;
pub use writer::ContainerWriter;

/// The container file signature.
pub const SIGNATURE: [u8; 8] = *b"\x89LCF\r\n\x1a\n";

/// The signature of HDF5 files, which this container is not.
pub const HDF5_SIGNATURE: [u8; 8] = *b"\x89HDF\r\n\x1a\n";

/// The major version written by this crate.
pub const VERSION_MAJOR: u8 = 1;

/// The minor version written by this crate.
pub const VERSION_MINOR: u8 = 0;

/// Returns the chunk length for a dataset of `len` values.
///
/// This is `len` capped at `chunk_size`, and never less than one so that empty datasets still
/// have a valid layout.
///
/// # Examples
///
/// ```
/// use las2hdf::container::chunk_length;
/// assert_eq!(1_000_000, chunk_length(2_500_000, 1_000_000));
/// assert_eq!(500_000, chunk_length(500_000, 1_000_000));
/// assert_eq!(1, chunk_length(0, 1_000_000));
/// ```
pub fn chunk_length(len: usize, chunk_size: usize) -> usize {
    len.min(chunk_size).max(1)
}
