//! Raw structures that map directly onto the container layout.
//!
//! These are "dumb": they read and write bytes and do as little validation as possible. The
//! container reader and writer are responsible for making sense of them.

use super::{HDF5_SIGNATURE, SIGNATURE, VERSION_MAJOR, VERSION_MINOR};
use crate::{DataType, Error, Result, io::capacity_hint};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// The size of the header, in bytes.
pub const HEADER_SIZE: u64 = 24;

/// The container header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
    /// Always the container signature.
    pub signature: [u8; 8],
    /// The major and minor format version.
    pub version: (u8, u8),
    /// The number of datasets in the directory.
    pub number_of_datasets: u32,
    /// Where the directory starts, from the beginning of the file.
    ///
    /// Zero until the writer closes.
    pub offset_to_directory: u64,
}

/// How the values of a dataset are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// One value per point, split into chunks.
    Array,
    /// A single text value, stored in one chunk.
    ScalarText,
}

/// One chunk of a dataset, as it sits in the file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Chunk {
    /// Where the stored bytes start.
    pub offset: u64,
    /// The number of bytes after filtering.
    pub stored_size: u64,
    /// The number of bytes before filtering.
    pub raw_size: u64,
}

/// A directory entry describing one dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    /// The exact dataset name.
    pub name: String,
    /// The element type.
    pub data_type: DataType,
    /// Array or scalar.
    pub shape: Shape,
    /// The number of elements.
    pub len: u64,
    /// The number of elements per chunk.
    pub chunk_len: u64,
    /// The deflate level, zero if stored.
    pub compression_level: u8,
    /// Whether the chunks were byte shuffled before deflating.
    pub shuffle: bool,
    /// The chunks, in order.
    pub chunks: Vec<Chunk>,
}

impl Header {
    /// Reads a raw header from a `Read`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las2hdf::container::raw::Header;
    ///
    /// let mut cursor = Cursor::new(Vec::new());
    /// Header::default().write_to(&mut cursor).unwrap();
    /// cursor.set_position(0);
    /// let header = Header::read_from(&mut cursor).unwrap();
    /// assert_eq!(Header::default(), header);
    /// ```
    pub fn read_from<R: Read>(mut read: R) -> Result<Header> {
        let mut signature = [0; 8];
        read.read_exact(&mut signature)?;
        if signature == HDF5_SIGNATURE {
            return Err(Error::Hdf5File);
        }
        if signature != SIGNATURE {
            return Err(Error::InvalidSignature(signature));
        }
        let version_major = read.read_u8()?;
        let version_minor = read.read_u8()?;
        if version_major != VERSION_MAJOR {
            return Err(Error::UnsupportedVersion(version_major, version_minor));
        }
        let _reserved = read.read_u16::<LittleEndian>()?;
        let number_of_datasets = read.read_u32::<LittleEndian>()?;
        let offset_to_directory = read.read_u64::<LittleEndian>()?;
        Ok(Header {
            signature,
            version: (version_major, version_minor),
            number_of_datasets,
            offset_to_directory,
        })
    }

    /// Writes a raw header to a `Write`.
    pub fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        write.write_all(&self.signature)?;
        write.write_u8(self.version.0)?;
        write.write_u8(self.version.1)?;
        write.write_u16::<LittleEndian>(0)?;
        write.write_u32::<LittleEndian>(self.number_of_datasets)?;
        write.write_u64::<LittleEndian>(self.offset_to_directory)?;
        Ok(())
    }
}

impl Default for Header {
    fn default() -> Header {
        Header {
            signature: SIGNATURE,
            version: (VERSION_MAJOR, VERSION_MINOR),
            number_of_datasets: 0,
            offset_to_directory: 0,
        }
    }
}

impl Shape {
    fn from_code(code: u8) -> Result<Shape> {
        match code {
            0 => Ok(Shape::Array),
            1 => Ok(Shape::ScalarText),
            _ => Err(Error::UnknownShape(code)),
        }
    }

    fn code(self) -> u8 {
        match self {
            Shape::Array => 0,
            Shape::ScalarText => 1,
        }
    }
}

impl Descriptor {
    /// Reads a directory entry from a `Read`.
    pub fn read_from<R: Read>(mut read: R) -> Result<Descriptor> {
        let name_len = read.read_u16::<LittleEndian>()?;
        let mut name = vec![0; usize::from(name_len)];
        read.read_exact(&mut name)?;
        let name = std::str::from_utf8(&name)?.to_string();
        let data_type = DataType::from_code(read.read_u8()?)?;
        let shape = Shape::from_code(read.read_u8()?)?;
        let len = read.read_u64::<LittleEndian>()?;
        let chunk_len = read.read_u64::<LittleEndian>()?;
        let compression_level = read.read_u8()?;
        let shuffle = read.read_u8()? != 0;
        let number_of_chunks = read.read_u32::<LittleEndian>()?;
        let mut chunks = Vec::with_capacity(capacity_hint(number_of_chunks.into()));
        for _ in 0..number_of_chunks {
            chunks.push(Chunk {
                offset: read.read_u64::<LittleEndian>()?,
                stored_size: read.read_u64::<LittleEndian>()?,
                raw_size: read.read_u64::<LittleEndian>()?,
            });
        }
        Ok(Descriptor {
            name,
            data_type,
            shape,
            len,
            chunk_len,
            compression_level,
            shuffle,
            chunks,
        })
    }

    /// Writes a directory entry to a `Write`.
    pub fn write_to<W: Write>(&self, mut write: W) -> Result<()> {
        let name_len = u16::try_from(self.name.len())
            .map_err(|_| Error::InvalidDatasetName(self.name.clone()))?;
        write.write_u16::<LittleEndian>(name_len)?;
        write.write_all(self.name.as_bytes())?;
        write.write_u8(self.data_type.code())?;
        write.write_u8(self.shape.code())?;
        write.write_u64::<LittleEndian>(self.len)?;
        write.write_u64::<LittleEndian>(self.chunk_len)?;
        write.write_u8(self.compression_level)?;
        write.write_u8(u8::from(self.shuffle))?;
        write.write_u32::<LittleEndian>(self.chunks.len().try_into()?)?;
        for chunk in &self.chunks {
            write.write_u64::<LittleEndian>(chunk.offset)?;
            write.write_u64::<LittleEndian>(chunk.stored_size)?;
            write.write_u64::<LittleEndian>(chunk.raw_size)?;
        }
        Ok(())
    }
}
