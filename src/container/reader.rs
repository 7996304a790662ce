use super::{
    Filters,
    raw::{Descriptor, Header, Shape},
};
use crate::{Column, Error, Result, io::capacity_hint};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

/// Reads datasets out of a container.
#[derive(Debug)]
pub struct ContainerReader<R: Read + Seek> {
    descriptors: Vec<Descriptor>,
    len: u64,
    read: R,
    start: u64,
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Creates a new reader, reading the header and the directory.
    ///
    /// The container starts at the current position of `read`.
    pub fn new(mut read: R) -> Result<ContainerReader<R>> {
        let start = read.stream_position()?;
        let len = read.seek(SeekFrom::End(0))?.saturating_sub(start);
        let _ = read.seek(SeekFrom::Start(start))?;
        let header = Header::read_from(&mut read)?;
        if header.offset_to_directory == 0 {
            return Err(Error::UnclosedContainer);
        }
        check_bounds(header.offset_to_directory, 0, len)?;
        let _ = read.seek(SeekFrom::Start(start + header.offset_to_directory))?;
        let mut descriptors =
            Vec::with_capacity(capacity_hint(header.number_of_datasets.into()));
        for _ in 0..header.number_of_datasets {
            let descriptor = Descriptor::read_from(&mut read)?;
            for chunk in &descriptor.chunks {
                check_bounds(chunk.offset, chunk.stored_size, len)?;
            }
            descriptors.push(descriptor);
        }
        Ok(ContainerReader {
            descriptors,
            len,
            read,
            start,
        })
    }

    /// Returns the dataset names, in the order they were written.
    pub fn list_datasets(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    /// Returns true if there is a dataset with this exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }

    /// Returns the directory entry for this dataset.
    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Reads an array dataset into memory.
    pub fn read_dataset(&mut self, name: &str) -> Result<Column> {
        let descriptor = self.find(name, Shape::Array, "an array")?;
        let filters = Filters {
            compression_level: descriptor.compression_level,
            shuffle: descriptor.shuffle,
        };
        let element_size = descriptor.data_type.size();
        let mut bytes = Vec::with_capacity(
            capacity_hint(descriptor.len).saturating_mul(element_size),
        );
        for (index, chunk) in descriptor.chunks.iter().enumerate() {
            let stored = self.read_chunk(chunk.offset, chunk.stored_size)?;
            let inflated = filters.inflate(&stored, chunk.raw_size)?;
            if inflated.len() as u64 != chunk.raw_size {
                return Err(Error::InvalidChunk {
                    dataset: descriptor.name,
                    index,
                    expected: chunk.raw_size,
                    found: inflated.len() as u64,
                });
            }
            bytes.extend(filters.restore(inflated, element_size));
        }
        let column = Column::from_le_bytes(descriptor.data_type, &bytes)?;
        if column.len() as u64 != descriptor.len {
            return Err(Error::InvalidChunk {
                dataset: descriptor.name,
                index: descriptor.chunks.len(),
                expected: descriptor.len * element_size as u64,
                found: bytes.len() as u64,
            });
        }
        Ok(column)
    }

    /// Reads a scalar text dataset.
    pub fn read_scalar_text(&mut self, name: &str) -> Result<String> {
        let descriptor = self.find(name, Shape::ScalarText, "scalar text")?;
        let mut text = String::new();
        for chunk in &descriptor.chunks {
            let bytes = self.read_chunk(chunk.offset, chunk.stored_size)?;
            text.push_str(std::str::from_utf8(&bytes)?);
        }
        Ok(text)
    }

    fn find(&self, name: &str, shape: Shape, expected: &'static str) -> Result<Descriptor> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| Error::NoSuchDataset(name.to_string()))?;
        if descriptor.shape != shape {
            return Err(Error::ShapeMismatch {
                name: name.to_string(),
                expected,
            });
        }
        Ok(descriptor.clone())
    }

    fn read_chunk(&mut self, offset: u64, stored_size: u64) -> Result<Vec<u8>> {
        check_bounds(offset, stored_size, self.len)?;
        let _ = self.read.seek(SeekFrom::Start(self.start + offset))?;
        let mut bytes = vec![0; stored_size.try_into()?];
        self.read.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

fn check_bounds(offset: u64, size: u64, len: u64) -> Result<()> {
    if offset.checked_add(size).is_none_or(|end| end > len) {
        Err(Error::Truncated { offset, size, len })
    } else {
        Ok(())
    }
}

impl ContainerReader<BufReader<File>> {
    /// Creates a new reader from a path.
    ///
    /// The underlying `File` is wrapped in a `BufReader`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ContainerReader<BufReader<File>>> {
        File::open(path)
            .map_err(Error::from)
            .and_then(|file| ContainerReader::new(BufReader::new(file)))
    }
}
