use super::{
    Filters,
    raw::{Chunk, Descriptor, HEADER_SIZE, Header, Shape},
};
use crate::{Column, DataType, Error, Result};
use log::debug;
use std::{
    fs::File,
    io::{BufWriter, Seek, SeekFrom, Write},
    path::Path,
};

/// Writes datasets into a container.
///
/// The directory and the final header are written by `close`. A container that was never closed
/// has no directory and is rejected by the reader, so unlike a las writer there is no close on
/// drop.
#[derive(Debug)]
pub struct ContainerWriter<W: Write + Seek> {
    closed: bool,
    descriptors: Vec<Descriptor>,
    end: Option<u64>,
    start: u64,
    write: W,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Creates a new writer, writing a placeholder header.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las2hdf::container::ContainerWriter;
    /// let writer = ContainerWriter::new(Cursor::new(Vec::new())).unwrap();
    /// ```
    pub fn new(mut write: W) -> Result<ContainerWriter<W>> {
        let start = write.stream_position()?;
        Header::default().write_to(&mut write)?;
        Ok(ContainerWriter {
            closed: false,
            descriptors: Vec::new(),
            end: None,
            start,
            write,
        })
    }

    /// Writes an array dataset, `chunk_len` values per chunk.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las2hdf::Column;
    /// use las2hdf::container::{ContainerWriter, Filters};
    ///
    /// let mut writer = ContainerWriter::new(Cursor::new(Vec::new())).unwrap();
    /// let column = Column::F64(vec![1., 2., 3.]);
    /// writer.create_dataset("X", &column, 3, Filters::default()).unwrap();
    /// ```
    pub fn create_dataset(
        &mut self,
        name: &str,
        column: &Column,
        chunk_len: usize,
        filters: Filters,
    ) -> Result<()> {
        self.check_name(name)?;
        let element_size = column.data_type().size();
        let bytes = column.to_le_bytes();
        let mut chunks = Vec::with_capacity(column.len().div_ceil(chunk_len.max(1)));
        for raw in bytes.chunks(chunk_len.max(1) * element_size) {
            let stored = filters.apply(raw, element_size)?;
            chunks.push(self.write_chunk(&stored, raw.len())?);
        }
        debug!(
            "wrote dataset {} ({}, {} values, {} chunks)",
            name,
            column.data_type(),
            column.len(),
            chunks.len()
        );
        self.descriptors.push(Descriptor {
            name: name.to_string(),
            data_type: column.data_type(),
            shape: Shape::Array,
            len: column.len().try_into()?,
            chunk_len: chunk_len.try_into()?,
            compression_level: filters.compression_level,
            shuffle: filters.shuffle,
            chunks,
        });
        Ok(())
    }

    /// Writes a scalar text dataset, stored without filters.
    pub fn create_scalar_text(&mut self, name: &str, text: &str) -> Result<()> {
        self.check_name(name)?;
        let chunk = self.write_chunk(text.as_bytes(), text.len())?;
        self.descriptors.push(Descriptor {
            name: name.to_string(),
            data_type: DataType::Text,
            shape: Shape::ScalarText,
            len: 1,
            chunk_len: 1,
            compression_level: 0,
            shuffle: false,
            chunks: vec![chunk],
        });
        Ok(())
    }

    /// Returns the number of bytes written so far, header included.
    pub fn bytes_written(&mut self) -> Result<u64> {
        match self.end {
            Some(end) => Ok(end - self.start),
            None => Ok(self.write.stream_position()? - self.start),
        }
    }

    /// Writes the directory and re-writes the header.
    ///
    /// The inner `Write` is left positioned at the start of the container, so it can be handed
    /// straight to a `ContainerReader`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use las2hdf::container::ContainerWriter;
    /// let mut writer = ContainerWriter::new(Cursor::new(Vec::new())).unwrap();
    /// writer.close().unwrap();
    /// assert!(writer.close().is_err());
    /// ```
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::ClosedWriter);
        }
        let offset_to_directory = self.write.stream_position()? - self.start;
        for descriptor in &self.descriptors {
            descriptor.write_to(&mut self.write)?;
        }
        let end = self.write.stream_position()?;
        let header = Header {
            number_of_datasets: self.descriptors.len().try_into()?,
            offset_to_directory,
            ..Default::default()
        };
        let _ = self.write.seek(SeekFrom::Start(self.start))?;
        header.write_to(&mut self.write)?;
        let _ = self.write.seek(SeekFrom::Start(self.start))?;
        self.write.flush()?;
        self.end = Some(end);
        self.closed = true;
        Ok(())
    }

    /// Closes this writer and returns its inner `Write`.
    pub fn into_inner(mut self) -> Result<W> {
        if !self.closed {
            self.close()?;
        }
        Ok(self.write)
    }

    #[cfg(test)]
    pub(crate) fn into_unclosed_inner(self) -> W {
        self.write
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.closed {
            return Err(Error::ClosedWriter);
        }
        if name.is_empty() || name.len() > usize::from(u16::MAX) {
            return Err(Error::InvalidDatasetName(name.to_string()));
        }
        if self.descriptors.iter().any(|d| d.name == name) {
            return Err(Error::DuplicateDataset(name.to_string()));
        }
        Ok(())
    }

    fn write_chunk(&mut self, stored: &[u8], raw_size: usize) -> Result<Chunk> {
        let offset = self.write.stream_position()? - self.start;
        debug_assert!(offset >= HEADER_SIZE);
        self.write.write_all(stored)?;
        Ok(Chunk {
            offset,
            stored_size: stored.len().try_into()?,
            raw_size: raw_size.try_into()?,
        })
    }
}

impl ContainerWriter<BufWriter<File>> {
    /// Creates a new writer for a path, truncating any existing file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ContainerWriter<BufWriter<File>>> {
        File::create(path)
            .map_err(Error::from)
            .and_then(|file| ContainerWriter::new(BufWriter::new(file)))
    }
}
