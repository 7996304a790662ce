//! The per-chunk filter pipeline: byte shuffle, then deflate.

use crate::{Result, io::capacity_hint};
use flate2::{
    Compression,
    read::ZlibDecoder,
    write::ZlibEncoder,
};
use std::io::{Read, Write};

/// The filters applied to every chunk of an array dataset.
///
/// # Examples
///
/// ```
/// use las2hdf::container::Filters;
/// let filters = Filters::default();
/// assert_eq!(4, filters.compression_level);
/// assert!(filters.shuffle);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filters {
    /// Deflate level, 0 through 9. Zero stores the chunk as is.
    pub compression_level: u8,
    /// Regroup bytes by significance before deflating.
    pub shuffle: bool,
}

impl Default for Filters {
    fn default() -> Filters {
        Filters {
            compression_level: 4,
            shuffle: true,
        }
    }
}

impl Filters {
    /// Runs the filters forward over the raw bytes of one chunk.
    pub fn apply(&self, bytes: &[u8], element_size: usize) -> Result<Vec<u8>> {
        let shuffled;
        let bytes = if self.shuffle && element_size > 1 {
            shuffled = shuffle(bytes, element_size);
            &shuffled[..]
        } else {
            bytes
        };
        if self.compression_level == 0 {
            return Ok(bytes.to_vec());
        }
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(bytes.len() / 2),
            Compression::new(u32::from(self.compression_level)),
        );
        encoder.write_all(bytes)?;
        Ok(encoder.finish()?)
    }

    /// Inflates the stored bytes of one chunk.
    ///
    /// Inflation stops one byte past `raw_size`, which is enough for the caller to see that the
    /// chunk is the wrong size. The result is still shuffled, see [Filters::restore].
    pub fn inflate(&self, bytes: &[u8], raw_size: u64) -> Result<Vec<u8>> {
        if self.compression_level == 0 {
            return Ok(bytes.to_vec());
        }
        let mut inflated = Vec::with_capacity(capacity_hint(raw_size));
        let _ = ZlibDecoder::new(bytes)
            .take(raw_size.saturating_add(1))
            .read_to_end(&mut inflated)?;
        Ok(inflated)
    }

    /// Undoes the shuffle on inflated bytes.
    pub fn restore(&self, bytes: Vec<u8>, element_size: usize) -> Vec<u8> {
        if self.shuffle && element_size > 1 {
            unshuffle(&bytes, element_size)
        } else {
            bytes
        }
    }
}

/// Regroups bytes so that byte `j` of every element lands in plane `j`.
///
/// # Examples
///
/// ```
/// use las2hdf::container::filter::shuffle;
/// assert_eq!(vec![1, 3, 2, 4], shuffle(&[1, 2, 3, 4], 2));
/// ```
pub fn shuffle(bytes: &[u8], element_size: usize) -> Vec<u8> {
    let n = bytes.len() / element_size;
    let mut shuffled = vec![0; bytes.len()];
    for (i, element) in bytes.chunks_exact(element_size).enumerate() {
        for (j, &byte) in element.iter().enumerate() {
            shuffled[j * n + i] = byte;
        }
    }
    let tail = n * element_size;
    shuffled[tail..].copy_from_slice(&bytes[tail..]);
    shuffled
}

/// Inverts [shuffle].
pub fn unshuffle(bytes: &[u8], element_size: usize) -> Vec<u8> {
    let n = bytes.len() / element_size;
    let mut unshuffled = vec![0; bytes.len()];
    for (i, element) in unshuffled.chunks_exact_mut(element_size).enumerate() {
        for (j, byte) in element.iter_mut().enumerate() {
            *byte = bytes[j * n + i];
        }
    }
    let tail = n * element_size;
    unshuffled[tail..].copy_from_slice(&bytes[tail..]);
    unshuffled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_planes() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
        assert_eq!(
            vec![0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
            shuffle(&bytes, 4)
        );
        assert_eq!(bytes.to_vec(), unshuffle(&shuffle(&bytes, 4), 4));
    }

    #[test]
    fn shuffle_keeps_ragged_tail() {
        let bytes = [1, 2, 3, 4, 5];
        assert_eq!(vec![1, 3, 2, 4, 5], shuffle(&bytes, 2));
        assert_eq!(bytes.to_vec(), unshuffle(&shuffle(&bytes, 2), 2));
    }

    #[test]
    fn deflate_shrinks_repetitive_data() {
        let bytes = vec![7u8; 4096];
        let filters = Filters::default();
        let stored = filters.apply(&bytes, 8).unwrap();
        assert!(stored.len() < bytes.len());
        let inflated = filters.inflate(&stored, 4096).unwrap();
        assert_eq!(bytes, filters.restore(inflated, 8));
    }

    #[test]
    fn inflate_stops_past_raw_size() {
        let bytes = vec![0u8; 1 << 16];
        let filters = Filters::default();
        let stored = filters.apply(&bytes, 1).unwrap();
        assert_eq!(17, filters.inflate(&stored, 16).unwrap().len());
    }

    #[test]
    fn level_zero_stores() {
        let filters = Filters {
            compression_level: 0,
            shuffle: false,
        };
        let bytes = vec![1, 2, 3];
        assert_eq!(bytes, filters.apply(&bytes, 1).unwrap());
    }
}
