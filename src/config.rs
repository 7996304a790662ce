//! Conversion options.
//!
//! Use a `Builder` to change the defaults, then validate it into a `Config`:
//!
//! ```
//! use las2hdf::config::Builder;
//!
//! let mut builder = Builder::default();
//! builder.compression_level = 9;
//! let config = builder.into_config().unwrap();
//! assert_eq!(9, config.filters().compression_level);
//!
//! let mut builder = Builder::default();
//! builder.compression_level = 10;
//! assert!(builder.into_config().is_err());
//! ```

use crate::{Error, Result, container::Filters};
use las::{Version, point::Format};

/// The point format of assembled las files.
pub const DEFAULT_POINT_FORMAT: u8 = 3;

/// The version of assembled las files.
pub const DEFAULT_LAS_VERSION: &str = "1.2";

/// The deflate level of container datasets.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 4;

/// The largest number of values in one container chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// The x, y, and z scale of assembled las files.
pub const DEFAULT_COORDINATE_SCALE: f64 = 0.01;

/// Builds a configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Builder {
    /// The las point format id written on the inverse path.
    pub point_format: u8,

    /// The las version written on the inverse path, as `major.minor`.
    pub las_version: String,

    /// The deflate level of container datasets, 0 through 9.
    pub compression_level: u32,

    /// The largest number of values in one container chunk.
    pub chunk_size: usize,

    /// Shuffle bytes before deflating.
    pub shuffle: bool,

    /// The scale applied to x, y, and z when writing las.
    pub coordinate_scale: f64,
}

/// A validated configuration, shared read-only by every conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    point_format: Format,
    las_version: Version,
    filters: Filters,
    chunk_size: usize,
    coordinate_scale: f64,
}

impl Default for Builder {
    fn default() -> Builder {
        Builder {
            point_format: DEFAULT_POINT_FORMAT,
            las_version: DEFAULT_LAS_VERSION.to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            shuffle: true,
            coordinate_scale: DEFAULT_COORDINATE_SCALE,
        }
    }
}

impl Builder {
    /// Validates this builder into a configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::config::Builder;
    ///
    /// let mut builder = Builder::default();
    /// builder.las_version = "1.1".to_string();
    /// builder.point_format = 3; // point format 3 needs las 1.2
    /// assert!(builder.into_config().is_err());
    /// ```
    pub fn into_config(self) -> Result<Config> {
        let point_format = Format::new(self.point_format).map_err(|_| {
            Error::Config(format!("unknown las point format: {}", self.point_format))
        })?;
        if point_format.has_waveform {
            return Err(Error::Config(format!(
                "waveform point format {} cannot be assembled from columns",
                self.point_format
            )));
        }
        let las_version = parse_version(&self.las_version)?;
        if !las_version_supports(las_version, self.point_format) {
            return Err(Error::Config(format!(
                "las {} does not support point format {}",
                las_version, self.point_format
            )));
        }
        let compression_level = u8::try_from(self.compression_level)
            .ok()
            .filter(|&level| level <= 9)
            .ok_or_else(|| {
                Error::Config(format!(
                    "compression level must be between 0 and 9, got {}",
                    self.compression_level
                ))
            })?;
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk size must be positive".to_string()));
        }
        if !(self.coordinate_scale.is_finite() && self.coordinate_scale > 0.) {
            return Err(Error::Config(format!(
                "coordinate scale must be positive, got {}",
                self.coordinate_scale
            )));
        }
        Ok(Config {
            point_format,
            las_version,
            filters: Filters {
                compression_level,
                shuffle: self.shuffle,
            },
            chunk_size: self.chunk_size,
            coordinate_scale: self.coordinate_scale,
        })
    }
}

impl Config {
    /// Returns the las point format written on the inverse path.
    pub fn point_format(&self) -> Format {
        self.point_format
    }

    /// Returns the las version written on the inverse path.
    pub fn las_version(&self) -> Version {
        self.las_version
    }

    /// Returns the filters applied to container datasets.
    pub fn filters(&self) -> Filters {
        self.filters
    }

    /// Returns the largest number of values in one container chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the x, y, and z scale of written las files.
    pub fn coordinate_scale(&self) -> f64 {
        self.coordinate_scale
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            point_format: Format::new(DEFAULT_POINT_FORMAT).unwrap_or_default(),
            las_version: Version::new(1, 2),
            filters: Filters::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            coordinate_scale: DEFAULT_COORDINATE_SCALE,
        }
    }
}

fn parse_version(s: &str) -> Result<Version> {
    let invalid = || Error::Config(format!("las version must look like 1.2, got {s:?}"));
    let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
    let major = major.parse::<u8>().map_err(|_| invalid())?;
    let minor = minor.parse::<u8>().map_err(|_| invalid())?;
    if major != 1 || minor > 4 {
        return Err(Error::Config(format!("unsupported las version: {s}")));
    }
    Ok(Version::new(major, minor))
}

/// Point formats 0 and 1 exist since 1.0, 2 and 3 since 1.2, 4 and 5 since 1.3, 6 through 10
/// since 1.4.
fn las_version_supports(version: Version, point_format: u8) -> bool {
    let minimum_minor = match point_format {
        0 | 1 => 0,
        2 | 3 => 2,
        4 | 5 => 3,
        _ => 4,
    };
    version.minor >= minimum_minor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Builder::default().into_config().unwrap();
        assert_eq!(Config::default(), config);
        assert_eq!(3, config.point_format().to_u8().unwrap());
        assert_eq!(Version::new(1, 2), config.las_version());
        assert_eq!(4, config.filters().compression_level);
        assert!(config.filters().shuffle);
        assert_eq!(1_000_000, config.chunk_size());
    }

    #[test]
    fn unknown_point_format() {
        let builder = Builder {
            point_format: 11,
            ..Default::default()
        };
        assert!(builder.into_config().is_err());
    }

    #[test]
    fn waveform_formats() {
        for point_format in [4, 5, 9, 10] {
            let builder = Builder {
                point_format,
                las_version: "1.4".to_string(),
                ..Default::default()
            };
            assert!(builder.into_config().is_err());
        }
    }

    #[test]
    fn versions() {
        for (s, ok) in [
            ("1.2", true),
            (" 1.4 ", true),
            ("1.5", false),
            ("2.0", false),
            ("12", false),
            ("one.two", false),
        ] {
            let builder = Builder {
                las_version: s.to_string(),
                point_format: 0,
                ..Default::default()
            };
            assert_eq!(ok, builder.into_config().is_ok(), "{}", s);
        }
    }

    #[test]
    fn chunk_size_must_be_positive() {
        let builder = Builder {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(builder.into_config().is_err());
    }

    #[test]
    fn coordinate_scale_must_be_positive() {
        for scale in [0., -0.01, f64::NAN, f64::INFINITY] {
            let builder = Builder {
                coordinate_scale: scale,
                ..Default::default()
            };
            assert!(builder.into_config().is_err());
        }
    }

    #[test]
    fn config_errors_have_config_kind() {
        let builder = Builder {
            compression_level: 42,
            ..Default::default()
        };
        assert_eq!(
            crate::ErrorKind::Config,
            builder.into_config().unwrap_err().kind()
        );
    }
}
