//! Convert one file into another.
//!
//! The direction comes from the file extensions alone: `.las` to `.hdf5` writes a container,
//! `.hdf5` to `.las` writes a las file. Anything else fails before the file system is touched:
//!
//! ```
//! use las2hdf::{Config, ErrorKind, convert};
//!
//! let error = convert::convert("points.txt", "points.hdf5", &Config::default()).unwrap_err();
//! assert_eq!(ErrorKind::UnsupportedConversion, error.kind());
//! ```

use crate::{
    Config, Error, Result, assemble, columnar, encode, ingest, io,
    phase::{Phase, PhaseTimer, Timing},
};
use log::{error, info};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

/// The extension of container files.
pub const CONTAINER_EXTENSION: &str = "hdf5";

/// The extensions accepted as las input.
#[cfg(not(feature = "laz"))]
pub const LAS_EXTENSIONS: &[&str] = &["las"];

/// The extensions accepted as las input.
#[cfg(feature = "laz")]
pub const LAS_EXTENSIONS: &[&str] = &["las", "laz"];

/// Which way a conversion goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Las in, container out.
    LasToContainer,
    /// Container in, las out.
    ContainerToLas,
}

impl Direction {
    /// Detects the direction from the input and output extensions, ignoring case.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::convert::Direction;
    /// assert_eq!(
    ///     Direction::LasToContainer,
    ///     Direction::detect("in.las", "out.hdf5").unwrap()
    /// );
    /// assert_eq!(
    ///     Direction::ContainerToLas,
    ///     Direction::detect("in.HDF5", "out.LAS").unwrap()
    /// );
    /// assert!(Direction::detect("in.las", "out.las").is_err());
    /// ```
    pub fn detect<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<Direction> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let is_las = |path: &Path| {
            LAS_EXTENSIONS
                .iter()
                .any(|extension| io::has_extension(path, extension))
        };
        let is_container = |path: &Path| io::has_extension(path, CONTAINER_EXTENSION);
        if is_las(input) && is_container(output) {
            Ok(Direction::LasToContainer)
        } else if is_container(input) && io::has_extension(output, "las") {
            Ok(Direction::ContainerToLas)
        } else {
            Err(Error::UnsupportedConversion {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            })
        }
    }

    /// Detects the direction and checks it against an explicit `to_las` assertion.
    ///
    /// The extensions decide. `to_las` may only confirm a container to las conversion; asserting
    /// it for a las to container pair is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::convert::Direction;
    /// assert!(Direction::resolve("in.hdf5", "out.las", true).is_ok());
    /// assert!(Direction::resolve("in.hdf5", "out.las", false).is_ok());
    /// assert!(Direction::resolve("in.las", "out.hdf5", true).is_err());
    /// ```
    pub fn resolve<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        to_las: bool,
    ) -> Result<Direction> {
        let direction = Direction::detect(&input, &output)?;
        if to_las && direction != Direction::ContainerToLas {
            return Err(Error::DirectionMismatch {
                input: input.as_ref().to_path_buf(),
                output: output.as_ref().to_path_buf(),
            });
        }
        Ok(direction)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LasToContainer => f.write_str("las to container"),
            Direction::ContainerToLas => f.write_str("container to las"),
        }
    }
}

/// What a successful conversion did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// The source file.
    pub input: PathBuf,
    /// The destination file.
    pub output: PathBuf,
    /// Which way the conversion went.
    pub direction: Direction,
    /// Durations of the reading, transforming, and writing phases.
    pub timings: Vec<Timing>,
    /// Named counters, e.g. `points` and `datasets`.
    pub counters: BTreeMap<&'static str, u64>,
    /// Wall clock seconds for the whole conversion.
    pub seconds: f64,
}

/// Converts `input` into `output`, picking the direction from their extensions.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &Config,
) -> Result<Report> {
    let direction = Direction::detect(&input, &output)?;
    convert_in(direction, input.as_ref(), output.as_ref(), config)
}

/// Converts `input` into `output` in a direction that was already resolved.
pub fn convert_in(
    direction: Direction,
    input: &Path,
    output: &Path,
    config: &Config,
) -> Result<Report> {
    info!(
        "converting {} to {} ({})",
        input.display(),
        output.display(),
        direction
    );
    let mut timer = PhaseTimer::new();
    let result = match direction {
        Direction::LasToContainer => las_to_container(input, output, config, &mut timer),
        Direction::ContainerToLas => container_to_las(input, output, config, &mut timer),
    };
    match result {
        Ok(()) => {
            timer.enter(Phase::Done);
            let seconds = timer.elapsed().as_secs_f64();
            info!("converted {} in {:.2}s", input.display(), seconds);
            Ok(Report {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                direction,
                timings: timer.timings().to_vec(),
                counters: timer.counters().clone(),
                seconds,
            })
        }
        Err(err) => {
            let phase = timer.phase();
            timer.enter(Phase::Failed);
            error!(
                "converting {} failed while {} ({:?}): {}",
                input.display(),
                phase,
                err.kind(),
                err
            );
            Err(err)
        }
    }
}

fn las_to_container(
    input: &Path,
    output: &Path,
    config: &Config,
    timer: &mut PhaseTimer,
) -> Result<()> {
    timer.enter(Phase::Reading);
    let ingested = ingest::read(input)?;
    let point_cloud = &ingested.point_cloud;
    timer.count("points", point_cloud.number_of_points().try_into()?);
    timer.count("dimensions", point_cloud.number_of_dimensions().try_into()?);

    timer.enter(Phase::Transforming);
    timer.enter(Phase::Writing);
    let bytes = columnar::write(output, point_cloud, &ingested.metadata, config)?;
    timer.count(
        "datasets",
        (point_cloud.number_of_dimensions() + 1).try_into()?,
    );
    timer.count("bytes_written", bytes);
    Ok(())
}

fn container_to_las(
    input: &Path,
    output: &Path,
    config: &Config,
    timer: &mut PhaseTimer,
) -> Result<()> {
    timer.enter(Phase::Reading);
    let columnar = columnar::read(input)?;
    let point_cloud = &columnar.point_cloud;
    timer.count("points", point_cloud.number_of_points().try_into()?);
    timer.count("dimensions", point_cloud.number_of_dimensions().try_into()?);

    timer.enter(Phase::Transforming);
    let assembled = assemble::assemble(point_cloud, config)?;
    timer.count("fields", assembled.fields().len().try_into()?);

    timer.enter(Phase::Writing);
    let points = encode::write(output, &assembled, config)?;
    timer.count("points_written", points);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn unsupported_pairs() {
        for (input, output) in [
            ("a.txt", "b.hdf5"),
            ("a.las", "b.las"),
            ("a.hdf5", "b.hdf5"),
            ("a.hdf5", "b.txt"),
            ("a", "b"),
            ("a.las", "b.h5"),
        ] {
            let error = Direction::detect(input, output).unwrap_err();
            assert_eq!(ErrorKind::UnsupportedConversion, error.kind());
        }
    }

    #[test]
    fn unsupported_pair_does_not_touch_the_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("points.txt");
        let output = dir.path().join("points.hdf5");
        assert!(convert(&input, &output, &Config::default()).is_err());
        assert!(!output.exists());
        assert_eq!(0, std::fs::read_dir(dir.path()).unwrap().count());
    }

    #[test]
    fn to_las_mismatch() {
        let error = Direction::resolve("a.las", "b.hdf5", true).unwrap_err();
        assert!(matches!(error, Error::DirectionMismatch { .. }));
    }

    #[test]
    fn missing_input_is_reported_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let error = convert(
            dir.path().join("missing.hdf5"),
            dir.path().join("out.las"),
            &Config::default(),
        )
        .unwrap_err();
        assert_eq!(ErrorKind::Io, error.kind());
        let error = convert(
            dir.path().join("missing.las"),
            dir.path().join("out.hdf5"),
            &Config::default(),
        )
        .unwrap_err();
        assert_eq!(ErrorKind::Ingestion, error.kind());
    }
}
