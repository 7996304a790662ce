//! Convert many files at once.
//!
//! Each `(input, output)` pair is an independent conversion. Pairs run on a bounded pool of
//! worker threads, and one failure never stops the others. Pairs that write the same output
//! are not run at all.
//!
//! ```
//! use las2hdf::{Config, batch::Batch};
//!
//! let batch = Batch::new(Config::default(), 2);
//! let outcomes = batch.run(vec![("a.txt".into(), "b.hdf5".into())]);
//! assert!(outcomes[0].is_err());
//! ```

use crate::{Config, Error, Result, convert::Report};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    collections::HashSet,
    num::NonZeroUsize,
    path::{self, Path, PathBuf},
    thread,
};

/// The memory budget assumed for one worker, in gigabytes.
pub const GIGABYTES_PER_WORKER: f64 = 2.;

/// Caps the requested worker count by a memory budget.
///
/// Each worker holds a whole point cloud in memory, so a budget of `max_memory_gb` allows
/// `floor(max_memory_gb / 2)` workers. The result is never less than one.
///
/// # Examples
///
/// ```
/// use las2hdf::batch::worker_count;
/// assert_eq!(8, worker_count(8, None));
/// assert_eq!(2, worker_count(8, Some(5.)));
/// assert_eq!(1, worker_count(8, Some(1.)));
/// assert_eq!(1, worker_count(0, None));
/// ```
pub fn worker_count(requested: usize, max_memory_gb: Option<f64>) -> usize {
    let mut workers = requested;
    if let Some(max_memory_gb) = max_memory_gb {
        let allowed = (max_memory_gb / GIGABYTES_PER_WORKER).floor();
        if allowed.is_finite() && allowed >= 0. {
            let allowed = allowed as usize;
            if allowed < workers {
                debug!(
                    "memory budget of {max_memory_gb} GB lowers workers from {requested} to {allowed}"
                );
                workers = allowed;
            }
        } else {
            warn!("ignoring invalid memory budget: {max_memory_gb}");
        }
    }
    workers.max(1)
}

/// One less than the number of cpus, and at least one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// A set of conversions sharing one configuration.
#[derive(Clone, Copy, Debug)]
pub struct Batch {
    config: Config,
    workers: usize,
}

impl Batch {
    /// Creates a batch that runs on at most `workers` threads.
    pub fn new(config: Config, workers: usize) -> Batch {
        Batch {
            config,
            workers: workers.max(1),
        }
    }

    /// Returns the number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every conversion, returning one outcome per pair in input order.
    ///
    /// Every pair whose output is also the output of another pair fails with
    /// [Error::DuplicateOutput] and leaves that output untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::{Config, ErrorKind, batch::Batch};
    ///
    /// let batch = Batch::new(Config::default(), 2);
    /// let outcomes = batch.run(vec![
    ///     ("a.las".into(), "points.hdf5".into()),
    ///     ("b.las".into(), "points.hdf5".into()),
    /// ]);
    /// assert!(outcomes.iter().all(|outcome| outcome.as_ref().unwrap_err().kind() == ErrorKind::Config));
    /// ```
    pub fn run(&self, pairs: Vec<(PathBuf, PathBuf)>) -> Vec<Result<Report>> {
        info!(
            "converting {} files on {} workers",
            pairs.len(),
            self.workers
        );
        let duplicates = duplicate_outputs(&pairs);
        let convert = |(input, output): &(PathBuf, PathBuf)| {
            if duplicates.contains(&output_key(output)) {
                Err(Error::DuplicateOutput(output.clone()))
            } else {
                crate::convert::convert(input, output, &self.config)
            }
        };
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("las2hdf-{index}"))
            .build()
        {
            Ok(pool) => pool.install(|| pairs.par_iter().map(convert).collect()),
            Err(err) => {
                warn!("could not start a worker pool, converting serially: {err}");
                pairs.iter().map(convert).collect()
            }
        }
    }
}

fn output_key(output: &Path) -> PathBuf {
    path::absolute(output).unwrap_or_else(|_| output.to_path_buf())
}

fn duplicate_outputs(pairs: &[(PathBuf, PathBuf)]) -> HashSet<PathBuf> {
    let mut seen = HashSet::with_capacity(pairs.len());
    let mut duplicates = HashSet::new();
    for (_, output) in pairs {
        let key = output_key(output);
        if !seen.insert(key.clone()) {
            warn!("{} is the output of more than one pair", output.display());
            let _ = duplicates.insert(key);
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, ErrorKind, PointCloud, columnar};

    #[test]
    fn memory_caps_workers() {
        assert_eq!(3, worker_count(3, Some(100.)));
        assert_eq!(3, worker_count(4, Some(7.9)));
        assert_eq!(1, worker_count(4, Some(0.)));
        assert_eq!(4, worker_count(4, Some(f64::NAN)));
        assert_eq!(4, worker_count(4, Some(-2.)));
    }

    #[test]
    fn default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }

    #[test]
    fn failures_are_isolated_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let mut pairs = Vec::new();
        for i in 0..4 {
            let input = dir.path().join(format!("in-{i}.hdf5"));
            let mut point_cloud = PointCloud::new();
            for name in ["X", "Y", "Z"] {
                if i == 2 && name == "Z" {
                    continue;
                }
                point_cloud
                    .insert(name, Column::F64(vec![i as f64; 3]))
                    .unwrap();
            }
            columnar::write(&input, &point_cloud, "{}", &Config::default()).unwrap();
            pairs.push((input, dir.path().join(format!("out-{i}.las"))));
        }
        let outcomes = Batch::new(Config::default(), 2).run(pairs.clone());
        assert_eq!(4, outcomes.len());
        for (i, outcome) in outcomes.iter().enumerate() {
            if i == 2 {
                assert_eq!(ErrorKind::Schema, outcome.as_ref().unwrap_err().kind());
                assert!(!pairs[i].1.exists());
            } else {
                let report = outcome.as_ref().unwrap();
                assert_eq!(pairs[i].0, report.input);
                assert!(pairs[i].1.exists());
            }
        }
    }

    #[test]
    fn duplicate_outputs_are_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut point_cloud = PointCloud::new();
        for name in ["X", "Y", "Z"] {
            point_cloud.insert(name, Column::F64(vec![1., 2.])).unwrap();
        }
        let mut pairs = Vec::new();
        for name in ["a", "b", "c"] {
            let input = dir.path().join(format!("{name}.hdf5"));
            columnar::write(&input, &point_cloud, "{}", &Config::default()).unwrap();
            pairs.push(input);
        }
        let shared = dir.path().join("shared.las");
        let pairs = vec![
            (pairs[0].clone(), shared.clone()),
            (pairs[1].clone(), dir.path().join("b.las")),
            (pairs[2].clone(), dir.path().join(".").join("shared.las")),
        ];
        let outcomes = Batch::new(Config::default(), 3).run(pairs);
        for i in [0, 2] {
            let error = outcomes[i].as_ref().unwrap_err();
            assert_eq!(ErrorKind::Config, error.kind());
            assert!(matches!(error, Error::DuplicateOutput(_)));
        }
        assert!(outcomes[1].is_ok());
        assert!(!shared.exists());
    }
}
