//! Command line converter between las files and columnar containers.

use clap::Parser;
use las2hdf::{
    Config, Direction, Error,
    batch::{self, Batch},
    config::{self, Builder},
};
use log::LevelFilter;
use std::{path::PathBuf, process::ExitCode};

/// Converts las point clouds to columnar containers (`.las -> .hdf5`) and back (`.hdf5 -> .las`).
#[derive(Debug, Parser)]
#[command(name = "las2hdf", version, about)]
struct Args {
    /// Input and output files, in pairs: INPUT_FILE OUTPUT_FILE [INPUT_FILE OUTPUT_FILE ...]
    #[arg(required = true, num_args = 2.., value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Assert that every pair converts a container to las.
    #[arg(long)]
    to_las: bool,

    /// Number of conversions to run at once [default: cpus - 1]
    #[arg(long, value_name = "N")]
    num_processes: Option<usize>,

    /// Memory budget in gigabytes; each conversion is assumed to need 2
    #[arg(long, value_name = "GB")]
    max_memory: Option<f64>,

    /// Las point format of written las files
    #[arg(long, default_value_t = config::DEFAULT_POINT_FORMAT)]
    point_format: u8,

    /// Las version of written las files
    #[arg(long, default_value = config::DEFAULT_LAS_VERSION)]
    las_version: String,

    /// Deflate level of container datasets, 0 through 9
    #[arg(long, default_value_t = config::DEFAULT_COMPRESSION_LEVEL)]
    compression_level: u32,

    /// Largest number of values in one container chunk
    #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Do not shuffle bytes before deflating
    #[arg(long)]
    no_shuffle: bool,

    /// Scale of x, y, and z in written las files
    #[arg(long, default_value_t = config::DEFAULT_COORDINATE_SCALE)]
    scale: f64,

    /// Log more
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log less
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn config(&self) -> las2hdf::Result<Config> {
        Builder {
            point_format: self.point_format,
            las_version: self.las_version.clone(),
            compression_level: self.compression_level,
            chunk_size: self.chunk_size,
            shuffle: !self.no_shuffle,
            coordinate_scale: self.scale,
        }
        .into_config()
    }

    fn pairs(&self) -> las2hdf::Result<Vec<(PathBuf, PathBuf)>> {
        if self.files.len() % 2 != 0 {
            return Err(Error::Config(format!(
                "files come in input/output pairs, got {} paths",
                self.files.len()
            )));
        }
        let pairs: Vec<_> = self
            .files
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        for (input, output) in &pairs {
            let _ = Direction::resolve(input, output, self.to_las)?;
        }
        Ok(pairs)
    }

    fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.level())
        .parse_default_env()
        .init();

    let (config, pairs) = match args.config().and_then(|config| Ok((config, args.pairs()?))) {
        Ok(ok) => ok,
        Err(err) => return fail(&err),
    };
    let workers = batch::worker_count(
        args.num_processes.unwrap_or_else(batch::default_workers),
        args.max_memory,
    );
    let outcomes = Batch::new(config, workers).run(pairs);

    let mut first_failure = None;
    for outcome in &outcomes {
        match outcome {
            Ok(report) => println!(
                "converted {} to {} in {:.2}s",
                report.input.display(),
                report.output.display(),
                report.seconds
            ),
            Err(err) => {
                eprintln!("error: {err}");
                first_failure = first_failure.or(Some(err));
            }
        }
    }
    match first_failure {
        Some(err) => {
            eprintln!(
                "{} of {} conversions failed",
                outcomes.iter().filter(|outcome| outcome.is_err()).count(),
                outcomes.len()
            );
            exit_code(err)
        }
        None => {
            println!("{} conversions completed", outcomes.len());
            ExitCode::SUCCESS
        }
    }
}

fn fail(err: &Error) -> ExitCode {
    eprintln!("error: {err}");
    exit_code(err)
}

fn exit_code(err: &Error) -> ExitCode {
    u8::try_from(err.kind().exit_code())
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
}
