//! Command-line options and run configuration.

use std::path::PathBuf;

use bvc_models::session::DEFAULT_CONSECUTIVE_THRESHOLD_SECS;
use bvc_models::GroupingOptions;
use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::error::WorkerResult;

/// Default minimum number of clips (exclusive) for a concatenation.
pub const DEFAULT_CONCAT_THRESHOLD: i64 = 2;

/// Default number of days produced files are kept.
pub const DEFAULT_RETENTION_DAYS: i64 = 14;

/// Lock file name used when no lock path is given.
pub const DEFAULT_LOCK_FILE_NAME: &str = "blackvueconcat.lock";

/// Log verbosity, named after the levels the container image documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoggingLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LoggingLevel {
    /// Matching tracing filter. `CRITICAL` has no tracing equivalent and
    /// shares `ERROR`.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

/// Concatenate BlackVue dashcam recordings into one video per drive.
#[derive(Debug, Clone, Parser)]
#[command(name = "blackvueconcat", version)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = LoggingLevel::Warning)]
    pub logging_level: LoggingLevel,

    /// Directory where recording files are stored.
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Directory for work files.
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Directory for output files (concatenated recordings).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// If timestamp difference is less than or equal to the threshold, they are consecutive.
    #[arg(long, allow_negative_numbers = true, default_value_t = DEFAULT_CONSECUTIVE_THRESHOLD_SECS)]
    pub consecutive_threshold: i64,

    /// If the number of consecutive videos is not more than the threshold, they are not concatenated.
    #[arg(long, allow_negative_numbers = true, default_value_t = DEFAULT_CONCAT_THRESHOLD)]
    pub concat_threshold: i64,

    /// Retention days of concatenated recordings.
    #[arg(long, allow_negative_numbers = true, default_value_t = DEFAULT_RETENTION_DAYS)]
    pub retention: i64,

    /// If set, a first impact event of a concatenated recording is kept included.
    #[arg(long)]
    pub initial_impact: bool,

    /// If set, output files are not created.
    #[arg(long)]
    pub no_output: bool,

    /// If set, overwrite work and output files.
    #[arg(long)]
    pub overwrite: bool,

    /// Also append log lines to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Lock file serializing runs [default: <work-dir>/blackvueconcat.lock]
    #[arg(long)]
    pub lock_file: Option<PathBuf>,

    /// Kill an ffmpeg process after this many seconds.
    #[arg(long)]
    pub ffmpeg_timeout: Option<u64>,
}

impl Cli {
    /// Resolve defaults that depend on the process environment.
    pub fn into_config(self) -> WorkerResult<ConcatConfig> {
        let cwd = std::env::current_dir()?;
        let work_dir = self.work_dir.unwrap_or_else(|| cwd.clone());

        Ok(ConcatConfig {
            source_dir: self.source_dir.unwrap_or_else(|| cwd.clone()),
            output_dir: self.output_dir.unwrap_or(cwd),
            lock_file: self
                .lock_file
                .unwrap_or_else(|| work_dir.join(DEFAULT_LOCK_FILE_NAME)),
            work_dir,
            grouping: GroupingOptions {
                consecutive_threshold_secs: self.consecutive_threshold,
                initial_impact: self.initial_impact,
            },
            concat_threshold: self.concat_threshold,
            retention_days: self.retention,
            no_output: self.no_output,
            overwrite: self.overwrite,
            ffmpeg_timeout_secs: self.ffmpeg_timeout,
        })
    }
}

/// Fully resolved configuration of one run.
#[derive(Debug, Clone)]
pub struct ConcatConfig {
    /// Recordings directory
    pub source_dir: PathBuf,
    /// Concat lists directory
    pub work_dir: PathBuf,
    /// Concatenated videos directory
    pub output_dir: PathBuf,
    /// Session grouping rules
    pub grouping: GroupingOptions,
    /// A camera's clips are concatenated only when there are more than this
    pub concat_threshold: i64,
    /// Produced files older than this many days are deleted
    pub retention_days: i64,
    /// Compute everything but write nothing
    pub no_output: bool,
    /// Regenerate existing concat lists and outputs
    pub overwrite: bool,
    /// Run lock
    pub lock_file: PathBuf,
    /// Per-process ffmpeg timeout
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl ConcatConfig {
    /// Configuration with default options for the given directories.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let work_dir = work_dir.into();
        Self {
            source_dir: source_dir.into(),
            lock_file: work_dir.join(DEFAULT_LOCK_FILE_NAME),
            work_dir,
            output_dir: output_dir.into(),
            grouping: GroupingOptions::default(),
            concat_threshold: DEFAULT_CONCAT_THRESHOLD,
            retention_days: DEFAULT_RETENTION_DAYS,
            no_output: false,
            overwrite: false,
            ffmpeg_timeout_secs: None,
        }
    }
}
