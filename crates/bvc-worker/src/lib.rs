//! Dashcam recording concatenation.
//!
//! This crate provides:
//! - Command-line options of the `blackvueconcat` binary
//! - Session processing: concat lists with overlap-skipping in-points and
//!   ffmpeg concatenation per camera
//! - Retention cleanup of produced files
//! - A run lock so scheduled and manual runs never overlap

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod lock;
pub mod logging;
pub mod processor;
pub mod retention;

pub use backend::{FfmpegBackend, MediaBackend};
pub use config::{Cli, ConcatConfig, LoggingLevel};
pub use error::{WorkerError, WorkerResult};
pub use executor::{run, run_on};
pub use lock::RunLock;
pub use processor::{scan_recordings, RunSummary, SessionProcessor};
pub use retention::cleanup_produced_files;
