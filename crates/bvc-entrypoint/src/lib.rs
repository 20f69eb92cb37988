//! Container entrypoint for the dashcam concat job.
//!
//! Reads a fixed set of environment variables once, turns them into
//! `blackvueconcat` flags, runs the concat program and reports its exit
//! status as its own.

pub mod config;
pub mod error;
pub mod launch;

pub use config::{ConcatFlag, EntrypointConfig, FlagKind, FlagSpec, DEFAULT_COMMAND, FLAGS};
pub use error::{EntrypointError, EntrypointResult};
pub use launch::{exit_code, Invocation};
