//! Shared data models for BlackVue concat.
//!
//! This crate provides:
//! - Recording file name parsing (timestamp, type code, camera)
//! - Grouping of recordings into driving sessions
//! - Names of concat lists and concatenated outputs

pub mod naming;
pub mod recording;
pub mod session;

// Re-export common types
pub use naming::{produced_file_date, session_title, SpanName};
pub use recording::{parse_timestamp, Camera, Recording, RecordingError, TIMESTAMP_FORMAT};
pub use session::{group_recordings, GroupingOptions, Session};
