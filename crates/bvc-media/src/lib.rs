//! FFmpeg CLI wrapper for dashcam clip concatenation.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeout support via tokio
//! - Packet hashing (`framemd5`) to find overlapping frames between clips
//! - Concat demuxer list writing and concatenation

pub mod command;
pub mod concat;
pub mod concat_list;
pub mod error;
pub mod framemd5;
pub mod progress;

pub use command::{CapturedOutput, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_clips, concat_command, framemd5_command, probe_clip_digests, ClipDigests};
pub use concat_list::{render_concat_list, write_concat_list, ConcatEntry};
pub use error::{MediaError, MediaResult};
pub use framemd5::{find_inpoint, parse_framemd5, FrameDigest};
pub use progress::FfmpegProgress;
