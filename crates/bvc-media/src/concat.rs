//! Clip probing and concatenation.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::framemd5::{parse_framemd5, FrameDigest};
use crate::progress::FfmpegProgress;

/// Frame digests of one clip together with ffmpeg's exit code.
#[derive(Debug, Clone)]
pub struct ClipDigests {
    pub frames: Vec<FrameDigest>,
    /// ffmpeg may exit non-zero on a truncated clip while still hashing
    /// everything before the damage
    pub exit_code: Option<i32>,
}

/// Command hashing every video packet of `clip` without decoding.
pub fn framemd5_command(clip: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::to_stdout(clip)
        .no_stats()
        .hide_banner()
        .no_audio()
        .format("framemd5")
        .codec("copy")
}

/// Command joining the clips of a concat list into one file.
///
/// Video is stream-copied; audio is resampled so gaps left by the clip
/// in-points do not drift the sound out of sync.
pub fn concat_command(list: impl AsRef<Path>, output: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::new(list, output)
        .fflags("+genpts+igndts")
        .input_format("concat")
        .input_args(["-safe", "0", "-segment_time_metadata", "1"])
        .video_codec("copy")
        .audio_filter("aselect=concatdec_select,aresample=async=1")
        .overwrite(true)
        .log_level("error")
        .with_progress()
}

/// Hash the packets of a clip.
pub async fn probe_clip_digests(runner: &FfmpegRunner, clip: impl AsRef<Path>) -> MediaResult<ClipDigests> {
    let clip = clip.as_ref();
    if !clip.exists() {
        return Err(MediaError::FileNotFound(clip.to_path_buf()));
    }

    let output = runner.capture(&framemd5_command(clip)).await?;
    let frames = parse_framemd5(&output.stdout);
    debug!(
        "Hashed {} frames of {} (exit code {:?})",
        frames.len(),
        clip.display(),
        output.exit_code
    );

    Ok(ClipDigests {
        frames,
        exit_code: output.exit_code,
    })
}

/// Concatenate the clips listed in `list` into `output`.
pub async fn concat_clips<F>(
    runner: &FfmpegRunner,
    list: impl AsRef<Path>,
    output: impl AsRef<Path>,
    progress_callback: F,
) -> MediaResult<()>
where
    F: Fn(FfmpegProgress) + Send + 'static,
{
    let list = list.as_ref();
    if !list.exists() {
        return Err(MediaError::FileNotFound(list.to_path_buf()));
    }

    runner
        .run_with_progress(&concat_command(list, output), progress_callback)
        .await
}
