//! Media operations used by the session processor.

use std::path::Path;

use async_trait::async_trait;
use bvc_media::{concat_clips, probe_clip_digests, ClipDigests, FfmpegRunner, MediaResult};
use tracing::debug;

/// The two ffmpeg jobs a run needs: hashing a clip and concatenating a list.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Hash every video packet of a clip.
    async fn clip_digests(&self, clip: &Path) -> MediaResult<ClipDigests>;

    /// Join the clips of a concat list into `output`.
    async fn concat(&self, list: &Path, output: &Path) -> MediaResult<()>;
}

/// Backend running the ffmpeg executable.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    runner: FfmpegRunner,
}

impl FfmpegBackend {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn clip_digests(&self, clip: &Path) -> MediaResult<ClipDigests> {
        probe_clip_digests(&self.runner, clip).await
    }

    async fn concat(&self, list: &Path, output: &Path) -> MediaResult<()> {
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        concat_clips(&self.runner, list, output, move |progress| {
            debug!(
                output = %name,
                out_time = %progress.out_time,
                speed = progress.speed,
                "Concat progress"
            );
        })
        .await
    }
}
