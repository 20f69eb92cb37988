//! Turning sessions into concat lists and concatenated videos.

use std::path::Path;

use bvc_media::{find_inpoint, write_concat_list, ConcatEntry, MediaError};
use bvc_models::{Camera, Recording, Session};
use tracing::{debug, error, info, warn};

use crate::backend::MediaBackend;
use crate::config::ConcatConfig;
use crate::error::{WorkerError, WorkerResult};

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sessions: usize,
    /// Camera spans with too few clips to concatenate
    pub below_threshold: usize,
    pub lists_created: usize,
    pub lists_kept: usize,
    pub outputs_created: usize,
    pub outputs_kept: usize,
    pub outputs_failed: usize,
    pub files_deleted: usize,
}

/// List the recordings in `dir`, sorted by file name.
///
/// Directories, unrelated files and names with impossible timestamps are
/// skipped.
pub async fn scan_recordings(dir: &Path) -> WorkerResult<Vec<Recording>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !is_file(&entry.path()).await? {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => debug!("Skipping non UTF-8 file name {:?}", name),
        }
    }
    names.sort();

    let mut recordings = Vec::with_capacity(names.len());
    for name in names {
        match Recording::from_file_name(dir, &name) {
            Ok(Some(recording)) => recordings.push(recording),
            Ok(None) => {}
            Err(e) => warn!("Skipping {}: {}", name, e),
        }
    }
    Ok(recordings)
}

/// Whether `path` is a regular file, following symlinks.
///
/// A dangling symlink is not a file.
pub(crate) async fn is_file(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Processes sessions one camera at a time.
pub struct SessionProcessor<'a, B: MediaBackend + ?Sized> {
    config: &'a ConcatConfig,
    backend: &'a B,
}

impl<'a, B: MediaBackend + ?Sized> SessionProcessor<'a, B> {
    pub fn new(config: &'a ConcatConfig, backend: &'a B) -> Self {
        Self { config, backend }
    }

    /// Process every session, front camera before rear.
    ///
    /// A failed concatenation is counted and processing moves on; only
    /// cancellation and IO errors on our own files stop the run.
    pub async fn process(&self, sessions: &[Session]) -> WorkerResult<RunSummary> {
        let mut summary = RunSummary {
            sessions: sessions.len(),
            ..Default::default()
        };

        for session in sessions {
            debug!(
                "{}-{}",
                session.started_at().format(bvc_models::TIMESTAMP_FORMAT),
                session.ended_at().format(bvc_models::TIMESTAMP_FORMAT)
            );
            for camera in Camera::ALL {
                self.process_camera(session, camera, &mut summary).await?;
            }
        }

        Ok(summary)
    }

    async fn process_camera(
        &self,
        session: &Session,
        camera: Camera,
        summary: &mut RunSummary,
    ) -> WorkerResult<()> {
        let videos = session.videos(camera);
        // A camera without clips is never concatenated, even below a
        // negative threshold
        if videos.is_empty() || videos.len() as i64 <= self.config.concat_threshold {
            info!(
                "{}, skipped (less than concat_threshold={})",
                session.title(camera),
                self.config.concat_threshold
            );
            summary.below_threshold += 1;
            return Ok(());
        }

        let span = session.span(camera);
        let list_path = self.config.work_dir.join(span.concat_list_file_name());
        let output_path = self.config.output_dir.join(span.output_file_name());

        self.ensure_concat_list(&list_path, &videos, summary).await?;
        self.produce_output(&list_path, &output_path, summary).await
    }

    /// Write the concat list unless it exists and overwriting is off.
    async fn ensure_concat_list(
        &self,
        list_path: &Path,
        videos: &[&Recording],
        summary: &mut RunSummary,
    ) -> WorkerResult<()> {
        let name = display_name(list_path);
        if list_path.exists() && !self.config.overwrite {
            info!("{}, skipped (already exists)", name);
            summary.lists_kept += 1;
            return Ok(());
        }

        let entries = self.build_entries(videos).await?;

        if self.config.no_output {
            info!("{}, not created", name);
            return Ok(());
        }

        write_concat_list(list_path, &entries).await?;
        info!("{}, created", name);
        summary.lists_created += 1;
        Ok(())
    }

    /// Hash each clip and derive its in-point from the previous clip's
    /// last frame.
    async fn build_entries(&self, videos: &[&Recording]) -> WorkerResult<Vec<ConcatEntry>> {
        let mut entries = Vec::with_capacity(videos.len());
        let mut last_hash: Option<String> = None;

        for video in videos {
            let digests = match self.backend.clip_digests(&video.path).await {
                Ok(digests) => digests,
                Err(MediaError::Cancelled) => return Err(WorkerError::Cancelled),
                Err(e) => {
                    error!("{} {} {}: {}", video.recorded_at, video.kind, video.extension, e);
                    continue;
                }
            };

            let inpoint = find_inpoint(&digests.frames, last_hash.as_deref());
            if let Some(frame) = digests.frames.last() {
                last_hash = Some(frame.hash.clone());
            }

            if digests.exit_code == Some(0) {
                debug!("{} {} {} {}", video.recorded_at, video.kind, video.extension, inpoint);
            } else {
                warn!(
                    "{} {} {} exit code {:?}, inpoint {}",
                    video.recorded_at, video.kind, video.extension, digests.exit_code, inpoint
                );
            }

            entries.push(ConcatEntry {
                path: video.path.clone(),
                inpoint,
            });
        }

        Ok(entries)
    }

    /// Concatenate the list into the output unless it exists and
    /// overwriting is off.
    async fn produce_output(
        &self,
        list_path: &Path,
        output_path: &Path,
        summary: &mut RunSummary,
    ) -> WorkerResult<()> {
        let name = display_name(output_path);
        if output_path.exists() && !self.config.overwrite {
            info!("{}, concat skipped (already exists)", name);
            summary.outputs_kept += 1;
            return Ok(());
        }

        if self.config.no_output {
            info!("{}, not created", name);
            return Ok(());
        }

        match self.backend.concat(list_path, output_path).await {
            Ok(()) => {
                info!("{}, created", name);
                summary.outputs_created += 1;
            }
            Err(MediaError::Cancelled) => return Err(WorkerError::Cancelled),
            Err(e) => {
                warn!("{}, ended: {}", name, e);
                if let MediaError::FfmpegFailed {
                    stderr: Some(stderr),
                    ..
                } = &e
                {
                    warn!("{}", stderr);
                }
                summary.outputs_failed += 1;
            }
        }

        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
