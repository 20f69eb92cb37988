//! One complete concat run.

use bvc_models::group_recordings;
use chrono::{Local, NaiveDate};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::backend::MediaBackend;
use crate::config::ConcatConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::lock::RunLock;
use crate::processor::{scan_recordings, RunSummary, SessionProcessor};
use crate::retention::cleanup_produced_files;

/// Run with today's local date for retention.
pub async fn run<B>(
    config: &ConcatConfig,
    backend: &B,
    cancel_rx: watch::Receiver<bool>,
) -> WorkerResult<RunSummary>
where
    B: MediaBackend + ?Sized,
{
    run_on(config, backend, Local::now().date_naive(), cancel_rx).await
}

/// Group recordings, concatenate each session, then apply retention
/// relative to `today`.
///
/// The whole run holds the lock file, so a second run started meanwhile
/// waits for this one to finish. Sending `true` on `cancel_rx` ends the run
/// with [`WorkerError::Cancelled`], also while waiting for the lock.
pub async fn run_on<B>(
    config: &ConcatConfig,
    backend: &B,
    today: NaiveDate,
    mut cancel_rx: watch::Receiver<bool>,
) -> WorkerResult<RunSummary>
where
    B: MediaBackend + ?Sized,
{
    debug!("start");

    for (name, dir) in [
        ("source_dir", &config.source_dir),
        ("work_dir", &config.work_dir),
        ("output_dir", &config.output_dir),
    ] {
        if !dir.is_dir() {
            return Err(WorkerError::missing_directory(name, dir));
        }
    }

    let lock = RunLock::acquire(&config.lock_file, &mut cancel_rx).await?;
    debug!("Holding {}", lock.path().display());
    ensure_not_cancelled(&cancel_rx)?;

    let recordings = scan_recordings(&config.source_dir).await?;
    let sessions = group_recordings(recordings, &config.grouping);
    info!("Found {} sessions in {}", sessions.len(), config.source_dir.display());

    let mut summary = SessionProcessor::new(config, backend)
        .process(&sessions)
        .await?;

    ensure_not_cancelled(&cancel_rx)?;
    summary.files_deleted += cleanup_produced_files(&config.work_dir, today, config.retention_days).await?;
    summary.files_deleted += cleanup_produced_files(&config.output_dir, today, config.retention_days).await?;

    drop(lock);
    Ok(summary)
}

fn ensure_not_cancelled(cancel_rx: &watch::Receiver<bool>) -> WorkerResult<()> {
    if *cancel_rx.borrow() {
        return Err(WorkerError::Cancelled);
    }
    Ok(())
}
