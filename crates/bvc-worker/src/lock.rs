//! Run lock.
//!
//! Cron and a manual start may overlap; both would race on the same concat
//! lists. An exclusive `flock` on a lock file serializes runs. The lock is
//! released when the [`RunLock`] is dropped or the process dies.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// How often a waiting run retries the lock.
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Held exclusive lock on a file.
pub struct RunLock {
    _lock: Flock<File>,
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock if nobody holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> WorkerResult<Option<Self>> {
        Self::lock(path.as_ref(), FlockArg::LockExclusiveNonblock)
    }

    /// Wait until the lock is free, polling every [`LOCK_POLL_INTERVAL`].
    ///
    /// Gives up with [`WorkerError::Cancelled`] once `cancel_rx` turns true.
    pub async fn acquire(path: &Path, cancel_rx: &mut watch::Receiver<bool>) -> WorkerResult<Self> {
        let mut announced = false;
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if !announced {
                info!("Waiting for another run to release {}", path.display());
                announced = true;
            }

            tokio::select! {
                _ = tokio::time::sleep(LOCK_POLL_INTERVAL) => {}
                _ = cancelled(cancel_rx) => return Err(WorkerError::Cancelled),
            }
        }
    }

    fn lock(path: &Path, arg: FlockArg) -> WorkerResult<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        match Flock::lock(file, arg) {
            Ok(lock) => {
                debug!("Acquired lock {}", path.display());
                Ok(Some(Self {
                    _lock: lock,
                    path: path.to_path_buf(),
                }))
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
            Err((_, errno)) => Err(WorkerError::Lock {
                path: path.to_path_buf(),
                source: errno,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolves once `true` is sent; never if the sender goes away first.
pub(crate) async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
