//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{name} {} does not exist", path.display())]
    MissingDirectory { name: &'static str, path: PathBuf },

    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        source: nix::errno::Errno,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Media error: {0}")]
    Media(#[from] bvc_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn missing_directory(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingDirectory {
            name,
            path: path.into(),
        }
    }

    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}
