//! Entrypoint error types.

use thiserror::Error;

/// Exit code of a shell for a command that cannot be found.
pub const EXIT_NOT_FOUND: u8 = 127;

/// Exit code of a shell for a command that cannot be executed.
pub const EXIT_CANNOT_EXECUTE: u8 = 126;

pub type EntrypointResult<T> = Result<T, EntrypointError>;

#[derive(Debug, Error)]
pub enum EntrypointError {
    #[error("CONCAT_COMMAND is not a valid command line: {0}")]
    InvalidCommand(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

impl EntrypointError {
    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    /// Exit code the wrapper reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            Self::Spawn { .. } => EXIT_CANNOT_EXECUTE,
            Self::InvalidCommand(_) | Self::Wait { .. } => 1,
        }
    }
}
