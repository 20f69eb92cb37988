//! Concat program invocation and exit status mapping.

use std::ffi::OsString;
use std::fmt;
use std::process::ExitStatus;

use tokio::process::Command;
use tracing::debug;

use crate::config::EntrypointConfig;
use crate::error::{EntrypointError, EntrypointResult};

/// Base of the exit code reported for a child killed by a signal.
const SIGNAL_EXIT_BASE: i32 = 128;

/// A fully assembled command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Command followed by the configured flags.
    pub fn from_config(config: &EntrypointConfig) -> Self {
        let command = if config.command.is_empty() {
            EntrypointConfig::default().command
        } else {
            config.command.clone()
        };
        let mut words = command.into_iter();
        let program = words.next().unwrap_or_default();

        let mut args: Vec<OsString> = words.map(OsString::from).collect();
        for flag in &config.flags {
            args.push(flag.flag.into());
            if let Some(value) = &flag.value {
                args.push(value.clone());
            }
        }

        Self { program, args }
    }

    /// Run the program with inherited stdio and wait for it.
    pub async fn run(&self) -> EntrypointResult<ExitStatus> {
        debug!("Spawning {}", self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .map_err(|source| EntrypointError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        child.wait().await.map_err(|source| EntrypointError::Wait {
            program: self.program.clone(),
            source,
        })
    }
}

/// Lossy for arguments that are not valid unicode.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit code of the wrapper for a finished child.
///
/// A normal exit passes the child's code through. A child killed by a
/// signal reports `128 + signal` like a shell does.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ((SIGNAL_EXIT_BASE + signal) & 0xff) as u8;
        }
    }

    1
}
