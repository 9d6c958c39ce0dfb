//! Process execution errors

use std::path::PathBuf;
use thiserror::Error;

/// Error types for external process execution
///
/// Command strings carried here are already redacted.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code}")]
    ExitCode { command: String, code: i32 },

    #[error("`{command}` was terminated by a signal")]
    Signal { command: String },

    #[error("`{command}` timed out after {secs} seconds")]
    Timeout { command: String, secs: u64 },

    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
}

impl ProcessError {
    /// Exit code of the process, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::ExitCode { code, .. } => Some(*code),
            _ => None,
        }
    }
}
