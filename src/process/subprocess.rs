//! Subprocess runner - spawns commands with tokio and waits for them

use crate::process::{CommandRunner, CommandSpec, ProcessError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs commands as child processes
///
/// Child stdout/stderr are inherited so tool output lands in the job log.
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner {
    /// Optional watchdog; `None` waits forever
    timeout_secs: Option<u64>,
    /// Send child stdout to our stderr, keeping our stdout for JSON
    stdout_to_stderr: bool,
}

impl SubprocessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
        let rendered = spec.to_string();
        debug!("Spawning: {}", rendered);

        let mut command = Command::new(spec.program());
        command
            .args(spec.get_args())
            .envs(spec.env())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if self.stdout_to_stderr {
            command.stdout(std::io::stderr());
        }
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }

        let status = match self.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), command.status())
                .await
                .map_err(|_| ProcessError::Timeout {
                    command: rendered.clone(),
                    secs,
                })?,
            None => command.status().await,
        }
        .map_err(|source| ProcessError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => {
                warn!("{} exited with code {}", rendered, code);
                Err(ProcessError::ExitCode {
                    command: rendered,
                    code,
                })
            }
            None => Err(ProcessError::Signal { command: rendered }),
        }
    }
}
