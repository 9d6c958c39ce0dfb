//! Pipeline stages
//!
//! Each stage is a plain function over a [`StageContext`]; ordering and
//! failure handling belong to the controller in `execution`.

pub mod deploy;
pub mod inventory;
pub mod materializer;
pub mod toolchain;

use crate::core::{DeployConfig, EnvironmentState};
use crate::process::{CommandRunner, CommandSpec};

pub use materializer::{materialize, resolve, DeployHandoff, Materialized, Resolved};

/// What every process-running stage needs
pub struct StageContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub config: &'a DeployConfig,
    pub environment: &'a EnvironmentState,
}

impl<'a> StageContext<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &'a DeployConfig,
        environment: &'a EnvironmentState,
    ) -> Self {
        Self {
            runner,
            config,
            environment,
        }
    }
}

/// Attach the exported environment and its redactions to a command
pub(crate) fn with_environment(command: CommandSpec, environment: &EnvironmentState) -> CommandSpec {
    let command = command.envs(environment.iter());
    environment
        .sensitive_values()
        .fold(command, |cmd, secret| cmd.sensitive(secret))
}
