//! deploy-pipeline - provision Ansible and run a deployment playbook as a CI step

pub mod cli;
pub mod core;
pub mod execution;
pub mod process;
pub mod provider;
pub mod stages;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, DeployConfig, EnvironmentState, ExecutionStatus, PipelineError, PipelineRun,
    RunState, Stage,
};
pub use execution::{PipelineController, PipelineEvent, PipelinePlan};
pub use process::{CommandRunner, CommandSpec, ProcessError, SubprocessRunner};
pub use provider::{EnvProvider, StaticProvider, ValueProvider};
