//! Pipeline error types

use crate::core::state::Stage;
use crate::process::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration, inputs or secrets
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required input `{0}` is not set")]
    MissingInput(&'static str),

    #[error("required secret `{0}` is not set")]
    MissingSecret(&'static str),

    #[error("unable to determine home directory for the vault password file")]
    HomeDirUnavailable,

    #[error("failed to write vault password file {}: {source}", .path.display())]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A stage failure; the message is prefixed with the stage that raised it
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Environment setup failed: {0}")]
    Configuration(#[from] ConfigError),

    #[error(
        "Toolchain setup failed: unsupported operating system, only {} are supported",
        .supported.join("/")
    )]
    UnsupportedPlatform { supported: Vec<String> },

    #[error("Toolchain setup failed: {step}: {source}")]
    Installation {
        step: String,
        #[source]
        source: ProcessError,
    },

    #[error("Inventory refresh failed: {0}")]
    ScriptExecution(#[source] ProcessError),

    #[error("Deployment failed: {0}")]
    Deployment(#[source] ProcessError),
}

impl PipelineError {
    /// The stage this error is attributed to
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Configuration(_) => Stage::Environment,
            PipelineError::UnsupportedPlatform { .. } | PipelineError::Installation { .. } => {
                Stage::Toolchain
            }
            PipelineError::ScriptExecution(_) => Stage::Inventory,
            PipelineError::Deployment(_) => Stage::Deployment,
        }
    }

    /// Short error kind name, stable for machine output
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "ConfigurationError",
            PipelineError::UnsupportedPlatform { .. } => "UnsupportedPlatformError",
            PipelineError::Installation { .. } => "InstallationError",
            PipelineError::ScriptExecution(_) => "ScriptExecutionError",
            PipelineError::Deployment(_) => "DeploymentError",
        }
    }
}
