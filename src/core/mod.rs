//! Core domain models for the deployment pipeline
//!
//! This module defines configuration, inputs, the environment handed to
//! child processes, run state and errors.

pub mod config;
pub mod context;
pub mod error;
pub mod inputs;
pub mod secret;
pub mod state;

pub use config::{DeployConfig, InstallStep};
pub use context::EnvironmentState;
pub use error::{ConfigError, PipelineError};
pub use inputs::{PipelineInputs, PipelineSecrets};
pub use secret::Secret;
pub use state::*;
