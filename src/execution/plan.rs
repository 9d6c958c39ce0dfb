//! Dry-run plan - every command the pipeline would run, secrets redacted

use crate::{
    core::{ConfigError, DeployConfig, Stage},
    process::CommandSpec,
    provider::ValueProvider,
    stages::{deploy, inventory, resolve, toolchain, DeployHandoff},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One stage of the plan
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStage {
    pub stage: Stage,
    pub commands: Vec<PlannedCommand>,
}

/// A command as it would be run
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCommand {
    pub label: Option<String>,
    pub command: String,
    pub working_dir: Option<PathBuf>,
}

impl PlannedCommand {
    fn new(label: Option<String>, spec: &CommandSpec) -> Self {
        Self {
            label,
            command: spec.to_string(),
            working_dir: spec.working_dir().map(|p| p.to_path_buf()),
        }
    }
}

/// The whole pipeline, resolved against real inputs but not executed
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    pub environment: BTreeMap<String, String>,
    pub vault_password_file: PathBuf,
    pub vault_file_mode: String,
    pub supported_distributions: Vec<String>,
    pub stages: Vec<PlannedStage>,
}

impl PipelinePlan {
    /// Resolve inputs and build the plan; nothing is written or executed
    pub fn build(provider: &dyn ValueProvider, config: &DeployConfig) -> Result<Self, ConfigError> {
        let resolved = resolve(provider, config)?;
        let env = &resolved.environment;
        let handoff = DeployHandoff {
            domain: resolved.inputs.domain.clone(),
            sudo_password: resolved.secrets.sudo_password.clone(),
        };

        let toolchain_commands = toolchain::install_commands(config, env)
            .iter()
            .map(|(step, spec)| PlannedCommand::new(Some(step.name.clone()), spec))
            .collect();

        let stages = vec![
            PlannedStage {
                stage: Stage::Environment,
                commands: Vec::new(),
            },
            PlannedStage {
                stage: Stage::Toolchain,
                commands: toolchain_commands,
            },
            PlannedStage {
                stage: Stage::Inventory,
                commands: vec![PlannedCommand::new(
                    None,
                    &inventory::refresh_command(config, env),
                )],
            },
            PlannedStage {
                stage: Stage::Deployment,
                commands: vec![PlannedCommand::new(
                    None,
                    &deploy::deploy_command(config, env, &handoff),
                )],
            },
        ];

        Ok(Self {
            environment: env.redacted(),
            vault_password_file: resolved.vault_password_file,
            vault_file_mode: format!("{:04o}", config.vault_file_mode),
            supported_distributions: config.supported_distributions.clone(),
            stages,
        })
    }
}
