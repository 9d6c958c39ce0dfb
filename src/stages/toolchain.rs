//! Toolchain installer - platform detection and sequential package installs

use crate::core::{DeployConfig, EnvironmentState, InstallStep, PipelineError};
use crate::process::CommandSpec;
use crate::stages::{with_environment, StageContext};
use std::path::Path;
use tracing::{info, warn};

/// Return the first supported distribution marker found in the OS text
pub fn detect_platform<'a>(os_release: &str, supported: &'a [String]) -> Option<&'a str> {
    supported
        .iter()
        .map(String::as_str)
        .filter(|marker| !marker.trim().is_empty())
        .find(|marker| os_release.contains(marker))
}

/// Read the OS identification text
///
/// An unreadable file yields empty text, which no distribution matches.
pub async fn read_os_release(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// The install commands, in execution order
///
/// Empty argv lists never reach here: `DeployConfig::validate` rejects them
/// and runs at the start of the environment stage and of plan building.
pub fn install_commands(
    config: &DeployConfig,
    environment: &EnvironmentState,
) -> Vec<(InstallStep, CommandSpec)> {
    config
        .install_steps
        .iter()
        .filter_map(|step| {
            let command = CommandSpec::from_argv(&step.command)?;
            Some((step.clone(), with_environment(command, environment)))
        })
        .collect()
}

/// Run the toolchain stage
///
/// Detection happens before any install process is started. Steps run one
/// at a time; the first failure stops the stage.
pub async fn install(ctx: &StageContext<'_>, os_release: &str) -> Result<(), PipelineError> {
    let supported = &ctx.config.supported_distributions;
    let Some(platform) = detect_platform(os_release, supported) else {
        return Err(PipelineError::UnsupportedPlatform {
            supported: supported.clone(),
        });
    };
    info!("Detected supported platform: {}", platform);

    for (step, command) in install_commands(ctx.config, ctx.environment) {
        info!("Running install step {}: {}", step.name, command);
        ctx.runner
            .run(&command)
            .await
            .map_err(|source| PipelineError::Installation {
                step: step.name.clone(),
                source,
            })?;
    }

    info!("Ansible toolchain installed");
    Ok(())
}
