//! Deployment runner - the ansible-playbook invocation

use crate::core::{DeployConfig, EnvironmentState, PipelineError};
use crate::process::CommandSpec;
use crate::stages::{with_environment, DeployHandoff, StageContext};
use tracing::info;

/// Build the playbook command
///
/// `ansible-playbook -i <inventory> <playbook> -e ansible_become_pass=<pw>
/// -e domain=<domain> [-e key=value ...] -D`, as an argument vector.
/// An empty `sudo_password` is passed through as-is.
pub fn deploy_command(
    config: &DeployConfig,
    environment: &EnvironmentState,
    handoff: &DeployHandoff,
) -> CommandSpec {
    let mut command = CommandSpec::new(config.ansible_playbook.clone())
        .args(["-i", config.inventory_path.as_str(), config.playbook_path.as_str()])
        .arg("-e")
        .arg(format!(
            "ansible_become_pass={}",
            handoff.sudo_password.expose()
        ))
        .arg("-e")
        .arg(format!("domain={}", handoff.domain));

    for (key, value) in &config.extra_vars {
        command = command.arg("-e").arg(format!("{}={}", key, value));
    }

    let command = command
        .arg("-D")
        .current_dir(config.working_dir.clone())
        .sensitive(handoff.sudo_password.expose());
    with_environment(command, environment)
}

/// Run the deployment stage: one attempt, wait for completion
pub async fn run(ctx: &StageContext<'_>, handoff: &DeployHandoff) -> Result<(), PipelineError> {
    let command = deploy_command(ctx.config, ctx.environment, handoff);
    info!("Running Ansible playbook: {}", command);

    ctx.runner
        .run(&command)
        .await
        .map_err(PipelineError::Deployment)?;

    info!("Ansible playbook finished for {}", handoff.domain);
    Ok(())
}
