//! Inventory refresher - regenerates the host inventory via an external script

use crate::core::{DeployConfig, EnvironmentState, PipelineError};
use crate::process::{CommandSpec, ProcessError};
use crate::stages::{with_environment, StageContext};
use tracing::info;

/// `<interpreter> <script>`, run inside the working directory
pub fn refresh_command(config: &DeployConfig, environment: &EnvironmentState) -> CommandSpec {
    let command = CommandSpec::new(config.script_interpreter.clone())
        .arg(config.inventory_script.clone())
        .current_dir(config.working_dir.clone());
    with_environment(command, environment)
}

/// Run the inventory stage; success is solely "exited zero"
pub async fn refresh(ctx: &StageContext<'_>) -> Result<(), PipelineError> {
    let script = ctx.config.inventory_script_path();
    let present = tokio::fs::metadata(&script)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !present {
        return Err(PipelineError::ScriptExecution(ProcessError::NotFound(script)));
    }

    let command = refresh_command(ctx.config, ctx.environment);
    info!("Refreshing Ansible inventory: {}", command);
    ctx.runner
        .run(&command)
        .await
        .map_err(PipelineError::ScriptExecution)?;

    info!("Ansible inventory refreshed");
    Ok(())
}
