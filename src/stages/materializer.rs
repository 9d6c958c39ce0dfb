//! Environment materializer - inputs, secrets, environment state, vault file

use crate::core::{
    ConfigError, DeployConfig, EnvironmentState, PipelineError, PipelineInputs, PipelineSecrets,
    Secret,
};
use crate::provider::ValueProvider;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Values the deployment stage needs from this stage
#[derive(Debug, Clone)]
pub struct DeployHandoff {
    pub domain: String,
    pub sudo_password: Secret,
}

/// Everything the environment stage produces
#[derive(Debug, Clone)]
pub struct Materialized {
    pub handoff: DeployHandoff,
    pub environment: EnvironmentState,
    pub inputs: PipelineInputs,
    pub vault_password_file: PathBuf,
}

/// Inputs and secrets, validated, with nothing written yet
#[derive(Debug, Clone)]
pub struct Resolved {
    pub inputs: PipelineInputs,
    pub secrets: PipelineSecrets,
    pub environment: EnvironmentState,
    pub vault_password_file: PathBuf,
}

/// Read and validate every input and secret without side effects
///
/// The configuration itself is validated first, so a config assembled in
/// code gets the same checks as one loaded from YAML.
pub fn resolve(provider: &dyn ValueProvider, config: &DeployConfig) -> Result<Resolved, ConfigError> {
    config.validate()?;
    let inputs = PipelineInputs::load(provider)?;
    let secrets = PipelineSecrets::load(provider)?;
    let vault_password_file = config.vault_password_path()?;
    let environment = EnvironmentState::new(&inputs, &secrets);

    Ok(Resolved {
        inputs,
        secrets,
        environment,
        vault_password_file,
    })
}

/// Run the environment stage
///
/// All values are validated before the vault file is touched, so a missing
/// input or secret leaves no trace on disk.
pub async fn materialize(
    provider: &dyn ValueProvider,
    config: &DeployConfig,
) -> Result<Materialized, PipelineError> {
    let resolved = resolve(provider, config)?;
    debug!("Environment: {:?}", resolved.environment);

    write_credential_file(
        &resolved.vault_password_file,
        &resolved.secrets.ansible_vault_password,
        config.vault_file_mode,
    )
    .await?;

    info!(
        "Environment variables and vault password file {} are ready",
        resolved.vault_password_file.display()
    );

    Ok(Materialized {
        handoff: DeployHandoff {
            domain: resolved.inputs.domain.clone(),
            sudo_password: resolved.secrets.sudo_password.clone(),
        },
        environment: resolved.environment,
        inputs: resolved.inputs,
        vault_password_file: resolved.vault_password_file,
    })
}

/// Write the vault secret verbatim and apply `mode`
pub async fn write_credential_file(
    path: &Path,
    secret: &Secret,
    mode: u32,
) -> Result<(), ConfigError> {
    let wrap = |source| ConfigError::CredentialFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(wrap)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        options.mode(mode);
    }

    let mut file = options.open(path).await.map_err(wrap)?;
    file.write_all(secret.expose().as_bytes()).await.map_err(wrap)?;
    file.flush().await.map_err(wrap)?;

    // An existing file keeps its old mode on open
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(wrap)?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}
