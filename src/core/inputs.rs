//! Pipeline inputs and secrets, read once at pipeline start

use crate::core::error::ConfigError;
use crate::core::secret::Secret;
use crate::provider::ValueProvider;
use serde::Serialize;

pub const INPUT_DOMAIN: &str = "domain";
pub const INPUT_SSH_HOST_IP: &str = "ssh_host_ip";
pub const INPUT_SSH_HOST_NAME: &str = "ssh_host_name";
pub const INPUT_SSH_HOST_DOMAIN: &str = "ssh_host_domain";
pub const INPUT_REGISTRY: &str = "registry";

pub const SECRET_SSH_USER: &str = "SSH_USER";
pub const SECRET_SSH_PRIVATE_KEY: &str = "SSH_PRIVATE_KEY";
pub const SECRET_SUDO_PASSWORD: &str = "SUDO_PASSWORD";
pub const SECRET_ANSIBLE_VAULT_PASSWORD: &str = "ANSIBLE_VAULT_PASSWORD";

/// Names of every secret the pipeline reads
pub const SECRET_NAMES: [&str; 4] = [
    SECRET_SSH_USER,
    SECRET_SSH_PRIVATE_KEY,
    SECRET_SUDO_PASSWORD,
    SECRET_ANSIBLE_VAULT_PASSWORD,
];

/// Non-secret inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineInputs {
    pub domain: String,
    pub ssh_host_ip: String,
    pub ssh_host_name: String,
    /// Defaults to `{ssh_host_name}.{domain}`
    pub ssh_host_domain: String,
    /// Defaults to empty
    pub registry: String,
}

impl PipelineInputs {
    pub fn load(provider: &dyn ValueProvider) -> Result<Self, ConfigError> {
        let domain = required_input(provider, INPUT_DOMAIN)?;
        let ssh_host_ip = required_input(provider, INPUT_SSH_HOST_IP)?;
        let ssh_host_name = required_input(provider, INPUT_SSH_HOST_NAME)?;
        let ssh_host_domain = optional_input(provider, INPUT_SSH_HOST_DOMAIN)
            .unwrap_or_else(|| default_host_domain(&ssh_host_name, &domain));
        let registry = optional_input(provider, INPUT_REGISTRY).unwrap_or_default();

        Ok(Self {
            domain,
            ssh_host_ip,
            ssh_host_name,
            ssh_host_domain,
            registry,
        })
    }
}

/// Fully-qualified host name used when `ssh_host_domain` is not supplied
pub fn default_host_domain(host_name: &str, domain: &str) -> String {
    format!("{}.{}", host_name, domain)
}

/// Secret inputs; never logged
#[derive(Debug, Clone)]
pub struct PipelineSecrets {
    pub ssh_user: Secret,
    pub ssh_private_key: Secret,
    pub ansible_vault_password: Secret,
    /// Defaults to empty
    pub sudo_password: Secret,
}

impl PipelineSecrets {
    pub fn load(provider: &dyn ValueProvider) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            provider
                .secret(name)
                .filter(|v| !v.is_empty())
                .map(Secret::new)
                .ok_or(ConfigError::MissingSecret(name))
        };

        Ok(Self {
            ssh_user: required(SECRET_SSH_USER)?,
            ssh_private_key: required(SECRET_SSH_PRIVATE_KEY)?,
            ansible_vault_password: required(SECRET_ANSIBLE_VAULT_PASSWORD)?,
            sudo_password: Secret::new(provider.secret(SECRET_SUDO_PASSWORD).unwrap_or_default()),
        })
    }
}

fn optional_input(provider: &dyn ValueProvider, name: &str) -> Option<String> {
    provider.input(name).filter(|v| !v.is_empty())
}

fn required_input(provider: &dyn ValueProvider, name: &'static str) -> Result<String, ConfigError> {
    optional_input(provider, name).ok_or(ConfigError::MissingInput(name))
}
