//! Environment state - the variables handed to every downstream process

use crate::core::inputs::{PipelineInputs, PipelineSecrets};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroizing;

pub const ENV_DOMAIN: &str = "DOMAIN";
pub const ENV_REGISTRY: &str = "REGISTRY";
pub const ENV_SSH_USER: &str = "SSH_USER";
pub const ENV_SUDO_PASSWORD: &str = "SUDO_PASSWORD";
pub const ENV_SSH_PRIVATE_KEY: &str = "SSH_PRIVATE_KEY";
pub const ENV_SSH_HOST_IP: &str = "SSH_HOST_IP";
pub const ENV_SSH_HOST_DOMAIN: &str = "SSH_HOST_DOMAIN";

/// Credentials; the login name is not one
const SENSITIVE: [&str; 2] = [ENV_SUDO_PASSWORD, ENV_SSH_PRIVATE_KEY];

/// Variables exported to the toolchain, inventory and deployment processes
///
/// Built once by the environment stage and read-only afterwards. Nothing here
/// touches the orchestrator's own process environment.
#[derive(Clone, Default)]
pub struct EnvironmentState {
    vars: BTreeMap<&'static str, Zeroizing<String>>,
}

impl EnvironmentState {
    pub fn new(inputs: &PipelineInputs, secrets: &PipelineSecrets) -> Self {
        let entries = [
            (ENV_DOMAIN, inputs.domain.as_str()),
            (ENV_REGISTRY, inputs.registry.as_str()),
            (ENV_SSH_USER, secrets.ssh_user.expose()),
            (ENV_SUDO_PASSWORD, secrets.sudo_password.expose()),
            (ENV_SSH_PRIVATE_KEY, secrets.ssh_private_key.expose()),
            (ENV_SSH_HOST_IP, inputs.ssh_host_ip.as_str()),
            (ENV_SSH_HOST_DOMAIN, inputs.ssh_host_domain.as_str()),
        ];

        Self {
            vars: entries
                .into_iter()
                .map(|(k, v)| (k, Zeroizing::new(v.to_string())))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn is_sensitive(key: &str) -> bool {
        SENSITIVE.contains(&key)
    }

    /// Non-empty values that must be redacted from any rendered output
    pub fn sensitive_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter()
            .filter(|(k, v)| Self::is_sensitive(k) && !v.is_empty())
            .map(|(_, v)| v)
    }

    /// Key/value view with sensitive values replaced by `***`
    pub fn redacted(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(k, v)| {
                let shown = if Self::is_sensitive(k) && !v.is_empty() {
                    "***".to_string()
                } else {
                    v.to_string()
                };
                (k.to_string(), shown)
            })
            .collect()
    }
}

impl fmt::Debug for EnvironmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.redacted()).finish()
    }
}
