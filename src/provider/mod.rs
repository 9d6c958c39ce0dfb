//! Input and secret providers - where the invoking platform hands us values

use std::collections::HashMap;

/// Trait for reading named inputs and secrets from the invoking platform
pub trait ValueProvider: Send + Sync {
    /// Look up a named input (e.g. `ssh_host_ip`)
    fn input(&self, name: &str) -> Option<String>;

    /// Look up a named secret (e.g. `SSH_USER`)
    fn secret(&self, name: &str) -> Option<String>;
}

/// Reads values from environment variables
///
/// Inputs follow the CI step convention `INPUT_<NAME>` (upper-cased, spaces
/// replaced by underscores) and are trimmed. Secrets are read from the
/// variable of the same name and returned verbatim.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    vars: HashMap<String, String>,
}

impl EnvProvider {
    /// Snapshot the current process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Environment variable name carrying an input
    pub fn input_var(name: &str) -> String {
        format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
    }
}

impl ValueProvider for EnvProvider {
    fn input(&self, name: &str) -> Option<String> {
        self.vars
            .get(&Self::input_var(name))
            .map(|v| v.trim().to_string())
    }

    fn secret(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// In-memory provider, handy for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    inputs: HashMap<String, String>,
    secrets: HashMap<String, String>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: &str, value: &str) -> Self {
        self.inputs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_secret(mut self, name: &str, value: &str) -> Self {
        self.secrets.insert(name.to_string(), value.to_string());
        self
    }

    pub fn without_secret(mut self, name: &str) -> Self {
        self.secrets.remove(name);
        self
    }

    pub fn without_input(mut self, name: &str) -> Self {
        self.inputs.remove(name);
        self
    }
}

impl ValueProvider for StaticProvider {
    fn input(&self, name: &str) -> Option<String> {
        self.inputs.get(name).cloned()
    }

    fn secret(&self, name: &str) -> Option<String> {
        self.secrets.get(name).cloned()
    }
}
