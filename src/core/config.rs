//! Deployment configuration from YAML
//!
//! Every path and command shape the pipeline uses lives here with a default,
//! so a config file only needs to name what differs.

use crate::core::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKING_DIR: &str = "ansible";
pub const DEFAULT_INVENTORY_PATH: &str = "hosts/inventory";
pub const DEFAULT_PLAYBOOK_PATH: &str = "playbooks/deploy-docker-keycloak.yml";
pub const DEFAULT_INVENTORY_SCRIPT: &str = "scripts/ansible_playbook_hosts_setup.sh";
pub const DEFAULT_SCRIPT_INTERPRETER: &str = "bash";
pub const DEFAULT_ANSIBLE_PLAYBOOK: &str = "ansible-playbook";
pub const DEFAULT_OS_RELEASE_PATH: &str = "/etc/os-release";
pub const VAULT_PASSWORD_FILE_NAME: &str = ".vault_password";
pub const DEFAULT_VAULT_FILE_MODE: u32 = 0o640;

/// Extra-var keys the deployment runner always sets itself
pub const RESERVED_EXTRA_VARS: [&str; 2] = ["ansible_become_pass", "domain"];

/// One toolchain installation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStep {
    /// Step name used in logs and error messages
    pub name: String,

    /// Full argv, program first
    pub command: Vec<String>,
}

impl InstallStep {
    pub fn new(name: &str, command: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Top-level deployment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Directory the inventory script and playbook run in
    pub working_dir: PathBuf,

    /// Inventory file, relative to `working_dir`
    pub inventory_path: String,

    /// Playbook file, relative to `working_dir`
    pub playbook_path: String,

    /// Inventory refresh script, relative to `working_dir`
    pub inventory_script: String,

    /// Interpreter the inventory script is run with
    pub script_interpreter: String,

    /// The ansible-playbook executable
    pub ansible_playbook: String,

    /// Vault password file; defaults to `~/.vault_password`
    pub vault_password_file: Option<PathBuf>,

    /// Permission bits for the vault password file
    #[serde(
        deserialize_with = "deserialize_mode",
        serialize_with = "serialize_mode"
    )]
    pub vault_file_mode: u32,

    /// File holding the OS identification text
    pub os_release_path: PathBuf,

    /// Markers in the OS identification text that mean "supported"
    pub supported_distributions: Vec<String>,

    /// Toolchain installation steps, run in order
    pub install_steps: Vec<InstallStep>,

    /// Per-command timeout in seconds (none by default)
    pub command_timeout_secs: Option<u64>,

    /// Additional `-e key=value` pairs for the playbook run
    pub extra_vars: BTreeMap<String, String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            inventory_path: DEFAULT_INVENTORY_PATH.to_string(),
            playbook_path: DEFAULT_PLAYBOOK_PATH.to_string(),
            inventory_script: DEFAULT_INVENTORY_SCRIPT.to_string(),
            script_interpreter: DEFAULT_SCRIPT_INTERPRETER.to_string(),
            ansible_playbook: DEFAULT_ANSIBLE_PLAYBOOK.to_string(),
            vault_password_file: None,
            vault_file_mode: DEFAULT_VAULT_FILE_MODE,
            os_release_path: PathBuf::from(DEFAULT_OS_RELEASE_PATH),
            supported_distributions: vec!["Ubuntu".to_string(), "Debian".to_string()],
            install_steps: default_install_steps(),
            command_timeout_secs: None,
            extra_vars: BTreeMap::new(),
        }
    }
}

/// The stock Debian-family toolchain: apt index, pip + jq, Ansible, vault plugin
pub fn default_install_steps() -> Vec<InstallStep> {
    vec![
        InstallStep::new("apt-update", &["sudo", "apt-get", "update"]),
        InstallStep::new(
            "apt-install",
            &["sudo", "apt-get", "install", "-y", "python3-pip", "jq"],
        ),
        InstallStep::new(
            "pip-install",
            &["pip3", "install", "ansible", "jinja2", "hvac"],
        ),
        InstallStep::new(
            "galaxy-collection",
            &[
                "ansible-galaxy",
                "collection",
                "install",
                "community.hashi_vault",
            ],
        ),
    ]
}

impl DeployConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: DeployConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply extra-var overrides (e.g. from the command line)
    pub fn with_extra_vars<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.extra_vars.extend(vars);
        self.validate()?;
        Ok(self)
    }

    /// Resolve the vault password file location
    pub fn vault_password_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.vault_password_file {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(VAULT_PASSWORD_FILE_NAME))
                .ok_or(ConfigError::HomeDirUnavailable),
        }
    }

    /// Inventory script path as seen from the orchestrator's own directory
    pub fn inventory_script_path(&self) -> PathBuf {
        self.working_dir.join(&self.inventory_script)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        for (field, value) in [
            ("inventory_path", self.inventory_path.as_str()),
            ("playbook_path", self.playbook_path.as_str()),
            ("inventory_script", self.inventory_script.as_str()),
            ("script_interpreter", self.script_interpreter.as_str()),
            ("ansible_playbook", self.ansible_playbook.as_str()),
        ] {
            if value.trim().is_empty() {
                return invalid(format!("`{}` must not be empty", field));
            }
        }
        if self.working_dir.as_os_str().is_empty() {
            return invalid("`working_dir` must not be empty".to_string());
        }

        if self.vault_file_mode > 0o777 {
            return invalid(format!(
                "vault_file_mode {:o} has bits outside 0777",
                self.vault_file_mode
            ));
        }
        if self.vault_file_mode & 0o400 == 0 {
            return invalid("vault password file must be readable by its owner".to_string());
        }
        if self.vault_file_mode & 0o111 != 0 {
            return invalid("vault password file must not be executable".to_string());
        }
        if self.vault_file_mode & 0o002 != 0 {
            return invalid("vault password file must not be world-writable".to_string());
        }

        if self.supported_distributions.iter().all(|d| d.trim().is_empty()) {
            return invalid("`supported_distributions` must name at least one distribution".to_string());
        }

        let mut seen = HashSet::new();
        for step in &self.install_steps {
            if !seen.insert(&step.name) {
                return invalid(format!("duplicate install step: {}", step.name));
            }
            if step.command.first().map_or(true, |p| p.trim().is_empty()) {
                return invalid(format!("install step '{}' has no command", step.name));
            }
        }

        for key in self.extra_vars.keys() {
            if RESERVED_EXTRA_VARS.contains(&key.as_str()) {
                return invalid(format!("extra var '{}' is set by the pipeline itself", key));
            }
            if key.is_empty() || key.contains('=') || key.contains(char::is_whitespace) {
                return invalid(format!("invalid extra var name '{}'", key));
            }
        }

        if self.command_timeout_secs == Some(0) {
            return invalid("`command_timeout_secs` must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Int(u32),
    Str(String),
}

/// Accepts `416`, `"0640"` or `"0o640"`; strings are octal
fn deserialize_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match ModeRepr::deserialize(deserializer)? {
        ModeRepr::Int(mode) => Ok(mode),
        ModeRepr::Str(s) => {
            let digits = s.trim().trim_start_matches("0o");
            u32::from_str_radix(digits, 8)
                .map_err(|e| serde::de::Error::custom(format!("invalid octal mode '{}': {}", s, e)))
        }
    }
}

fn serialize_mode<S: Serializer>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:04o}", mode))
}
