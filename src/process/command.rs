//! Command specification - an argument vector plus its execution environment

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

const REDACTED: &str = "***";

/// A single external command, described as an explicit argument vector
///
/// Nothing here goes through a shell. Arguments equal to a value registered
/// with [`CommandSpec::sensitive`], and `key=value` arguments whose value is
/// one, are shown as `***` whenever the command is rendered for display or
/// logging.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    sensitive: Vec<String>,
}

impl CommandSpec {
    /// Create a command for the given program with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            sensitive: Vec::new(),
        }
    }

    /// Build a command from a full argv (program first)
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add environment variables for the child process
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Register a value that must never appear in rendered output
    ///
    /// Empty values are ignored.
    pub fn sensitive(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() && !self.sensitive.contains(&value) {
            self.sensitive.push(value);
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Program followed by its arguments, unredacted
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Check whether `window` appears as consecutive arguments
    pub fn has_args(&self, window: &[&str]) -> bool {
        !window.is_empty()
            && self
                .args
                .windows(window.len())
                .any(|w| w.iter().zip(window).all(|(a, b)| a == b))
    }

    /// Whole arguments, or the value side of `key=value`, matching a
    /// sensitive value render as `***`
    fn redact(&self, arg: &str) -> String {
        let hidden = |value: &str| self.sensitive.iter().any(|s| s == value);
        if hidden(arg) {
            return REDACTED.to_string();
        }
        match arg.split_once('=') {
            Some((key, value)) if hidden(value) => format!("{}={}", key, REDACTED),
            _ => arg.to_string(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.argv().iter().map(|a| self.redact(a)).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("command", &self.to_string())
            .field("working_dir", &self.working_dir)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .finish()
    }
}
