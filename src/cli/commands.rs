//! CLI command definitions

use clap::Args;

/// Run the deployment pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Extra playbook variables (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub extra_var: Vec<(String, String)>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Show the pipeline plan
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Extra playbook variables (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub extra_var: Vec<(String, String)>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
