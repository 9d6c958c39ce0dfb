use anyhow::{Context, Result};
use deploy_pipeline::cli::commands::{PlanCommand, RunCommand};
use deploy_pipeline::cli::output::*;
use deploy_pipeline::cli::{Cli, Command};
use deploy_pipeline::core::inputs::SECRET_NAMES;
use deploy_pipeline::{
    DeployConfig, EnvProvider, PipelineController, PipelineError, PipelinePlan, PipelineRun,
    SubprocessRunner, ValueProvider,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let filter = EnvFilter::try_from_env("DEPLOY_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("deploy_pipeline=debug")
        } else {
            EnvFilter::new("deploy_pipeline=info")
        }
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, &cli).await?,
        Command::Plan(cmd) => show_plan(cmd, &cli)?,
    }

    Ok(())
}

fn load_config(cli: &Cli, extra_vars: &[(String, String)]) -> Result<DeployConfig> {
    let config = match &cli.config {
        Some(path) => DeployConfig::from_file(path)
            .with_context(|| format!("Failed to load deployment config {}", path))?,
        None => DeployConfig::default(),
    };
    config
        .with_extra_vars(extra_vars.iter().cloned())
        .context("Invalid --extra-var")
}

/// Report a failure on the CI failure channel and exit
///
/// With `json` set, stdout carries only the JSON document and every other
/// line goes to stderr, which the Actions runner also scans for commands.
fn fail(message: &str, json: bool) -> ! {
    if in_github_actions() {
        emit(&error_annotation(message), json);
    }
    emit(&format!("{} {}", CROSS, style(message).red()), json);
    std::process::exit(1);
}

/// Print a console line to stdout, or to stderr when stdout is reserved for JSON
fn emit(line: &str, json: bool) {
    if json {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

async fn run_pipeline(cmd: &RunCommand, cli: &Cli) -> Result<()> {
    let config = match load_config(cli, &cmd.extra_var) {
        Ok(config) => config,
        Err(e) => fail(&format!("Environment setup failed: {:#}", e), cmd.json),
    };
    let provider = EnvProvider::from_env();

    // Keep secrets out of the job log, including tool output
    if in_github_actions() {
        for name in SECRET_NAMES {
            if let Some(value) = provider.secret(name) {
                for mask in mask_annotations(&value) {
                    emit(&mask, cmd.json);
                }
            }
        }
    }

    let runner = SubprocessRunner::new()
        .with_timeout(config.command_timeout_secs)
        .with_stdout_to_stderr(cmd.json);
    let mut controller = PipelineController::new(runner, config);
    if !cmd.json {
        controller.add_event_handler(|event| println!("{}", format_pipeline_event(event)));
        println!();
    }

    let mut run = PipelineRun::new();
    let result = controller.execute(&provider, &mut run).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!("\n{}", format_run_summary(&run));
    }

    if let Err(e) = result {
        error!("{} ({})", e, e.kind());
        fail(&e.to_string(), cmd.json);
    }

    Ok(())
}

fn show_plan(cmd: &PlanCommand, cli: &Cli) -> Result<()> {
    let config = load_config(cli, &cmd.extra_var)?;
    let provider = EnvProvider::from_env();

    let plan = match PipelinePlan::build(&provider, &config) {
        Ok(plan) => plan,
        Err(e) => fail(&PipelineError::from(e).to_string(), cmd.json),
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", format_plan(&plan));
    }

    Ok(())
}
