//! CLI output formatting and CI failure reporting

use crate::{
    core::{ExecutionStatus, PipelineRun, StageRecord, StageStatus},
    execution::{PipelinePlan, PipelineEvent},
};
use console::Emoji;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Whether we are running as a GitHub Actions step
pub fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Escape a workflow-command message (`%`, CR and LF)
fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// `::error::` workflow command for the CI failure channel
pub fn error_annotation(message: &str) -> String {
    format!("::error::{}", escape_workflow_data(message))
}

/// `::add-mask::` workflow commands, one per non-empty line of the secret
pub fn mask_annotations(secret: &str) -> Vec<String> {
    secret
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("::add-mask::{}", escape_workflow_data(line)))
        .collect()
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a pipeline event for display
pub fn format_pipeline_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::PipelineStarted { execution_id } => format!(
            "{} Starting deployment pipeline ({})",
            ROCKET,
            style(&execution_id.to_string()[..8]).dim()
        ),
        PipelineEvent::StageStarted { stage } => {
            format!("{} {}", SPINNER, style(stage).cyan())
        }
        PipelineEvent::StageCompleted { stage } => {
            format!("{} {}", CHECK, style(stage).green())
        }
        PipelineEvent::StageFailed { stage, error } => {
            format!("{} {}: {}", CROSS, style(stage).red(), style(error).dim())
        }
        PipelineEvent::PipelineCompleted {
            execution_id,
            status,
        } => {
            let status_str = match status {
                ExecutionStatus::Completed => {
                    format!("{} completed", style("successfully").green())
                }
                ExecutionStatus::Failed => style("failed").red().to_string(),
                _ => format!("{:?}", status),
            };
            format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(&execution_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

fn format_stage_record(record: &StageRecord) -> String {
    let (icon, label) = match record.status {
        StageStatus::Completed => (CHECK, style("completed").green().to_string()),
        StageStatus::Failed => (CROSS, style("failed").red().to_string()),
        StageStatus::NotRun => (SKIP, style("not run").dim().to_string()),
        StageStatus::Running => (SPINNER, style("running").yellow().to_string()),
        StageStatus::Pending => (INFO, style("pending").dim().to_string()),
    };
    let duration = record
        .duration()
        .map(|d| format!(" ({})", format_duration(d)))
        .unwrap_or_default();
    format!("{}{:<12} {}{}", icon, record.stage.name(), label, duration)
}

/// Per-stage summary of a finished run
pub fn format_run_summary(run: &PipelineRun) -> String {
    let mut lines = vec![format!(
        "{} Run {} - {} ({}/{} stages)",
        INFO,
        style(&run.execution_id.to_string()[..8]).dim(),
        format_status(run.status),
        run.completed_stages(),
        run.stages.len()
    )];
    lines.extend(run.stages.iter().map(|r| format!("  {}", format_stage_record(r))));
    if let Some(duration) = run.duration() {
        lines.push(format!("  Total: {}", style(format_duration(duration)).dim()));
    }
    lines.join("\n")
}

/// Human-readable plan
pub fn format_plan(plan: &PipelinePlan) -> String {
    let mut lines = vec![format!("{} Environment", INFO)];
    for (key, value) in &plan.environment {
        lines.push(format!("  {}={}", style(key).cyan(), value));
    }
    lines.push(format!(
        "  vault password file: {} (mode {})",
        plan.vault_password_file.display(),
        plan.vault_file_mode
    ));
    lines.push(format!(
        "  supported platforms: {}",
        plan.supported_distributions.join(", ")
    ));

    for planned in &plan.stages {
        if planned.commands.is_empty() {
            continue;
        }
        lines.push(format!("{} {}", ROCKET, style(planned.stage).bold()));
        for command in &planned.commands {
            let label = command
                .label
                .as_ref()
                .map(|l| format!("[{}] ", style(l).dim()))
                .unwrap_or_default();
            let dir = command
                .working_dir
                .as_ref()
                .map(|d| format!("  (in {})", d.display()))
                .unwrap_or_default();
            lines.push(format!("  {}{}{}", label, command.command, dir));
        }
    }
    lines.join("\n")
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
