//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The four pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Load inputs/secrets, build the environment, write the vault file
    Environment,
    /// Detect the platform and install Ansible
    Toolchain,
    /// Regenerate the host inventory
    Inventory,
    /// Run the playbook
    Deployment,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Environment,
        Stage::Toolchain,
        Stage::Inventory,
        Stage::Deployment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Environment => "environment",
            Stage::Toolchain => "toolchain",
            Stage::Inventory => "inventory",
            Stage::Deployment => "deployment",
        }
    }

    /// State reached once this stage completes
    pub fn completes_to(&self) -> RunState {
        match self {
            Stage::Environment => RunState::EnvReady,
            Stage::Toolchain => RunState::ToolchainReady,
            Stage::Inventory => RunState::InventoryReady,
            Stage::Deployment => RunState::Deployed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Controller state machine
///
/// `Init -> EnvReady -> ToolchainReady -> InventoryReady -> Deployed`, with
/// `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Init,
    EnvReady,
    ToolchainReady,
    InventoryReady,
    Deployed,
    Failed { stage: Stage },
}

impl RunState {
    /// The stage that moves this state forward, if any
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            RunState::Init => Some(Stage::Environment),
            RunState::EnvReady => Some(Stage::Toolchain),
            RunState::ToolchainReady => Some(Stage::Inventory),
            RunState::InventoryReady => Some(Stage::Deployment),
            RunState::Deployed | RunState::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_stage().is_none()
    }
}

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Pipeline completed successfully
    Completed,
    /// Pipeline failed
    Failed,
}

/// Status of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Never started because an earlier stage failed
    NotRun,
}

/// Record of one stage within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl StageRecord {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Wall-clock time spent in the stage, once finished
    pub fn duration(&self) -> Option<std::time::Duration> {
        let (start, end) = (self.started_at?, self.completed_at?);
        end.signed_duration_since(start).to_std().ok()
    }
}

/// State of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// Position in the stage state machine
    pub state: RunState,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// One record per stage, in order
    pub stages: Vec<StageRecord>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            state: RunState::Init,
            started_at: None,
            completed_at: None,
            stages: Stage::ALL.iter().copied().map(StageRecord::new).collect(),
        }
    }

    /// Mark pipeline as started
    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    fn record_mut(&mut self, stage: Stage) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|r| r.stage == stage)
    }

    /// Mark a stage as running
    ///
    /// Returns `false`, leaving the run untouched, if `stage` is not the one
    /// the current state leads to.
    pub fn begin_stage(&mut self, stage: Stage) -> bool {
        if self.state.next_stage() != Some(stage) {
            return false;
        }
        if let Some(record) = self.record_mut(stage) {
            record.status = StageStatus::Running;
            record.started_at = Some(Utc::now());
        }
        true
    }

    /// Complete the running stage and advance the state machine
    ///
    /// Out-of-order completions are rejected the same way as in
    /// [`PipelineRun::begin_stage`].
    pub fn complete_stage(&mut self, stage: Stage) -> bool {
        if self.state.next_stage() != Some(stage) {
            return false;
        }
        if let Some(record) = self.record_mut(stage) {
            record.status = StageStatus::Completed;
            record.completed_at = Some(Utc::now());
        }
        self.state = stage.completes_to();
        if self.state == RunState::Deployed {
            self.status = ExecutionStatus::Completed;
            self.completed_at = Some(Utc::now());
        }
        true
    }

    /// Fail the running stage; every later stage is marked as not run
    pub fn fail_stage(&mut self, stage: Stage, error: &str) {
        if let Some(record) = self.record_mut(stage) {
            record.status = StageStatus::Failed;
            record.completed_at = Some(Utc::now());
            record.error = Some(error.to_string());
        }
        for record in &mut self.stages {
            if record.status == StageStatus::Pending {
                record.status = StageStatus::NotRun;
            }
        }
        self.state = RunState::Failed { stage };
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    pub fn completed_stages(&self) -> usize {
        self.stages
            .iter()
            .filter(|r| r.status == StageStatus::Completed)
            .count()
    }

    /// Total run duration, once finished
    pub fn duration(&self) -> Option<std::time::Duration> {
        let (start, end) = (self.started_at?, self.completed_at?);
        end.signed_duration_since(start).to_std().ok()
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
