//! Pipeline controller - runs the stages in order and stops at the first failure

use crate::{
    core::{DeployConfig, ExecutionStatus, PipelineError, PipelineRun, RunState, Stage},
    process::CommandRunner,
    provider::ValueProvider,
    stages::{self, deploy, inventory, toolchain, StageContext},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    PipelineStarted {
        execution_id: Uuid,
    },
    StageStarted {
        stage: Stage,
    },
    StageCompleted {
        stage: Stage,
    },
    StageFailed {
        stage: Stage,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Main pipeline controller
///
/// Owns the runner and configuration; the provider is passed per run so the
/// same controller can be pointed at different input sources.
pub struct PipelineController<R> {
    runner: R,
    config: DeployConfig,
    event_handlers: Vec<EventHandler>,
}

impl<R: CommandRunner> PipelineController<R> {
    pub fn new(runner: R, config: DeployConfig) -> Self {
        Self {
            runner,
            config,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.add_event_handler(handler);
        self
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn emit_event(&self, event: PipelineEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Execute the whole pipeline
    ///
    /// `Init -> EnvReady -> ToolchainReady -> InventoryReady -> Deployed`.
    /// The first failing stage moves `run` to `Failed` and its error is
    /// returned; no later stage runs. A `run` that was already used is
    /// replaced with a fresh one.
    pub async fn execute(
        &self,
        provider: &dyn ValueProvider,
        run: &mut PipelineRun,
    ) -> Result<(), PipelineError> {
        if run.state != RunState::Init {
            warn!("Pipeline run {} was already used, starting a new one", run.execution_id);
            *run = PipelineRun::new();
        }
        let execution_id = run.execution_id;
        info!("Starting deployment pipeline ({})", execution_id);
        run.start();
        self.emit_event(PipelineEvent::PipelineStarted { execution_id });

        // Init -> EnvReady
        self.begin(run, Stage::Environment);
        let result = stages::materialize(provider, &self.config).await;
        let materialized = self.settle(run, Stage::Environment, result)?;
        let ctx = StageContext::new(&self.runner, &self.config, &materialized.environment);

        // EnvReady -> ToolchainReady
        self.begin(run, Stage::Toolchain);
        let os_release = toolchain::read_os_release(&self.config.os_release_path).await;
        let result = toolchain::install(&ctx, &os_release).await;
        self.settle(run, Stage::Toolchain, result)?;

        // ToolchainReady -> InventoryReady
        self.begin(run, Stage::Inventory);
        let result = inventory::refresh(&ctx).await;
        self.settle(run, Stage::Inventory, result)?;

        // InventoryReady -> Deployed
        self.begin(run, Stage::Deployment);
        let result = deploy::run(&ctx, &materialized.handoff).await;
        self.settle(run, Stage::Deployment, result)?;

        info!("Deployment pipeline finished ({})", execution_id);
        self.emit_event(PipelineEvent::PipelineCompleted {
            execution_id,
            status: run.status,
        });
        Ok(())
    }

    fn begin(&self, run: &mut PipelineRun, stage: Stage) {
        if !run.begin_stage(stage) {
            warn!("Stage {} started out of order (state {:?})", stage, run.state);
        }
        info!("Stage {} started", stage);
        self.emit_event(PipelineEvent::StageStarted { stage });
    }

    /// Record the outcome of a stage; on error, finish the run as failed
    fn settle<T>(
        &self,
        run: &mut PipelineRun,
        stage: Stage,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        match result {
            Ok(value) => {
                run.complete_stage(stage);
                info!("Stage {} completed", stage);
                self.emit_event(PipelineEvent::StageCompleted { stage });
                Ok(value)
            }
            Err(err) => {
                let message = err.to_string();
                error!("Stage {} failed: {}", stage, message);
                run.fail_stage(stage, &message);
                self.emit_event(PipelineEvent::StageFailed {
                    stage,
                    error: message,
                });
                self.emit_event(PipelineEvent::PipelineCompleted {
                    execution_id: run.execution_id,
                    status: run.status,
                });
                Err(err)
            }
        }
    }
}
