//! Pipeline execution

pub mod engine;
pub mod plan;

pub use engine::{EventHandler, PipelineController, PipelineEvent};
pub use plan::{PipelinePlan, PlannedCommand, PlannedStage};
