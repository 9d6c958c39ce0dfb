//! External process execution

pub mod command;
pub mod error;
pub mod subprocess;

use async_trait::async_trait;
use std::sync::Arc;

pub use command::CommandSpec;
pub use error::ProcessError;
pub use subprocess::SubprocessRunner;

/// Trait for process execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion; success means exit status zero
    async fn run(&self, command: &CommandSpec) -> Result<(), ProcessError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(&self, command: &CommandSpec) -> Result<(), ProcessError> {
        (**self).run(command).await
    }
}
