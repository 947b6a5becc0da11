//! Named, ordered tasks that wire install steps to the orchestrator.
pub mod artifact;
pub mod components;
mod context;
pub mod dotfiles;
pub mod go_tools;
pub mod keys;

pub use context::Context;

use crate::error::{InstallError, TaskError};
use crate::logging::TaskStatus;

/// Outcome of a task that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task made its changes.
    Ok,
    /// Task had nothing to do.
    Skipped(String),
}

/// A named, executable task.
///
/// Tasks take no arguments beyond the shared [`Context`]; everything they
/// touch is derived from [`Context::config`].
pub trait Task {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails; the run stops there.
    fn run(&self, ctx: &Context) -> Result<TaskResult, InstallError>;
}

/// The complete, ordered set of tasks run by the install command.
///
/// Later tasks rely on earlier ones: the Go tools need the Go toolchain, the
/// dotfiles are stowed into the fish configuration.
#[must_use]
pub fn all_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(artifact::InstallArtifact::new("Install Go", components::go)),
        Box::new(artifact::InstallArtifact::new("Install fish", components::fish)),
        Box::new(keys::InstallKeys),
        Box::new(dotfiles::InstallDotfiles),
        Box::new(artifact::InstallArtifact::new(
            "Install App Engine SDK",
            components::appengine,
        )),
        Box::new(artifact::InstallArtifact::new("Install Redis", components::redis)),
        Box::new(artifact::InstallArtifact::new(
            "Install ZooKeeper",
            components::zookeeper,
        )),
        Box::new(artifact::InstallArtifact::new("Install Kafka", components::kafka)),
        Box::new(artifact::InstallArtifact::new(
            "Install Cassandra",
            components::cassandra,
        )),
        Box::new(artifact::InstallArtifact::new(
            "Install Elasticsearch",
            components::elasticsearch,
        )),
        Box::new(go_tools::InstallGoTools),
        Box::new(artifact::InstallArtifact::new(
            "Install HAProxy",
            components::haproxy,
        )),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Returns the task's error after logging and recording it.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<(), InstallError> {
    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&e.to_string()));
            Err(e)
        }
    }
}

/// Run `tasks` strictly in order, stopping at the first failure.
///
/// Tasks after the failing one are recorded as not run and never executed.
/// Nothing already done is rolled back.
///
/// # Errors
///
/// Returns [`TaskError::Failed`] naming the first task that failed.
pub fn run_all<'a, I>(tasks: I, ctx: &Context) -> Result<(), TaskError>
where
    I: IntoIterator<Item = &'a dyn Task>,
{
    let mut tasks = tasks.into_iter();
    while let Some(task) = tasks.next() {
        if let Err(source) = execute(task, ctx) {
            for remaining in tasks.by_ref() {
                ctx.log
                    .record_task(remaining.name(), TaskStatus::NotRun, None);
            }
            return Err(TaskError::Failed {
                task: task.name().to_string(),
                source,
            });
        }
    }
    Ok(())
}
