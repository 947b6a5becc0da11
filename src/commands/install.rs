//! The `install` command: resolve the layout and run every step.
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context, Task};

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the layout cannot be resolved or any task fails. The
/// run stops at the first failing task.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("provision {version}"));

    log.stage("Resolving layout");
    let config = Config::load(global.home.as_deref(), global.config.as_deref())?;
    log.info(&format!("home: {}", config.home.display()));
    log.debug(&format!("dist: {}", config.dist_dir.display()));
    log.debug(&format!("bin: {}", config.bin_dir.display()));
    log.debug(&format!("scratch: {}", config.scratch_root.display()));
    log.debug(&format!("user: {}", config.user));

    std::fs::create_dir_all(&config.dist_dir)
        .with_context(|| format!("creating {}", config.dist_dir.display()))?;

    let ctx = Context::new(config, Arc::clone(log) as Arc<dyn Log>);
    let all_tasks = tasks::all_install_tasks();
    run_tasks(all_tasks.iter().map(AsRef::as_ref), &ctx, log)
}

/// Run `tasks` to the first failure and print the summary either way.
///
/// # Errors
///
/// Returns the first task failure.
pub fn run_tasks<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
) -> Result<()> {
    let result = tasks::run_all(tasks, ctx);
    log.print_summary();
    Ok(result?)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{InstallError, TaskError};
    use crate::logging::TaskStatus;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::TaskResult;
    use crate::tasks::test_helpers::make_context;

    struct Fixed(&'static str, bool);

    impl Task for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn run(&self, _: &Context) -> Result<TaskResult, InstallError> {
            if self.1 {
                Ok(TaskResult::Ok)
            } else {
                Err(InstallError::Command {
                    command: self.0.to_string(),
                    reason: "exit 1".to_string(),
                })
            }
        }
    }

    #[test]
    fn failure_is_returned_after_summary() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Logger::new("test"));
        let ctx = make_context(dir.path(), Arc::new(MockExecutor::unavailable()))
            .with_log(Arc::clone(&log) as Arc<dyn Log>);
        let tasks = [Fixed("one", true), Fixed("two", false), Fixed("three", true)];

        let err = run_tasks(tasks.iter().map(|t| t as &dyn Task), &ctx, &log).unwrap_err();

        let task_err = err.downcast_ref::<TaskError>().unwrap();
        assert!(matches!(task_err, TaskError::Failed { task, .. } if task == "two"));
        let statuses: Vec<_> = log.task_entries().into_iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            [TaskStatus::Ok, TaskStatus::Failed, TaskStatus::NotRun]
        );
    }

    #[test]
    fn all_ok_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Logger::new("test"));
        let ctx = make_context(dir.path(), Arc::new(MockExecutor::unavailable()))
            .with_log(Arc::clone(&log) as Arc<dyn Log>);
        let tasks = [Fixed("one", true)];

        run_tasks(tasks.iter().map(|t| t as &dyn Task), &ctx, &log).unwrap();

        assert!(!log.has_failures());
    }
}
