//! `go get` for command-line tools built with the installed toolchain.
use crate::error::InstallError;

use super::{Context, Task, TaskResult};

const PACKAGES: [&str; 2] = ["github.com/mattn/goreman", "github.com/robfig/glock"];

/// Fetch and build Go command-line tools into `$GOPATH/bin`.
///
/// There is no cheap way to tell whether the tools are current, so this
/// step always runs; `go get` is itself a no-op for packages already built.
#[derive(Debug, Clone, Copy)]
pub struct InstallGoTools;

impl Task for InstallGoTools {
    fn name(&self) -> &str {
        "Install Go tools"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult, InstallError> {
        let config = &ctx.config;
        let goroot = config.goroot();
        let go = goroot.join("bin/go");
        let go = go.to_string_lossy();
        let goroot = goroot.to_string_lossy();
        let gopath = config.home.to_string_lossy();

        let mut args = vec!["get", "-v"];
        args.extend(PACKAGES);
        let command = format!("{go} {}", args.join(" "));
        ctx.log.debug(&format!("running {command}"));

        let result = ctx
            .executor
            .run_unchecked_with_env(
                &go,
                &args,
                &[("GOROOT", &*goroot), ("GOPATH", &*gopath)],
            )
            .map_err(|e| InstallError::Command {
                command: command.clone(),
                reason: format!("{e:#}"),
            })?;
        if !result.success {
            return Err(InstallError::Command {
                command,
                reason: result.failure_reason(),
            });
        }
        Ok(TaskResult::Ok)
    }
}
