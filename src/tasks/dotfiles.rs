//! Dotfiles checkout linked into the home directory with GNU stow.
use crate::error::InstallError;
use crate::resources::checkout::Checkout;
use crate::resources::ResourceChange;

use super::{Context, Task, TaskResult};

/// Packages linked into the home directory.
const PACKAGES: [&str; 3] = ["fish", "git", "bash"];

/// Clone the dotfiles repository and link its packages with GNU stow.
///
/// An existing checkout is reused; stow runs every time.
#[derive(Debug, Clone, Copy)]
pub struct InstallDotfiles;

impl Task for InstallDotfiles {
    fn name(&self) -> &str {
        "Install dotfiles"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult, InstallError> {
        let config = &ctx.config;
        let checkout = Checkout::new(
            format!(
                "file://{}",
                config.repositories_dir.join("dotfiles").display()
            ),
            config.home.join("dotfiles"),
        );

        let command = format!("stow {}", PACKAGES.join(" "));
        if !ctx.executor.which("stow") {
            return Err(InstallError::Command {
                command,
                reason: "stow not found on PATH".to_string(),
            });
        }

        if checkout.apply()? == ResourceChange::Applied {
            ctx.log
                .info(&format!("cloned dotfiles into {}", checkout.path.display()));
        }

        let result = ctx
            .executor
            .execute(Some(&checkout.path), "stow", &PACKAGES, &[])
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

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::make_context;
    use std::path::Path;
    use std::sync::Arc;

    fn seed_repo(dir: &Path) {
        std::fs::create_dir_all(dir.join("fish")).unwrap();
        let repo = git2::Repository::init(dir).unwrap();
        std::fs::write(dir.join("fish/config.fish"), b"set -x EDITOR vim\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("fish/config.fish")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "seed", &tree, &[])
            .unwrap();
    }

    fn home_with_origin() -> tempfile::TempDir {
        let home = tempfile::tempdir().unwrap();
        seed_repo(&home.path().join("repositories/dotfiles"));
        home
    }

    #[test]
    fn clones_and_stows_packages() {
        let home = home_with_origin();
        let executor = Arc::new(MockExecutor::ok("").with_which(true));
        let ctx = make_context(home.path(), executor.clone());

        assert_eq!(InstallDotfiles.run(&ctx).unwrap(), TaskResult::Ok);

        assert!(home.path().join("dotfiles/fish/config.fish").is_file());
        assert_eq!(executor.calls(), ["stow fish git bash"]);
    }

    #[test]
    fn missing_stow_fails_before_cloning() {
        let home = home_with_origin();
        let ctx = make_context(
            home.path(),
            Arc::new(MockExecutor::unavailable().with_which(false)),
        );

        let err = InstallDotfiles.run(&ctx).unwrap_err();

        assert!(
            matches!(err, InstallError::Command { ref reason, .. } if reason.contains("not found")),
            "got {err:?}"
        );
        assert!(!home.path().join("dotfiles").exists());
    }

    #[test]
    fn stow_conflict_is_command_error() {
        let home = home_with_origin();
        let ctx = make_context(home.path(), Arc::new(MockExecutor::fail().with_which(true)));

        let err = InstallDotfiles.run(&ctx).unwrap_err();

        assert!(
            matches!(err, InstallError::Command { ref command, .. } if command == "stow fish git bash"),
            "got {err:?}"
        );
    }

    #[test]
    fn present_checkout_still_stows() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join("dotfiles")).unwrap();
        let executor = Arc::new(MockExecutor::ok("").with_which(true));
        let ctx = make_context(home.path(), executor.clone());

        assert_eq!(InstallDotfiles.run(&ctx).unwrap(), TaskResult::Ok);

        assert_eq!(executor.calls(), ["stow fish git bash"]);
    }

    #[test]
    fn rerun_after_stow_failure_links_packages() {
        let home = home_with_origin();
        let executor = Arc::new(
            MockExecutor::with_responses(vec![(false, String::new()), (true, String::new())])
                .with_which(true),
        );
        let ctx = make_context(home.path(), executor.clone());

        assert!(InstallDotfiles.run(&ctx).is_err());
        assert!(home.path().join("dotfiles/fish/config.fish").is_file());

        assert_eq!(InstallDotfiles.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(executor.calls(), ["stow fish git bash", "stow fish git bash"]);
    }
}
