//! Password store checkout plus ssh and gpg key installation.
use std::path::Path;

use crate::error::InstallError;
use crate::resources::checkout::Checkout;
use crate::resources::helpers::fs::copy_dir_recursive;
use crate::resources::ResourceChange;

use super::{Context, Task, TaskResult};

const SSH_KEYS: [&str; 2] = ["id_rsa", "id_rsa.pub"];

/// Clone the password store and copy ssh and gpg keys into the home
/// directory.
///
/// The store is cloned once; the keys are copied on every run so that a
/// run interrupted after the clone is completed by the next one.
#[derive(Debug, Clone, Copy)]
pub struct InstallKeys;

impl InstallKeys {
    fn password_store(ctx: &Context) -> Checkout {
        let config = &ctx.config;
        Checkout::new(
            format!(
                "file://{}",
                config.repositories_dir.join("password-store").display()
            ),
            config.home.join(".password-store"),
        )
    }
}

impl Task for InstallKeys {
    fn name(&self) -> &str {
        "Install keys"
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult, InstallError> {
        let store = Self::password_store(ctx);
        if store.apply()? == ResourceChange::Applied {
            ctx.log
                .info(&format!("cloned password store into {}", store.path.display()));
        }

        let config = &ctx.config;
        let ssh_dir = config.home.join(".ssh");
        std::fs::create_dir_all(&ssh_dir)
            .map_err(InstallError::io(format!("create {}", ssh_dir.display())))?;
        for key in SSH_KEYS {
            let src = config.keys_dir.join(key);
            let dst = ssh_dir.join(key);
            copy_private(&src, &dst)
                .map_err(InstallError::io(format!("copy {}", src.display())))?;
            ctx.log.debug(&format!("installed {}", dst.display()));
        }

        let gpg_src = config.keys_dir.join("gpg");
        let gpg_dst = config.home.join(".gnupg");
        copy_dir_recursive(&gpg_src, &gpg_dst)
            .map_err(InstallError::io(format!("copy {}", gpg_src.display())))?;
        ctx.log.debug(&format!("installed {}", gpg_dst.display()));

        Ok(TaskResult::Ok)
    }
}

/// Copy a key readable only by its owner.
#[cfg(unix)]
fn copy_private(src: &Path, dst: &Path) -> std::io::Result<()> {
    crate::resources::helpers::fs::copy_with_mode(src, dst, 0o600)
}

#[cfg(not(unix))]
fn copy_private(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::copy(src, dst).map(|_| ())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::make_context;
    use std::sync::Arc;

    fn seed_repo(dir: &Path) {
        let repo = git2::Repository::init(dir).unwrap();
        std::fs::write(dir.join(".gpg-id"), b"dev@example.com\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(".gpg-id")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "seed", &tree, &[])
            .unwrap();
    }

    fn seed_keys(home: &Path) {
        let keys = home.join("keys");
        std::fs::create_dir_all(keys.join("gpg/private-keys-v1.d")).unwrap();
        std::fs::write(keys.join("id_rsa"), b"private").unwrap();
        std::fs::write(keys.join("id_rsa.pub"), b"public").unwrap();
        std::fs::write(keys.join("gpg/pubring.kbx"), b"ring").unwrap();
        std::fs::write(keys.join("gpg/private-keys-v1.d/key"), b"secret").unwrap();
    }

    #[test]
    fn installs_store_and_keys() {
        let home = tempfile::tempdir().unwrap();
        let origin = home.path().join("repositories/password-store");
        std::fs::create_dir_all(&origin).unwrap();
        seed_repo(&origin);
        seed_keys(home.path());
        let ctx = make_context(home.path(), Arc::new(MockExecutor::unavailable()));

        assert_eq!(InstallKeys.run(&ctx).unwrap(), TaskResult::Ok);

        assert!(home.path().join(".password-store/.gpg-id").is_file());
        assert_eq!(
            std::fs::read(home.path().join(".ssh/id_rsa")).unwrap(),
            b"private"
        );
        assert!(home.path().join(".ssh/id_rsa.pub").is_file());
        assert!(
            home.path()
                .join(".gnupg/private-keys-v1.d/key")
                .is_file()
        );
    }

    #[cfg(unix)]
    #[test]
    fn ssh_keys_are_owner_only() {
        use std::os::unix::fs::PermissionsExt as _;
        let home = tempfile::tempdir().unwrap();
        let origin = home.path().join("repositories/password-store");
        std::fs::create_dir_all(&origin).unwrap();
        seed_repo(&origin);
        seed_keys(home.path());
        let ctx = make_context(home.path(), Arc::new(MockExecutor::unavailable()));

        InstallKeys.run(&ctx).unwrap();

        for key in SSH_KEYS {
            let mode = std::fs::metadata(home.path().join(".ssh").join(key))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600, "{key}");
        }
    }

    #[test]
    fn present_store_is_kept_and_keys_refreshed() {
        let home = tempfile::tempdir().unwrap();
        let store = home.path().join(".password-store");
        std::fs::create_dir(&store).unwrap();
        std::fs::write(store.join("local"), b"mine").unwrap();
        seed_keys(home.path());
        let ctx = make_context(home.path(), Arc::new(MockExecutor::unavailable()));

        assert_eq!(InstallKeys.run(&ctx).unwrap(), TaskResult::Ok);

        assert_eq!(std::fs::read(store.join("local")).unwrap(), b"mine");
        assert!(home.path().join(".ssh/id_rsa").is_file());
        assert!(home.path().join(".gnupg/pubring.kbx").is_file());
    }

    #[test]
    fn rerun_after_missing_key_completes_install() {
        let home = tempfile::tempdir().unwrap();
        let origin = home.path().join("repositories/password-store");
        std::fs::create_dir_all(&origin).unwrap();
        seed_repo(&origin);
        let ctx = make_context(home.path(), Arc::new(MockExecutor::unavailable()));

        assert!(InstallKeys.run(&ctx).is_err());
        assert!(home.path().join(".password-store/.gpg-id").is_file());
        assert!(!home.path().join(".ssh/id_rsa").exists());

        seed_keys(home.path());
        assert_eq!(InstallKeys.run(&ctx).unwrap(), TaskResult::Ok);

        assert_eq!(
            std::fs::read(home.path().join(".ssh/id_rsa")).unwrap(),
            b"private"
        );
        assert!(
            home.path()
                .join(".gnupg/private-keys-v1.d/key")
                .is_file()
        );
    }

    #[test]
    fn missing_key_is_io_error() {
        let home = tempfile::tempdir().unwrap();
        let origin = home.path().join("repositories/password-store");
        std::fs::create_dir_all(&origin).unwrap();
        seed_repo(&origin);
        let ctx = make_context(home.path(), Arc::new(MockExecutor::unavailable()));

        let err = InstallKeys.run(&ctx).unwrap_err();

        assert!(
            matches!(err, InstallError::Io { ref context, .. } if context.ends_with("id_rsa")),
            "got {err:?}"
        );
    }

    #[test]
    fn missing_repository_is_clone_error() {
        let home = tempfile::tempdir().unwrap();
        let ctx = make_context(home.path(), Arc::new(MockExecutor::unavailable()));
        let err = InstallKeys.run(&ctx).unwrap_err();
        assert!(matches!(err, InstallError::Clone { .. }), "got {err:?}");
    }
}
