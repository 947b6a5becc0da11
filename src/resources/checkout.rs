//! Git checkout resource for fixed-source repositories.
use std::path::PathBuf;

use git2::build::RepoBuilder;

use super::{ResourceChange, ResourceState};
use crate::error::InstallError;

/// A repository cloned once into a fixed path.
///
/// The checkout is never updated after the first clone; an existing path is
/// treated as installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// Repository URL (`file://`, `https://`, ...).
    pub url: String,
    /// Working tree location.
    pub path: PathBuf,
}

impl Checkout {
    /// Create a checkout resource.
    #[must_use]
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }

    /// Whether the working tree exists.
    #[must_use]
    pub fn current_state(&self) -> ResourceState {
        if self.path.exists() {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }

    /// Clone the repository unless the working tree already exists.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Clone`] if the clone fails.
    pub fn apply(&self) -> Result<ResourceChange, InstallError> {
        if self.current_state() == ResourceState::Correct {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        tracing::debug!("cloning {} into {}", self.url, self.path.display());
        RepoBuilder::new()
            .clone(&self.url, &self.path)
            .map_err(|source| InstallError::Clone {
                url: self.url.clone(),
                source,
            })?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Create a repository with one commit containing `file`.
    fn seed_repo(dir: &std::path::Path, file: &str) {
        let repo = git2::Repository::init(dir).unwrap();
        std::fs::write(dir.join(file), b"content\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(std::path::Path::new(file)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "seed", &tree, &[])
            .unwrap();
    }

    #[test]
    fn clones_missing_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin");
        std::fs::create_dir(&origin).unwrap();
        seed_repo(&origin, "bashrc");
        let target = dir.path().join("dotfiles");

        let checkout = Checkout::new(format!("file://{}", origin.display()), &target);
        assert_eq!(checkout.current_state(), ResourceState::Missing);

        assert_eq!(checkout.apply().unwrap(), ResourceChange::Applied);
        assert!(target.join("bashrc").is_file());
        assert_eq!(checkout.current_state(), ResourceState::Correct);
    }

    #[test]
    fn existing_checkout_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("dotfiles");
        std::fs::create_dir(&target).unwrap();

        let checkout = Checkout::new("file:///nonexistent/repo", &target);

        assert_eq!(checkout.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn missing_origin_is_clone_error() {
        let dir = tempfile::tempdir().unwrap();
        let checkout = Checkout::new(
            format!("file://{}", dir.path().join("absent").display()),
            dir.path().join("dotfiles"),
        );

        let err = checkout.apply().unwrap_err();

        assert!(matches!(err, InstallError::Clone { .. }), "got {err:?}");
    }
}
