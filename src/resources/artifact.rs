//! Archive-backed install step: probe, fetch, stage, publish, build.
use std::fs;
use std::path::{Path, PathBuf};

use super::archive;
use super::fetch::Fetcher;
use super::helpers::fs::{ensure_parent_dir, remove_tree_if_present};
use super::hook::PostInstallHook;
use super::location::parse_location;
use super::probe::Probe;
use super::{ResourceChange, ResourceState};
use crate::error::InstallError;
use crate::exec::Executor;

/// Everything needed to install one archive-distributed component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Short component name, used for the scratch directory prefix.
    pub name: String,
    /// Source descriptor (URL or local path).
    pub source: String,
    /// File name used only to pick the archive format.
    pub name_hint: String,
    /// Single top-level directory the archive unpacks to.
    pub root_dir: String,
    /// Final location of the component.
    pub destination: PathBuf,
    /// Installed-state check run before anything else.
    pub probe: Probe,
    /// Optional build/registration commands run in the destination.
    pub hook: Option<PostInstallHook>,
}

/// An [`ArtifactSpec`] bound to the collaborators that carry it out.
#[derive(Debug)]
pub struct ArtifactResource<'a> {
    spec: &'a ArtifactSpec,
    scratch_root: &'a Path,
    executor: &'a dyn Executor,
    fetcher: &'a dyn Fetcher,
}

impl<'a> ArtifactResource<'a> {
    /// Bind `spec` to a scratch root and collaborators.
    #[must_use]
    pub fn new(
        spec: &'a ArtifactSpec,
        scratch_root: &'a Path,
        executor: &'a dyn Executor,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            spec,
            scratch_root,
            executor,
            fetcher,
        }
    }

    /// Probe the live installation.
    #[must_use]
    pub fn current_state(&self) -> ResourceState {
        self.spec.probe.check(self.executor)
    }

    /// Install the component unless the probe says it is current.
    ///
    /// The archive is unpacked into a fresh scratch directory, its top-level
    /// directory is renamed over the destination, then the hook runs. Until
    /// the rename the old destination is untouched; the scratch directory is
    /// removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns the first failure of descriptor parsing, fetching, extraction,
    /// publishing or the hook.
    pub fn apply(&self) -> Result<ResourceChange, InstallError> {
        let spec = self.spec;
        match self.current_state() {
            ResourceState::Correct => {
                tracing::debug!("{}: already current ({})", spec.name, spec.probe.describe());
                return Ok(ResourceChange::AlreadyCorrect);
            }
            ResourceState::Incorrect { current } => {
                tracing::debug!("{}: found '{current}', reinstalling", spec.name);
            }
            ResourceState::Missing => {
                tracing::debug!("{}: not installed", spec.name);
            }
        }

        let location = parse_location(&spec.source)?;
        tracing::debug!("{}: fetching {location}", spec.name);
        let stream = self.fetcher.fetch(&location)?;

        fs::create_dir_all(self.scratch_root).map_err(|source| InstallError::Scratch {
            path: self.scratch_root.to_path_buf(),
            source,
        })?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", spec.name))
            .tempdir_in(self.scratch_root)
            .map_err(|source| InstallError::Scratch {
                path: self.scratch_root.to_path_buf(),
                source,
            })?;

        let summary = archive::extract(stream, &spec.name_hint, scratch.path())?;
        tracing::debug!("{}: unpacked {} entries", spec.name, summary.entries);
        publish(&scratch.path().join(&spec.root_dir), &spec.destination)?;
        drop(scratch);

        if let Some(hook) = &spec.hook {
            hook.run(&spec.destination, self.executor)?;
        }
        Ok(ResourceChange::Applied)
    }
}

/// Replace `destination` with the `staged` tree using a single rename.
///
/// The previous destination is removed first on a best-effort basis; a
/// leftover blocks the rename and surfaces as [`InstallError::Publish`].
///
/// # Errors
///
/// Returns [`InstallError::MissingStagedRoot`] if `staged` is not a
/// directory and [`InstallError::Publish`] if the rename fails.
pub fn publish(staged: &Path, destination: &Path) -> Result<(), InstallError> {
    if !staged.is_dir() {
        return Err(InstallError::MissingStagedRoot {
            path: staged.to_path_buf(),
        });
    }
    ensure_parent_dir(destination).map_err(InstallError::io(format!(
        "create parent of {}",
        destination.display()
    )))?;
    if let Err(e) = remove_tree_if_present(destination) {
        tracing::warn!("cannot remove {}: {e}", destination.display());
    }
    fs::rename(staged, destination).map_err(|source| InstallError::Publish {
        from: staged.to_path_buf(),
        to: destination.to_path_buf(),
        source,
    })?;
    tracing::debug!("published {}", destination.display());
    Ok(())
}
