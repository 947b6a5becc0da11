//! Task adapter for archive-distributed components.
use crate::config::Config;
use crate::error::InstallError;
use crate::resources::ResourceChange;
use crate::resources::artifact::{ArtifactResource, ArtifactSpec};

use super::{Context, Task, TaskResult};

/// Install one component described by an [`ArtifactSpec`].
///
/// The component is resolved against the configuration at run time, so every
/// path comes from the context.
#[derive(Debug, Clone, Copy)]
pub struct InstallArtifact {
    name: &'static str,
    spec: fn(&Config) -> ArtifactSpec,
}

impl InstallArtifact {
    /// Create a task named `name` installing the component `spec` describes.
    #[must_use]
    pub const fn new(name: &'static str, spec: fn(&Config) -> ArtifactSpec) -> Self {
        Self { name, spec }
    }

    /// Resolve the component against `config`.
    #[must_use]
    pub fn spec(&self, config: &Config) -> ArtifactSpec {
        (self.spec)(config)
    }
}

impl Task for InstallArtifact {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult, InstallError> {
        let spec = self.spec(&ctx.config);
        let resource = ArtifactResource::new(
            &spec,
            &ctx.config.scratch_root,
            ctx.executor.as_ref(),
            ctx.fetcher.as_ref(),
        );
        match resource.apply()? {
            ResourceChange::AlreadyCorrect => {
                Ok(TaskResult::Skipped("already installed".to_string()))
            }
            ResourceChange::Applied => {
                ctx.log
                    .info(&format!("installed {}", spec.destination.display()));
                Ok(TaskResult::Ok)
            }
        }
    }
}
