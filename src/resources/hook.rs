//! Post-install build and registration commands.
use std::path::Path;

use crate::error::InstallError;
use crate::exec::Executor;

/// Shell commands run in a freshly published destination.
///
/// Each command is passed to `bash -c` with the destination as working
/// directory; the first non-zero exit stops the hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInstallHook {
    /// Command lines, run in order.
    pub commands: Vec<String>,
    /// Extra environment for every command.
    pub env: Vec<(String, String)>,
}

impl PostInstallHook {
    /// Hook running `commands` with no extra environment.
    #[must_use]
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable to every command.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run every command in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Hook`] for the first command that cannot be
    /// started or exits non-zero.
    pub fn run(&self, dir: &Path, executor: &dyn Executor) -> Result<(), InstallError> {
        let env: Vec<(&str, &str)> = self
            .env
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        for command in &self.commands {
            tracing::debug!("hook in {}: {command}", dir.display());
            let result = executor
                .execute(Some(dir), "bash", &["-c", command.as_str()], &env)
                .map_err(|e| InstallError::Hook {
                    command: command.clone(),
                    reason: format!("{e:#}"),
                })?;
            if !result.success {
                return Err(InstallError::Hook {
                    command: command.clone(),
                    reason: result.failure_reason(),
                });
            }
            let output = result.combined_output();
            if !output.is_empty() {
                tracing::debug!("{output}");
            }
        }
        Ok(())
    }
}

/// Quote `value` for safe interpolation into a `bash -c` command line.
///
/// # Examples
///
/// ```
/// use provision_cli::resources::hook::shell_quote;
///
/// assert_eq!(shell_quote("/home/dev/bin"), "/home/dev/bin");
/// assert_eq!(shell_quote("/home/my dev"), "'/home/my dev'");
/// assert_eq!(shell_quote("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '=' | ':' | ','));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
