//! Installed-version probes.
use std::path::PathBuf;

use super::ResourceState;
use crate::exec::Executor;

/// How a version probe compares output against the expected string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Match {
    /// Trimmed output must equal the expected string.
    #[default]
    Exact,
    /// Trimmed output must start with the expected string.
    Prefix,
}

/// Run an installed binary's version flag and compare its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    /// Binary to invoke, usually an absolute path under the destination.
    pub program: PathBuf,
    /// Arguments selecting the version output.
    pub args: Vec<String>,
    /// Extra environment for the invocation.
    pub env: Vec<(String, String)>,
    /// Expected trimmed stdout+stderr.
    pub expected: String,
    /// Comparison mode.
    pub matching: Match,
}

impl VersionProbe {
    /// Exact-match probe with no extra environment.
    #[must_use]
    pub fn exact(program: impl Into<PathBuf>, args: &[&str], expected: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(ToString::to_string).collect(),
            env: Vec::new(),
            expected: expected.into(),
            matching: Match::Exact,
        }
    }

    /// Add an environment variable to the invocation.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Switch to prefix matching.
    #[must_use]
    pub const fn prefix(mut self) -> Self {
        self.matching = Match::Prefix;
        self
    }

    fn matches(&self, output: &str) -> bool {
        match self.matching {
            Match::Exact => output == self.expected,
            Match::Prefix => output.starts_with(&self.expected),
        }
    }
}

/// Decides whether a component is already installed.
///
/// Probes never modify anything, so they can be run any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Compare the output of a version invocation.
    Version(VersionProbe),
    /// The component is installed when this file exists.
    Marker {
        /// Versioned file shipped with the component.
        path: PathBuf,
    },
}

impl Probe {
    /// Inspect the live installation.
    ///
    /// A binary that cannot be started, exits non-zero or prints nothing is
    /// reported as [`ResourceState::Missing`] or
    /// [`ResourceState::Incorrect`], never as an error.
    #[must_use]
    pub fn check(&self, executor: &dyn Executor) -> ResourceState {
        match self {
            Self::Marker { path } => {
                if path.is_file() {
                    ResourceState::Correct
                } else {
                    ResourceState::Missing
                }
            }
            Self::Version(probe) => check_version(probe, executor),
        }
    }

    /// Short description for log messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Marker { path } => path.display().to_string(),
            Self::Version(probe) => {
                let mut line = probe.program.display().to_string();
                for arg in &probe.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            }
        }
    }
}

fn check_version(probe: &VersionProbe, executor: &dyn Executor) -> ResourceState {
    let program = probe.program.to_string_lossy();
    let args: Vec<&str> = probe.args.iter().map(String::as_str).collect();
    let env: Vec<(&str, &str)> = probe
        .env
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let result = match executor.execute(None, &program, &args, &env) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!("probe {program} not runnable: {e:#}");
            return ResourceState::Missing;
        }
    };

    let output = result.combined_output();
    if result.success && probe.matches(&output) {
        return ResourceState::Correct;
    }
    if output.is_empty() {
        return ResourceState::Missing;
    }
    ResourceState::Incorrect { current: output }
}
