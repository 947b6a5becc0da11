//! Idempotent install primitives (probe + apply pattern).
pub mod archive;
pub mod artifact;
pub mod checkout;
pub mod fetch;
pub mod helpers;
pub mod hook;
pub mod location;
pub mod probe;

/// Installed state of a component, as reported by a probe.
///
/// # Examples
///
/// ```
/// use provision_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let stale = ResourceState::Incorrect { current: "go version go1.4.2".into() };
///
/// assert_ne!(missing, correct);
/// assert!(stale.needs_install());
/// assert!(!correct.needs_install());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Component is not installed, or its probe could not be run.
    Missing,
    /// Component is installed at the expected version.
    Correct,
    /// Component answered the probe with something other than the expected
    /// version.
    Incorrect {
        /// The probe output that was observed.
        current: String,
    },
}

impl ResourceState {
    /// Whether the component has to be (re)installed.
    #[must_use]
    pub const fn needs_install(&self) -> bool {
        !matches!(self, Self::Correct)
    }
}

/// Result of applying an install step.
///
/// # Examples
///
/// ```
/// use provision_cli::resources::ResourceChange;
///
/// assert_ne!(ResourceChange::Applied, ResourceChange::AlreadyCorrect);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceChange {
    /// The component was fetched, published and (if configured) built.
    Applied,
    /// The probe matched; nothing was touched.
    AlreadyCorrect,
}

/// Shared test helpers for resource unit tests.
///
/// Provides a configurable [`MockExecutor`] so individual resource test
/// modules do not have to duplicate the boilerplate.
#[cfg(test)]
pub mod test_helpers {
    use crate::exec::{ExecResult, Executor};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// A configurable mock executor for resource unit tests.
    ///
    /// Maintains a queue of `(success, stdout)` responses consumed in FIFO
    /// order.  When the queue is empty any call returns a spawn error, which
    /// is what a missing binary looks like to callers.
    ///
    /// Every call is recorded as `program arg1 arg2 ...` and can be inspected
    /// with [`calls`](Self::calls).
    #[derive(Debug)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        /// Return value for every [`Executor::which`] call.
        which_result: bool,
        call_count: Arc<AtomicUsize>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        /// Create a mock with a single successful response.
        #[must_use]
        pub fn ok(stdout: &str) -> Self {
            Self::with_responses(vec![(true, stdout.to_string())])
        }

        /// Create a mock with a single failed response (empty stdout).
        #[must_use]
        pub fn fail() -> Self {
            Self::with_responses(vec![(false, String::new())])
        }

        /// Create a mock whose every call fails to spawn.
        #[must_use]
        pub fn unavailable() -> Self {
            Self::with_responses(Vec::new())
        }

        /// Create a mock from an ordered list of `(success, stdout)` pairs.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                which_result: false,
                call_count: Arc::new(AtomicUsize::new(0)),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Set the value returned by every [`Executor::which`] call.
        #[must_use]
        pub fn with_which(mut self, result: bool) -> Self {
            self.which_result = result;
            self
        }

        /// Return the total number of executor calls made so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Command lines seen so far, in call order.
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default()
        }

        fn next(&self) -> Option<(bool, String)> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .ok()
                .and_then(|mut guard| guard.pop_front())
        }
    }

    impl Executor for MockExecutor {
        fn execute(
            &self,
            _: Option<&Path>,
            program: &str,
            args: &[&str],
            _: &[(&str, &str)],
        ) -> anyhow::Result<ExecResult> {
            if let Ok(mut calls) = self.calls.lock() {
                let mut line = program.to_string();
                for arg in args {
                    line.push(' ');
                    line.push_str(arg);
                }
                calls.push(line);
            }
            let Some((success, stdout)) = self.next() else {
                anyhow::bail!("failed to execute: {program}");
            };
            Ok(ExecResult {
                stdout,
                stderr: String::new(),
                success,
                code: Some(i32::from(!success)),
            })
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_correct_state_skips_install() {
        assert!(ResourceState::Missing.needs_install());
        assert!(
            ResourceState::Incorrect {
                current: "fish, version 2.1.0".to_string()
            }
            .needs_install()
        );
        assert!(!ResourceState::Correct.needs_install());
    }
}
