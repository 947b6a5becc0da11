//! Collaborators handed to every task.
use std::sync::Arc;

use crate::config::Config;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Log;
use crate::resources::fetch::{Fetcher, HttpFetcher};

/// Shared context for task execution.
pub struct Context {
    /// Filesystem layout and login user, resolved once at startup.
    pub config: Arc<Config>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Source fetcher (for testing or real downloads).
    pub fetcher: Arc<dyn Fetcher>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("fetcher", &self.fetcher)
            .finish()
    }
}

impl Context {
    /// Creates a context that runs real commands and real downloads.
    #[must_use]
    pub fn new(config: Config, log: Arc<dyn Log>) -> Self {
        Self {
            config: Arc::new(config),
            log,
            executor: Arc::new(SystemExecutor),
            fetcher: Arc::new(HttpFetcher::default()),
        }
    }

    /// Create a copy of this context with a different logger.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            log,
            executor: Arc::clone(&self.executor),
            fetcher: Arc::clone(&self.fetcher),
        }
    }

    /// Create a copy of this context with a different [`Executor`].
    #[must_use]
    pub fn with_executor(&self, executor: Arc<dyn Executor>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            log: Arc::clone(&self.log),
            executor,
            fetcher: Arc::clone(&self.fetcher),
        }
    }

    /// Create a copy of this context with a different [`Fetcher`].
    #[must_use]
    pub fn with_fetcher(&self, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            log: Arc::clone(&self.log),
            executor: Arc::clone(&self.executor),
            fetcher,
        }
    }
}
