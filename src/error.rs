//! Domain-specific error types for the provisioning engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Library modules return these typed errors while command handlers at the
//! CLI boundary convert them to [`anyhow::Error`] via the standard `?`
//! operator.
//!
//! # Error hierarchy
//!
//! ```text
//! TaskError::Failed                first failing task, reported by the orchestrator
//! └── InstallError                 one install step
//!     ├── Parse(ParseError)        malformed source descriptor
//!     ├── Fetch(FetchError)        source could not be opened or downloaded
//!     ├── Extract(ExtractError)    archive could not be unpacked
//!     └── Publish / Hook / …       staging, publishing and post-install hooks
//! ConfigError                      layout and config file resolution
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while turning a descriptor string into a [`Location`](crate::resources::location::Location).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The descriptor was empty or whitespace only.
    #[error("empty source descriptor")]
    Empty,

    /// The descriptor names a scheme the fetcher cannot handle.
    #[error("unsupported scheme '{scheme}' in '{descriptor}'")]
    UnsupportedScheme {
        /// Scheme as written in the descriptor.
        scheme: String,
        /// The full descriptor.
        descriptor: String,
    },

    /// A remote descriptor has nothing after `scheme://`.
    #[error("missing host in '{descriptor}'")]
    MissingHost {
        /// The full descriptor.
        descriptor: String,
    },
}

/// Errors produced while opening a content stream.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A local source does not exist.
    #[error("source not found: {}", path.display())]
    NotFound {
        /// Path that was opened.
        path: PathBuf,
    },

    /// A local source exists but could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Unreadable {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The request never produced an HTTP response (DNS, TLS, connection reset, …).
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Description of the transport failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    BadStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

/// Errors produced while unpacking an archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The naming hint does not end in a known archive suffix.
    #[error("unsupported archive format: '{hint}'")]
    UnsupportedFormat {
        /// The naming hint that failed to match.
        hint: String,
    },

    /// An entry would be written outside the destination directory.
    #[error("archive entry escapes destination: '{entry}'")]
    PathTraversal {
        /// Entry path as recorded in the archive.
        entry: String,
    },

    /// The container could not be decoded.
    #[error("invalid archive: {reason}")]
    InvalidArchive {
        /// Decoder error message.
        reason: String,
    },

    /// Reading the stream or writing an entry failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that fail a single install step.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The component's source descriptor is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The component's source could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched archive could not be extracted.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The scratch directory could not be created.
    #[error("cannot create scratch directory under {}: {source}", path.display())]
    Scratch {
        /// Scratch root.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The archive did not contain the expected top-level directory.
    #[error("archive did not produce {}", path.display())]
    MissingStagedRoot {
        /// Path the top-level directory was expected at.
        path: PathBuf,
    },

    /// The staged tree could not be renamed into place.
    #[error("cannot publish {} to {}: {source}", from.display(), to.display())]
    Publish {
        /// Staged tree.
        from: PathBuf,
        /// Final destination.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A post-install command failed or could not be started.
    #[error("post-install command `{command}` failed: {reason}")]
    Hook {
        /// Shell command line.
        command: String,
        /// Exit status and captured stderr, or the spawn error.
        reason: String,
    },

    /// A repository clone failed.
    #[error("cannot clone {url}: {source}")]
    Clone {
        /// Repository URL.
        url: String,
        /// Underlying git error.
        source: git2::Error,
    },

    /// An external command run by a step failed.
    #[error("`{command}` failed: {reason}")]
    Command {
        /// Command line.
        command: String,
        /// Exit status and captured stderr, or the spawn error.
        reason: String,
    },

    /// A filesystem operation performed by a step failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl InstallError {
    /// Build an [`InstallError::Io`] with a lazily formatted context.
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

/// Errors reported by the orchestrator.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A task failed; the run stopped there.
    #[error("task '{task}' failed: {source}")]
    Failed {
        /// Name of the task that failed.
        task: String,
        /// The step's error.
        source: InstallError,
    },
}

/// Errors that arise while building the provisioning layout.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither `--home` nor `$HOME` is available.
    #[error("cannot determine home directory: pass --home or set HOME")]
    HomeNotSet,

    /// Neither the config file nor `$USER`/`$LOGNAME` names the login user.
    #[error("cannot determine login user: set USER or `user` in the config file")]
    UserNotSet,

    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("invalid config file {}: {message}", path.display())]
    Parse {
        /// Path to the config file.
        path: PathBuf,
        /// Deserializer error message.
        message: String,
    },
}
