//! Development host provisioning engine.
//!
//! Installs a fixed, ordered set of pinned components into a home directory:
//! each one is probed, and only when the probe disagrees is it fetched,
//! unpacked into scratch space, published into place and built by its
//! post-install commands.
//!
//! The public API is organised into four layers:
//!
//! - **[`resources`]**: source locations, fetching, archive extraction, probes
//!   and the artifact pipeline built from them
//! - **[`tasks`]**: named, ordered units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration (`install`)
//! - **[`config`]**: the filesystem layout every step reads its paths from
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod resources;
pub mod tasks;
