//! Declarative macOS environment bootstrap engine.
//!
//! A single manifest (`bootstrap.json`) describes the desired state of a
//! machine: packages, taps, symlinked dotfiles, preference settings,
//! application icons and setup scripts.  `cider restore` reconciles the
//! live system toward it, and is safe to re-run.
//!
//! The public API is organised into layers:
//!
//! - **[`store`]**: atomic read/transform/write of the JSON state files
//! - **[`config`]**: file layout and typed views of the manifest and preferences
//! - **[`resources`]**: idempotent symlinks plus bindings to brew, defaults, fileicon and the trash
//! - **[`tasks`]**: restore phases and the single-item operations behind each command
//! - **[`commands`]**: top-level subcommand handlers
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod store;
pub mod tasks;

/// Version string shown in the version command and log headers.
pub const VERSION: &str = match option_env!("CIDER_VERSION") {
    Some(version) => version,
    None => concat!("dev-", env!("CARGO_PKG_VERSION")),
};
