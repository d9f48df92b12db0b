//! Domain-specific error types for the bootstrap engine.
//!
//! Internal layers (state store, manifest model, resources) return
//! [`CiderError`] directly; tasks and command handlers wrap it in
//! [`anyhow::Error`] with extra context.  The CLI boundary walks the error
//! chain back to the first [`CiderError`] to pick the process exit code.
//!
//! # Error kinds
//!
//! ```text
//! CiderError
//! ├── Storage / MalformedDocument / ManifestMissing   state files
//! ├── UnsupportedPlatform / ToolchainMissing /
//! │   PackageManagerMissing                           restore preflight
//! ├── SymlinkSourceMissing / SymlinkConflict          symlink reconciler
//! ├── ApplicationMissing                              icons
//! └── ScriptFailed                                    before/after scripts
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Exit code used by every error that does not declare its own.
pub const DEFAULT_EXIT_CODE: i32 = 1;

/// Typed error raised by the bootstrap engine.
#[derive(Error, Debug)]
pub enum CiderError {
    /// An I/O failure on a state file other than expected absence.
    #[error("cannot access {}: {source}", .path.display())]
    Storage {
        /// File the operation was acting on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A state file exists but its content is not a valid document.
    #[error("malformed JSON in {}: {message}", .path.display())]
    MalformedDocument {
        /// File that failed to parse or validate.
        path: PathBuf,
        /// Parser or shape-validation message.
        message: String,
    },

    /// The OS release is older than the minimum supported version.
    #[error("unsupported OS version {version}; please upgrade to 10.9 or later and try again")]
    UnsupportedPlatform {
        /// Detected OS version string.
        version: String,
    },

    /// The developer toolchain is not installed.
    #[error("Xcode not installed (install it from {url})")]
    ToolchainMissing {
        /// Where to get the toolchain.
        url: String,
    },

    /// The package manager binary is not on `PATH`.
    #[error("Homebrew not installed (see {url})")]
    PackageManagerMissing {
        /// Installation instructions.
        url: String,
    },

    /// The manifest was read before it was ever written.
    #[error("bootstrap file not found; expected at {}", .path.display())]
    ManifestMissing {
        /// Expected manifest location.
        path: PathBuf,
    },

    /// A symlink rule expanded to a source that no longer exists.
    #[error("symlink source \"{}\" does not exist", .path.display())]
    SymlinkSourceMissing {
        /// The missing source path.
        path: PathBuf,
    },

    /// A symlink destination is occupied by something else.
    #[error("symlink conflict at {}: {detail}", .target.display())]
    SymlinkConflict {
        /// The destination that could not be linked.
        target: PathBuf,
        /// What currently occupies the destination.
        detail: String,
    },

    /// An application named in the manifest cannot be located.
    #[error("application not found: '{app}'")]
    ApplicationMissing {
        /// Application name as written by the user.
        app: String,
    },

    /// A before/after script exited non-zero.
    #[error("script '{script}' exited with code {code}")]
    ScriptFailed {
        /// Script path as listed in the manifest.
        script: String,
        /// Exit code reported by the script.
        code: i32,
    },
}

impl CiderError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ScriptFailed { code, .. } if *code != 0 => *code,
            _ => DEFAULT_EXIT_CODE,
        }
    }

    /// Whether this is a storage error caused by a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Pick the exit code for an error surfaced at the CLI boundary.
///
/// Walks the `anyhow` context chain and uses the first [`CiderError`]
/// found; anything else exits with [`DEFAULT_EXIT_CODE`].
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CiderError>())
        .map_or(DEFAULT_EXIT_CODE, CiderError::exit_code)
}
