//! Restore preflight: OS version, developer toolchain, package manager.
use std::path::{Path, PathBuf};

use crate::error::CiderError;
use crate::exec::Executor;

/// Oldest supported OS release as `(major, minor)`.
pub const MINIMUM_OS_VERSION: (u32, u32) = (10, 9);

/// Where the developer toolchain is expected to be installed.
pub const TOOLCHAIN_PATH: &str = "/Applications/Xcode.app";

/// Where to get the developer toolchain.
pub const TOOLCHAIN_URL: &str = "https://itunes.apple.com/us/app/xcode/id497799835?mt=12";

/// Where to get the package manager.
pub const PACKAGE_MANAGER_URL: &str = "http://brew.sh/#install";

/// Facts about the host that restore depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preflight {
    /// OS product version, e.g. `"14.4.1"`; `None` when it cannot be read.
    pub os_version: Option<String>,
    /// Path whose existence proves the toolchain is installed.
    pub toolchain: PathBuf,
}

impl Preflight {
    /// Probe the running system.
    #[must_use]
    pub fn detect(executor: &dyn Executor) -> Self {
        let os_version = executor
            .run("sw_vers", &["-productVersion"])
            .ok()
            .map(|r| r.stdout.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            os_version,
            toolchain: PathBuf::from(TOOLCHAIN_PATH),
        }
    }

    /// Run the checks in order; the first failure is returned and later
    /// checks are not attempted.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::UnsupportedPlatform`],
    /// [`CiderError::ToolchainMissing`] or
    /// [`CiderError::PackageManagerMissing`].
    pub fn check(&self, executor: &dyn Executor) -> Result<(), CiderError> {
        let version = self.os_version.as_deref().unwrap_or("unknown");
        if !is_supported(version) {
            return Err(CiderError::UnsupportedPlatform {
                version: version.to_string(),
            });
        }
        if !toolchain_installed(&self.toolchain) {
            return Err(CiderError::ToolchainMissing {
                url: TOOLCHAIN_URL.to_string(),
            });
        }
        if !executor.which("brew") {
            return Err(CiderError::PackageManagerMissing {
                url: PACKAGE_MANAGER_URL.to_string(),
            });
        }
        Ok(())
    }
}

fn toolchain_installed(path: &Path) -> bool {
    path.is_dir()
}

/// Whether `version` (`major.minor[.patch]`) meets [`MINIMUM_OS_VERSION`].
#[must_use]
pub fn is_supported(version: &str) -> bool {
    let mut parts = version.trim().split('.').map(str::parse::<u32>);
    let (Some(Ok(major)), minor) = (parts.next(), parts.next()) else {
        return false;
    };
    let minor = match minor {
        None => 0,
        Some(Ok(minor)) => minor,
        Some(Err(_)) => return false,
    };
    (major, minor) >= MINIMUM_OS_VERSION
}
