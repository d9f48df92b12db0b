//! Package manager binding.
use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::config::manifest::PackageKind;
use crate::exec::{ExecResult, Executor};

/// Outcome of a single package-manager action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// The action changed the system.
    Applied,
    /// The system already matched; nothing was done.
    AlreadySatisfied,
    /// The package manager ran and reported failure.
    Failed {
        /// What the package manager said.
        detail: String,
    },
}

/// The package-manager contract the engine drives.
///
/// Every method returns `Err` only when the package manager could not be
/// run at all; a run that reports failure is [`PackageOutcome::Failed`].
pub trait PackageManager: Send + Sync + std::fmt::Debug {
    /// Install `name` as a package of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be spawned.
    fn install(&self, kind: PackageKind, name: &str, force: bool) -> Result<PackageOutcome>;

    /// Uninstall `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be spawned.
    fn remove(&self, kind: PackageKind, name: &str) -> Result<PackageOutcome>;

    /// Add a repository tap.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be spawned.
    fn tap(&self, name: &str) -> Result<PackageOutcome>;

    /// Remove a repository tap.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be spawned.
    fn untap(&self, name: &str) -> Result<PackageOutcome>;

    /// Names of every installed package of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be produced.
    fn list(&self, kind: PackageKind) -> Result<BTreeSet<String>>;

    /// Installed packages that depend on `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be run.
    fn dependents(&self, kind: PackageKind, name: &str) -> Result<BTreeSet<String>>;
}

/// [`PackageManager`] backed by the `brew` command.
#[derive(Debug, Clone)]
pub struct Brew {
    executor: Arc<dyn Executor>,
}

impl Brew {
    /// Create a binding that runs `brew` through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Taps currently configured, lowercased as `brew` prints them.
    fn tapped(&self) -> Result<BTreeSet<String>> {
        let result = self
            .executor
            .run("brew", &["tap"])
            .context("listing taps")?;
        Ok(lines(&result.stdout.to_ascii_lowercase()))
    }

    fn brew(&self, args: &[&str]) -> Result<ExecResult> {
        self.executor
            .run_unchecked("brew", args)
            .with_context(|| format!("running brew {}", args.join(" ")))
    }
}

/// Interpret a finished `brew` run.
fn outcome(result: &ExecResult, already_marker: &str) -> PackageOutcome {
    if !result.success {
        let detail = result.stderr.trim();
        return PackageOutcome::Failed {
            detail: if detail.is_empty() {
                format!("exit {}", result.code.unwrap_or(-1))
            } else {
                detail.to_string()
            },
        };
    }
    let said = |text: &str| text.to_ascii_lowercase().contains(already_marker);
    if said(&result.stderr) || said(&result.stdout) {
        PackageOutcome::AlreadySatisfied
    } else {
        PackageOutcome::Applied
    }
}

fn kind_flag(kind: PackageKind) -> &'static str {
    match kind {
        PackageKind::Formula => "--formula",
        PackageKind::Cask => "--cask",
    }
}

fn lines(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

impl PackageManager for Brew {
    fn install(&self, kind: PackageKind, name: &str, force: bool) -> Result<PackageOutcome> {
        let mut args = vec!["install", kind_flag(kind)];
        if force {
            args.push("--force");
        }
        args.push(name);
        Ok(outcome(&self.brew(&args)?, "already installed"))
    }

    fn remove(&self, kind: PackageKind, name: &str) -> Result<PackageOutcome> {
        Ok(outcome(
            &self.brew(&["uninstall", kind_flag(kind), name])?,
            "is not installed",
        ))
    }

    // `brew tap` is silent for a tap that already exists, so membership is
    // read from the tap list first.
    fn tap(&self, name: &str) -> Result<PackageOutcome> {
        if self.tapped()?.contains(&name.to_ascii_lowercase()) {
            return Ok(PackageOutcome::AlreadySatisfied);
        }
        Ok(outcome(&self.brew(&["tap", name])?, "already tapped"))
    }

    fn untap(&self, name: &str) -> Result<PackageOutcome> {
        if !self.tapped()?.contains(&name.to_ascii_lowercase()) {
            return Ok(PackageOutcome::AlreadySatisfied);
        }
        Ok(outcome(&self.brew(&["untap", name])?, "not tapped"))
    }

    fn list(&self, kind: PackageKind) -> Result<BTreeSet<String>> {
        let result = self
            .executor
            .run("brew", &["list", "-1", kind_flag(kind)])
            .context("listing installed packages")?;
        Ok(lines(&result.stdout))
    }

    fn dependents(&self, kind: PackageKind, name: &str) -> Result<BTreeSet<String>> {
        let mut args = vec!["uses", "--installed"];
        if kind == PackageKind::Cask {
            args.push("--cask");
        }
        args.push(name);
        let result = self
            .executor
            .run("brew", &args)
            .with_context(|| format!("querying dependents of {name}"))?;
        Ok(lines(&result.stdout))
    }
}
