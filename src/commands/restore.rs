//! Command: apply the whole manifest.
use anyhow::Result;

use crate::config::manifest::Manifest;
use crate::logging::Logger;
use crate::platform::Preflight;
use crate::tasks::{self, Context};

/// Run the restore command and print the phase summary.
///
/// # Errors
///
/// Returns the first preflight failure, a missing or malformed manifest,
/// or the error of the phase that aborted the run.
pub fn run(ctx: &Context, log: &Logger) -> Result<()> {
    log.info(&format!("cider {}", crate::VERSION));
    let preflight = Preflight::detect(ctx.executor.as_ref());
    let result = restore(ctx, &preflight);
    log.print_summary();
    result
}

/// Check `preflight`, then run every restore phase in order against the
/// manifest.
///
/// A phase that reports per-item failures does not stop the run; a phase
/// that returns an error does.
///
/// # Errors
///
/// Returns the first preflight failure, a missing or malformed manifest,
/// or the error of the phase that aborted the run.
pub fn restore(ctx: &Context, preflight: &Preflight) -> Result<()> {
    ctx.log.stage("Checking prerequisites");
    preflight.check(ctx.executor.as_ref())?;
    ctx.log.debug(&format!(
        "os {}",
        preflight.os_version.as_deref().unwrap_or("unknown")
    ));

    let manifest = Manifest::read(&ctx.paths.bootstrap_file())?;
    tasks::execute_all(&tasks::restore_tasks(), ctx, &manifest)
}
