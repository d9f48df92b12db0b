//! Command: reconcile symlinks on their own.
use anyhow::Result;

use crate::cli::ForceOpts;
use crate::config::manifest::Manifest;
use crate::tasks::{Context, symlinks};

/// Run the relink command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or the reconciliation
/// cannot record its state.
pub fn run(ctx: &Context, opts: &ForceOpts) -> Result<()> {
    let manifest = Manifest::read(&ctx.paths.bootstrap_file())?;
    ctx.log.stage("Relinking symlinks");
    let report = symlinks::reconcile(ctx, &manifest.symlinks, opts.force)?;
    ctx.log.info(&report.stats.summary());
    if !report.removed.is_empty() {
        ctx.log
            .info(&format!("{} stale link(s) removed", report.removed.len()));
    }
    Ok(())
}
