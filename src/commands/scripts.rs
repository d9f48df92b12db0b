//! Command: run the before- and after-scripts.
use anyhow::Result;

use crate::config::manifest::Manifest;
use crate::tasks::{Context, scripts};

/// Run the run-scripts command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or a script fails.
pub fn run(ctx: &Context) -> Result<()> {
    let manifest = Manifest::read(&ctx.paths.bootstrap_file())?;
    ctx.log.stage("Running before-scripts");
    scripts::run_scripts(ctx, &manifest.before_scripts)?;
    ctx.log.stage("Running after-scripts");
    scripts::run_scripts(ctx, &manifest.after_scripts)
}
