//! Commands: set-icon, remove-icon, apply-icons.
use anyhow::Result;

use crate::cli::{AppOpts, SetIconOpts};
use crate::config::manifest::Manifest;
use crate::tasks::{Context, icons};

/// Run the set-icon command.
///
/// # Errors
///
/// Returns an error if the application is not installed or the icon
/// cannot be recorded or applied.
pub fn set(ctx: &Context, opts: &SetIconOpts) -> Result<()> {
    icons::set_icon(ctx, &opts.app, &opts.icon)
}

/// Run the remove-icon command.
///
/// # Errors
///
/// Returns an error if the application is not installed or the icon
/// cannot be forgotten or removed.
pub fn remove(ctx: &Context, opts: &AppOpts) -> Result<()> {
    icons::remove_icon(ctx, &opts.app)
}

/// Run the apply-icons command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or any icon could not
/// be applied.
pub fn apply(ctx: &Context) -> Result<()> {
    let manifest = Manifest::read(&ctx.paths.bootstrap_file())?;
    ctx.log.stage("Applying icons");
    let stats = icons::apply_icons(ctx, &manifest);
    ctx.log.info(&stats.summary());
    if stats.skipped > 0 {
        anyhow::bail!("{} icon(s) could not be applied", stats.skipped);
    }
    Ok(())
}
