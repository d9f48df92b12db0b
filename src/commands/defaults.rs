//! Commands: set-default, remove-default, apply-defaults.
use anyhow::Result;

use crate::cli::{DefaultKeyOpts, SetDefaultOpts};
use crate::tasks::{Context, defaults};

/// Run the set-default command.
///
/// # Errors
///
/// Returns an error if the preference cannot be written or recorded.
pub fn set(ctx: &Context, opts: &SetDefaultOpts) -> Result<()> {
    defaults::set_default(ctx, &opts.domain, &opts.key, &opts.value, opts.force)
}

/// Run the remove-default command.
///
/// # Errors
///
/// Returns an error if the preference cannot be deleted or forgotten.
pub fn remove(ctx: &Context, opts: &DefaultKeyOpts) -> Result<()> {
    defaults::remove_default(ctx, &opts.domain, &opts.key)
}

/// Run the apply-defaults command.
///
/// # Errors
///
/// Returns an error if the preferences document cannot be read or any
/// preference was rejected.
pub fn apply(ctx: &Context) -> Result<()> {
    ctx.log.stage("Applying defaults");
    let stats = defaults::apply_defaults(ctx)?;
    ctx.log.info(&stats.summary());
    if stats.skipped > 0 {
        anyhow::bail!("{} preference(s) could not be written", stats.skipped);
    }
    Ok(())
}
