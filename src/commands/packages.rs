//! Commands: install, rm, tap, untap, installed, missing.
use anyhow::Result;

use crate::cli::{InstallOpts, InstalledOpts, MissingOpts, NamesOpts};
use crate::tasks::{Context, packages, taps};

/// Run the install command.
///
/// # Errors
///
/// Returns an error if any package fails to install.
pub fn install(ctx: &Context, opts: &InstallOpts) -> Result<()> {
    packages::install(ctx, &opts.names, opts.force)
}

/// Run the rm command.
///
/// # Errors
///
/// Returns an error if any package fails to uninstall.
pub fn remove(ctx: &Context, opts: &NamesOpts) -> Result<()> {
    packages::remove(ctx, &opts.names)
}

/// Run the tap command.
///
/// # Errors
///
/// Returns an error if any tap cannot be added.
pub fn tap(ctx: &Context, opts: &NamesOpts) -> Result<()> {
    taps::tap(ctx, &opts.names)
}

/// Run the untap command.
///
/// # Errors
///
/// Returns an error if any tap cannot be removed.
pub fn untap(ctx: &Context, opts: &NamesOpts) -> Result<()> {
    taps::untap(ctx, &opts.names)
}

/// Run the installed command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read.
pub fn installed(ctx: &Context, opts: &InstalledOpts) -> Result<()> {
    let names = packages::installed(ctx, opts.prefix.as_deref())?;
    if names.is_empty() {
        ctx.log.error("nothing to list");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Run the missing command.
///
/// # Errors
///
/// Returns an error if the package manager cannot be queried, or with
/// `--add`, if a package cannot be installed.
pub fn missing(ctx: &Context, opts: &MissingOpts) -> Result<()> {
    let names = packages::missing(ctx)?;
    if names.is_empty() {
        ctx.log
            .info(&format!("every installed {} is bootstrapped", ctx.kind));
        return Ok(());
    }
    if opts.add {
        return packages::install(ctx, &names, false);
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}
