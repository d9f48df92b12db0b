//! Top-level subcommand handlers.
pub mod defaults;
pub mod icons;
pub mod packages;
pub mod relink;
pub mod restore;
pub mod scripts;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::config::manifest::PackageKind;
use crate::config::{DIR_ENV, Paths};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::tasks::{Context, home_dir};

/// Build the task context every command runs against.
///
/// Resolves the home and tool directories and binds the context to the
/// real system.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn context(global: &GlobalOpts, log: &Arc<Logger>) -> Result<Context> {
    let home = home_dir()?;
    let paths = Paths::resolve(global.dir.as_deref(), std::env::var_os(DIR_ENV), &home);
    let kind = if global.cask {
        PackageKind::Cask
    } else {
        PackageKind::Formula
    };
    log.debug(&format!("tool directory: {}", paths.root.display()));
    Ok(Context::new(
        paths,
        home,
        kind,
        Arc::clone(log) as Arc<dyn Log>,
        Arc::new(SystemExecutor),
    ))
}

/// Run the subcommand selected on the command line.
///
/// # Errors
///
/// Returns whatever error the subcommand raised.
pub fn dispatch(cli: &Cli, log: &Arc<Logger>) -> Result<()> {
    if matches!(cli.command, Command::Version) {
        version::run();
        return Ok(());
    }

    let ctx = context(&cli.global, log)?;
    match &cli.command {
        Command::Restore => restore::run(&ctx, log),
        Command::Install(opts) => packages::install(&ctx, opts),
        Command::Rm(opts) => packages::remove(&ctx, opts),
        Command::Tap(opts) => packages::tap(&ctx, opts),
        Command::Untap(opts) => packages::untap(&ctx, opts),
        Command::Installed(opts) => packages::installed(&ctx, opts),
        Command::Missing(opts) => packages::missing(&ctx, opts),
        Command::Relink(opts) => relink::run(&ctx, opts),
        Command::SetDefault(opts) => defaults::set(&ctx, opts),
        Command::RemoveDefault(opts) => defaults::remove(&ctx, opts),
        Command::ApplyDefaults => defaults::apply(&ctx),
        Command::RunScripts => scripts::run(&ctx),
        Command::SetIcon(opts) => icons::set(&ctx, opts),
        Command::RemoveIcon(opts) => icons::remove(&ctx, opts),
        Command::ApplyIcons => icons::apply(&ctx),
        Command::Version => Ok(()),
    }
}
