//! Custom application icons.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::config::manifest::{self, Manifest};
use crate::error::CiderError;
use crate::logging::Outcome;
use crate::resources::icon::{IconSource, download};

fn locate(ctx: &Context, app: &str) -> Result<PathBuf, CiderError> {
    ctx.apps
        .path_for_app(app)
        .ok_or_else(|| CiderError::ApplicationMissing {
            app: app.to_string(),
        })
}

/// Apply `icon` to `app` without touching the manifest.
///
/// A remote icon is downloaded into a temporary directory that is removed
/// once the icon is applied.
///
/// # Errors
///
/// Returns [`CiderError::ApplicationMissing`] if the application is not
/// installed, or an error if the icon cannot be fetched or applied.
pub fn apply_icon(ctx: &Context, app: &str, icon: &str) -> Result<()> {
    let bundle = locate(ctx, app)?;
    match IconSource::parse(icon, &ctx.home) {
        IconSource::Local(path) => ctx.icons.set_icon(&bundle, &path),
        IconSource::Remote(url) => {
            let (_dir, path) = download(&url)?;
            ctx.icons.set_icon(&bundle, &path)
        }
    }
}

/// Record `app → icon` in the manifest and apply it.
///
/// # Errors
///
/// Returns [`CiderError::ApplicationMissing`] before anything is recorded
/// if the application is not installed, or an error if the manifest cannot
/// be updated or the icon cannot be applied.
pub fn set_icon(ctx: &Context, app: &str, icon: &str) -> Result<()> {
    locate(ctx, app)?;
    if manifest::set_icon(&ctx.paths.bootstrap_file(), app, icon)? {
        ctx.log.info(&format!("saved icon for {app}"));
    }
    apply_icon(ctx, app, icon)
}

/// Forget the icon for `app` and restore the application's own icon.
///
/// # Errors
///
/// Returns [`CiderError::ApplicationMissing`] if the application is not
/// installed, or an error if the manifest cannot be updated or the icon
/// cannot be removed.
pub fn remove_icon(ctx: &Context, app: &str) -> Result<()> {
    let bundle = locate(ctx, app)?;
    if manifest::remove_icon(&ctx.paths.bootstrap_file(), app)? {
        ctx.log.info(&format!("removed icon for {app}"));
    } else {
        ctx.log.warn(&format!("no icon saved for {app}"));
    }
    ctx.icons.remove_icon(&bundle)
}

/// Apply every icon in the manifest.  An application that is not installed
/// or an icon that cannot be applied is logged and counted as skipped.
#[must_use]
pub fn apply_icons(ctx: &Context, manifest: &Manifest) -> TaskStats {
    let mut stats = TaskStats::new();
    for (app, icon) in &manifest.icons {
        match apply_icon(ctx, app, icon) {
            Ok(()) => {
                ctx.log.outcome(Outcome::Changed, &format!("{app}: {icon}"));
                stats.changed += 1;
            }
            Err(e) => {
                ctx.log.outcome(Outcome::Failed, &format!("{app}: {e:#}"));
                stats.skipped += 1;
            }
        }
    }
    stats
}

/// Applies the manifest's icons.
#[derive(Debug)]
pub struct ApplyIcons;

impl Task for ApplyIcons {
    fn name(&self) -> &'static str {
        "Apply icons"
    }

    fn should_run(&self, _: &Context, manifest: &Manifest) -> bool {
        !manifest.icons.is_empty()
    }

    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult> {
        Ok(apply_icons(ctx, manifest).finish(ctx))
    }
}
