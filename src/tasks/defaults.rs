//! OS preference settings.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult, TaskStats};
use crate::config::manifest::Manifest;
use crate::config::preferences::{self, Preferences, parse_value};
use crate::logging::Outcome;

/// Write `domain/key` and record it in the preferences document.
///
/// `raw` is interpreted by [`parse_value`].  With `force`, a write the OS
/// rejects is retried once after deleting the existing key.
///
/// # Errors
///
/// Returns an error if the preference cannot be written or the document
/// cannot be updated.  The document is only updated after a successful
/// write.
pub fn set_default(ctx: &Context, domain: &str, key: &str, raw: &str, force: bool) -> Result<()> {
    let value = parse_value(raw);
    ctx.defaults
        .write(domain, key, &value, force)
        .with_context(|| format!("writing {domain} {key}"))?;
    if preferences::set_value(&ctx.paths.defaults_file(), domain, key, value)? {
        ctx.log.info(&format!("saved {domain} {key}"));
    } else {
        ctx.log.debug(&format!("{domain} {key} already saved"));
    }
    Ok(())
}

/// Delete `domain/key` from the OS and from the preferences document.
///
/// # Errors
///
/// Returns an error if the preference cannot be deleted or the document
/// cannot be updated.
pub fn remove_default(ctx: &Context, domain: &str, key: &str) -> Result<()> {
    ctx.defaults
        .delete(domain, key)
        .with_context(|| format!("deleting {domain} {key}"))?;
    if preferences::remove_value(&ctx.paths.defaults_file(), domain, key)? {
        ctx.log.info(&format!("removed {domain} {key}"));
    } else {
        ctx.log.warn(&format!("{domain} {key} was not saved"));
    }
    Ok(())
}

/// Write every recorded preference.  A rejected write is logged and
/// counted as skipped.
///
/// # Errors
///
/// Returns an error if the preferences document cannot be read.
pub fn apply_defaults(ctx: &Context) -> Result<TaskStats> {
    let prefs = Preferences::read(&ctx.paths.defaults_file())?;
    let mut stats = TaskStats::new();
    for (domain, keys) in &prefs.domains {
        for (key, value) in keys {
            match ctx.defaults.write(domain, key, value, false) {
                Ok(()) => {
                    ctx.log
                        .outcome(Outcome::Changed, &format!("{domain} {key} = {value}"));
                    stats.changed += 1;
                }
                Err(e) => {
                    ctx.log
                        .outcome(Outcome::Failed, &format!("{domain} {key}: {e:#}"));
                    stats.skipped += 1;
                }
            }
        }
    }
    Ok(stats)
}

/// Applies the preferences document.
#[derive(Debug)]
pub struct ApplyDefaults;

impl Task for ApplyDefaults {
    fn name(&self) -> &'static str {
        "Apply defaults"
    }

    fn should_run(&self, ctx: &Context, _: &Manifest) -> bool {
        ctx.paths.defaults_file().exists()
    }

    fn run(&self, ctx: &Context, _: &Manifest) -> Result<TaskResult> {
        Ok(apply_defaults(ctx)?.finish(ctx))
    }
}
