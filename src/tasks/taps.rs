//! Repository taps.
use anyhow::Result;

use super::packages::{sync_each, tally};
use super::{Context, Task, TaskResult, TaskStats};
use crate::config::manifest::{Manifest, TAPS_KEY};

/// Add taps and record them in the manifest.
///
/// # Errors
///
/// Returns an error if any tap fails, after the others have been
/// processed, or if the manifest cannot be updated.
pub fn tap(ctx: &Context, names: &[String]) -> Result<()> {
    sync_each(ctx, names, TAPS_KEY, true, |name| ctx.packages.tap(name))
}

/// Remove taps and drop them from the manifest.
///
/// # Errors
///
/// Returns an error if any untap fails, after the others have been
/// processed, or if the manifest cannot be updated.
pub fn untap(ctx: &Context, names: &[String]) -> Result<()> {
    sync_each(ctx, names, TAPS_KEY, false, |name| ctx.packages.untap(name))
}

/// Adds every tap listed in the manifest.
#[derive(Debug)]
pub struct AddTaps;

impl Task for AddTaps {
    fn name(&self) -> &'static str {
        "Add taps"
    }

    fn should_run(&self, _: &Context, manifest: &Manifest) -> bool {
        !manifest.taps.is_empty()
    }

    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for name in &manifest.taps {
            let outcome = ctx.packages.tap(name)?;
            tally(ctx, &mut stats, &format!("tap {name}"), &outcome);
        }
        Ok(stats.finish(ctx))
    }
}
