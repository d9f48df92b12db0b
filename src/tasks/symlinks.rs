//! Symlink reconciler: link declared sources into place and retract the
//! links a previous run created that are no longer declared.
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use globset::GlobBuilder;
use serde_json::{Value, json};

use super::{Context, Task, TaskResult, TaskStats};
use crate::config::manifest::Manifest;
use crate::config::{expand_user, malformed};
use crate::error::CiderError;
use crate::logging::Outcome;
use crate::resources::helpers::fs::{
    ensure_dir, ensure_parent_dir, is_symlink, is_within, list_tree,
};
use crate::resources::symlink::{LinkOutcome, SymlinkResource, remove_symlink};
use crate::store;

/// What one reconciliation did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Per-link counters.
    pub stats: TaskStats,
    /// Every destination the current rules resolved to, sorted.
    pub targets: Vec<PathBuf>,
    /// Stale links that were deleted.
    pub removed: Vec<PathBuf>,
}

/// Whether a destination template names a directory the source should be
/// linked into, rather than the link path itself.
fn is_directory_template(template: &str) -> bool {
    template == "~" || template.ends_with('/') || template.ends_with(std::path::MAIN_SEPARATOR)
}

/// Destination path for `source` under `template`.
///
/// `~` expands to `home`.  A directory template (`~`, or one ending in a
/// separator) receives the source's base name.
#[must_use]
pub fn destination(source: &Path, template: &str, home: &Path) -> PathBuf {
    let base = expand_user(template, home);
    match source.file_name() {
        Some(name) if is_directory_template(template) => base.join(name),
        _ => base,
    }
}

/// Whether a match is allowed given that wildcards never match a leading
/// dot: each hidden component of `relative` needs a pattern component that
/// itself starts with a dot.
fn hidden_allowed(pattern: &str, relative: &Path) -> bool {
    let parts: Vec<&str> = pattern.split('/').collect();
    relative.components().enumerate().all(|(i, component)| {
        let Component::Normal(name) = component else {
            return true;
        };
        !name.to_string_lossy().starts_with('.')
            || parts.get(i).is_some_and(|p| p.starts_with('.'))
    })
}

/// Sources under `root` matching `pattern`, in sorted order.
///
/// `entries` is the listing of `root` from [`list_tree`].  A `*` does not
/// cross a `/`.
///
/// # Errors
///
/// Returns [`CiderError::MalformedDocument`] if the pattern is not a valid
/// glob.
pub fn expand_rule(
    root: &Path,
    pattern: &str,
    entries: &[PathBuf],
    manifest_path: &Path,
) -> Result<Vec<PathBuf>, CiderError> {
    let matcher = GlobBuilder::new(pattern.trim_end_matches('/'))
        .literal_separator(true)
        .build()
        .map_err(|e| malformed(manifest_path, &format!("symlink pattern \"{pattern}\": {e}")))?
        .compile_matcher();
    Ok(entries
        .iter()
        .filter(|rel| matcher.is_match(rel) && hidden_allowed(pattern, rel))
        .map(|rel| root.join(rel))
        .collect())
}

fn read_snapshot(path: &Path) -> Result<Vec<String>, CiderError> {
    let doc = store::load(path, Some(json!([])))?;
    serde_json::from_value(doc)
        .map_err(|e| malformed(path, &format!("expected an array of paths: {e}")))
}

/// Link every source matched by `rules` to its destination, then retract
/// the links recorded by the previous run that no longer have a rule.
///
/// A conflicting destination is left alone unless `force` is set, in which
/// case it is moved to the trash first.  Every resolved destination is
/// recorded in the snapshot whether or not it could be linked.  A stale
/// entry is deleted only if it is still a symlink pointing into the managed
/// root; anything else the user may have put there is left untouched.
///
/// # Errors
///
/// Returns an error if a state file cannot be read or written, a pattern
/// is invalid, or the filesystem refuses a link for a reason other than an
/// occupied destination.
pub fn reconcile(ctx: &Context, rules: &[(String, String)], force: bool) -> Result<ReconcileReport> {
    let root = ctx.symlink_dir();
    let snapshot_path = ctx.paths.symlink_targets_file();
    let manifest_path = ctx.paths.bootstrap_file();

    let previous = read_snapshot(&snapshot_path)?;
    let entries = list_tree(&root)?;

    let mut report = ReconcileReport::default();
    let mut targets = BTreeSet::new();

    for (pattern, template) in rules {
        let base = expand_user(template, &ctx.home);
        if is_directory_template(template) {
            ensure_dir(&base)?;
        } else {
            ensure_parent_dir(&base)?;
        }

        for source in expand_rule(&root, pattern, &entries, &manifest_path)? {
            let target = destination(&source, template, &ctx.home);
            link_one(ctx, &mut report.stats, source, &target, force)?;
            targets.insert(target);
        }
    }

    for stale in &previous {
        let path = PathBuf::from(stale);
        if targets.contains(&path) || !is_symlink(&path) {
            continue;
        }
        if !is_within(&path, &root) {
            ctx.log.debug(&format!(
                "leaving {}: no longer points into {}",
                ctx.display_path(&path),
                ctx.display_path(&root)
            ));
            continue;
        }
        match remove_symlink(&path) {
            Ok(()) => {
                ctx.log.outcome(
                    Outcome::Changed,
                    &format!("removed dead symlink {}", ctx.display_path(&path)),
                );
                report.removed.push(path);
            }
            Err(e) => {
                ctx.log.outcome(Outcome::Failed, &e.to_string());
                report.stats.skipped += 1;
            }
        }
    }

    report.targets = targets.into_iter().collect();
    let recorded: Vec<Value> = report
        .targets
        .iter()
        .map(|t| Value::from(t.to_string_lossy().into_owned()))
        .collect();
    ensure_parent_dir(&snapshot_path)?;
    store::modify(&snapshot_path, |_| Ok(Value::Array(recorded)))?;

    Ok(report)
}

fn link_one(
    ctx: &Context,
    stats: &mut TaskStats,
    source: PathBuf,
    target: &Path,
    force: bool,
) -> Result<(), CiderError> {
    let shown = ctx.display_path(target);
    let link = SymlinkResource::new(source, target.to_path_buf());
    match link.ensure(force, ctx.trash.as_ref()) {
        Ok(LinkOutcome::AlreadySatisfied) => {
            ctx.log.outcome(Outcome::Satisfied, &link.description());
            stats.already_ok += 1;
        }
        Ok(LinkOutcome::Created) => {
            ctx.log.outcome(Outcome::Changed, &format!("linked {shown}"));
            stats.changed += 1;
        }
        Ok(LinkOutcome::Replaced { previous, trashed }) => {
            ctx.log.outcome(
                Outcome::Conflict { forced: true },
                &format!(
                    "replaced {shown} ({previous}); moved it to {}",
                    ctx.display_path(&trashed)
                ),
            );
            stats.changed += 1;
        }
        Ok(LinkOutcome::Conflict { detail }) => {
            let conflict = CiderError::SymlinkConflict {
                target: PathBuf::from(&shown),
                detail,
            };
            let msg = if force {
                conflict.to_string()
            } else {
                format!("{conflict} (use --force to replace it)")
            };
            ctx.log.outcome(Outcome::Conflict { forced: force }, &msg);
            stats.skipped += 1;
        }
        Err(e @ CiderError::SymlinkSourceMissing { .. }) => {
            ctx.log.outcome(Outcome::Failed, &e.to_string());
            stats.skipped += 1;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Relinks the manifest's symlinks and retracts stale ones.
#[derive(Debug)]
pub struct Relink;

impl Task for Relink {
    fn name(&self) -> &'static str {
        "Relink symlinks"
    }

    fn should_run(&self, ctx: &Context, manifest: &Manifest) -> bool {
        !manifest.symlinks.is_empty() || ctx.paths.symlink_targets_file().exists()
    }

    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult> {
        let report = reconcile(ctx, &manifest.symlinks, false)?;
        Ok(report.stats.finish(ctx))
    }
}
