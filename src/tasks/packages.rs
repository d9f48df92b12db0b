//! Package synchronizer: install plans, single-package commands and the
//! restore phase.
use std::collections::BTreeSet;

use anyhow::{Result, bail};

use super::{Context, Task, TaskResult, TaskStats};
use crate::config::manifest::{
    self, DependencyRef, Manifest, PackageKind, with_item, without_item,
};
use crate::logging::Outcome;
use crate::resources::package::PackageOutcome;

/// Ordered `(kind, name)` installs for a full restore.
///
/// Each formula is preceded by its cask dependencies.  A cask installed as
/// a dependency is dropped from the plain cask list and is planned only
/// once, however many formulas share it.  Unrecognized dependency
/// references are ignored.
#[must_use]
pub fn plan_installs(manifest: &Manifest) -> Vec<(PackageKind, String)> {
    let mut plan = Vec::new();
    let mut as_dependency = BTreeSet::new();

    for formula in &manifest.formulas {
        for dep in manifest.dependencies_of(formula) {
            if let DependencyRef::Package {
                kind: PackageKind::Cask,
                name,
            } = dep
                && as_dependency.insert(name.clone())
            {
                plan.push((PackageKind::Cask, name));
            }
        }
        plan.push((PackageKind::Formula, formula.clone()));
    }

    plan.extend(
        manifest
            .casks
            .iter()
            .filter(|cask| !as_dependency.contains(*cask))
            .map(|cask| (PackageKind::Cask, cask.clone())),
    );
    plan
}

/// Fold one package-manager outcome into `stats`, logging it.
pub(super) fn tally(ctx: &Context, stats: &mut TaskStats, item: &str, outcome: &PackageOutcome) {
    match outcome {
        PackageOutcome::Applied => {
            ctx.log.outcome(Outcome::Changed, &format!("{item}: done"));
            stats.changed += 1;
        }
        PackageOutcome::AlreadySatisfied => {
            ctx.log
                .outcome(Outcome::Satisfied, &format!("{item}: already satisfied"));
            stats.already_ok += 1;
        }
        PackageOutcome::Failed { detail } => {
            ctx.log.outcome(Outcome::Failed, &format!("{item}: {detail}"));
            stats.skipped += 1;
        }
    }
}

/// Run `action` for each name and, when the package manager did not
/// report failure, add it to (or drop it from) the manifest list under
/// `key`.
///
/// A name the package manager rejects leaves the manifest untouched; the
/// remaining names are still processed.
pub(super) fn sync_each<F>(
    ctx: &Context,
    names: &[String],
    key: &str,
    add: bool,
    action: F,
) -> Result<()>
where
    F: Fn(&str) -> Result<PackageOutcome>,
{
    let path = ctx.paths.bootstrap_file();
    let mut failed = Vec::new();

    for name in names {
        let mut stats = TaskStats::new();
        tally(ctx, &mut stats, name, &action(name)?);
        if stats.skipped > 0 {
            failed.push(name.as_str());
            continue;
        }

        let changed = manifest::modify_list(&path, key, |items| {
            if add {
                with_item(items, name)
            } else {
                without_item(items, name)
            }
        })?;
        match (changed, add) {
            (true, true) => ctx.log.info(&format!("added {name} to {key}")),
            (true, false) => ctx.log.info(&format!("removed {name} from {key}")),
            (false, true) => ctx.log.warn(&format!("{name} is already in {key}")),
            (false, false) => ctx.log.warn(&format!("{name} is not in {key}")),
        }
    }

    if !failed.is_empty() {
        bail!("failed: {}", failed.join(", "));
    }
    Ok(())
}

/// Install packages of the active kind and record them in the manifest.
///
/// # Errors
///
/// Returns an error if any package fails to install, after the others
/// have been processed, or if the manifest cannot be updated.
pub fn install(ctx: &Context, names: &[String], force: bool) -> Result<()> {
    sync_each(ctx, names, ctx.kind.manifest_key(), true, |name| {
        ctx.packages.install(ctx.kind, name, force)
    })
}

/// Uninstall packages of the active kind and drop them from the manifest.
///
/// # Errors
///
/// Returns an error if any package fails to uninstall, after the others
/// have been processed, or if the manifest cannot be updated.
pub fn remove(ctx: &Context, names: &[String]) -> Result<()> {
    sync_each(ctx, names, ctx.kind.manifest_key(), false, |name| {
        ctx.packages.remove(ctx.kind, name)
    })
}

/// Manifest entries of the active kind starting with `prefix`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read.
pub fn installed(ctx: &Context, prefix: Option<&str>) -> Result<Vec<String>> {
    let manifest = Manifest::read(&ctx.paths.bootstrap_file())?;
    Ok(manifest
        .packages(ctx.kind)
        .iter()
        .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
        .cloned()
        .collect())
}

/// Installed packages of the active kind that the manifest does not
/// account for, either directly or as a dependency of a listed package.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or the package manager
/// cannot be queried.
pub fn missing(ctx: &Context) -> Result<Vec<String>> {
    let manifest = Manifest::read(&ctx.paths.bootstrap_file())?;
    let listed: BTreeSet<&str> = manifest
        .packages(ctx.kind)
        .iter()
        .filter_map(|entry| entry.split_whitespace().next())
        .collect();

    let mut result = Vec::new();
    for name in ctx.packages.list(ctx.kind)? {
        if listed.contains(name.as_str()) {
            continue;
        }
        let dependents = ctx.packages.dependents(ctx.kind, &name)?;
        if dependents.iter().any(|d| listed.contains(d.as_str())) {
            ctx.log
                .debug(&format!("{name} is required by a bootstrapped package"));
            continue;
        }
        result.push(name);
    }
    Ok(result)
}

/// Installs every manifest package, cask dependencies first.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, _: &Context, manifest: &Manifest) -> bool {
        !manifest.formulas.is_empty() || !manifest.casks.is_empty()
    }

    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for (kind, name) in plan_installs(manifest) {
            let outcome = ctx.packages.install(kind, &name, false)?;
            tally(ctx, &mut stats, &format!("{kind} {name}"), &outcome);
        }
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{FakePackages, TestContext};
    use serde_json::json;

    fn manifest(doc: &serde_json::Value) -> Manifest {
        Manifest::from_document(doc, std::path::Path::new("bootstrap.json")).unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn dependency_cask_is_installed_before_its_formula() {
        let m = manifest(&json!({
            "formulas": ["git", "vim"],
            "casks": ["iterm2", "macvim"],
            "dependencies": {"vim": "cask/macvim"}
        }));
        assert_eq!(
            plan_installs(&m),
            [
                (PackageKind::Formula, "git".to_string()),
                (PackageKind::Cask, "macvim".to_string()),
                (PackageKind::Formula, "vim".to_string()),
                (PackageKind::Cask, "iterm2".to_string()),
            ]
        );
    }

    #[test]
    fn shared_dependency_is_planned_once() {
        let m = manifest(&json!({
            "formulas": ["a", "b"],
            "casks": ["java"],
            "dependencies": {"a": ["cask/java"], "b": "cask/java"}
        }));
        assert_eq!(
            plan_installs(&m),
            [
                (PackageKind::Cask, "java".to_string()),
                (PackageKind::Formula, "a".to_string()),
                (PackageKind::Formula, "b".to_string()),
            ]
        );
    }

    #[test]
    fn unrecognized_dependencies_are_ignored() {
        let m = manifest(&json!({
            "formulas": ["vim"],
            "dependencies": {"vim": ["python", "tap/foo"]}
        }));
        assert_eq!(
            plan_installs(&m),
            [(PackageKind::Formula, "vim".to_string())]
        );
    }

    #[test]
    fn install_records_in_manifest() {
        let t = TestContext::new();
        install(&t.ctx, &names(&["wget", "git"]), false).unwrap();
        install(&t.ctx, &names(&["git"]), false).unwrap();
        assert_eq!(
            t.read_json(&t.ctx.paths.bootstrap_file()),
            json!({"formulas": ["git", "wget"]})
        );
        assert_eq!(
            t.packages.calls(),
            [
                "install formula wget",
                "install formula git",
                "install formula git"
            ]
        );
        assert_eq!(t.log.warnings(), ["git is already in formulas"]);
    }

    #[test]
    fn failed_install_leaves_manifest_alone() {
        let t = TestContext::with_packages(FakePackages::default().failing("nope"));
        let err = install(&t.ctx, &names(&["nope", "jq"]), false).unwrap_err();
        assert_eq!(err.to_string(), "failed: nope");
        assert_eq!(
            t.read_json(&t.ctx.paths.bootstrap_file()),
            json!({"formulas": ["jq"]})
        );
    }

    #[test]
    fn remove_drops_from_manifest() {
        let t = TestContext::with_packages(
            FakePackages::default().with_installed(PackageKind::Formula, "wget"),
        );
        t.write_manifest(&json!({"formulas": ["git", "wget"]}));
        remove(&t.ctx, &names(&["wget"])).unwrap();
        assert_eq!(
            t.read_json(&t.ctx.paths.bootstrap_file()),
            json!({"formulas": ["git"]})
        );
    }

    #[test]
    fn cask_mode_uses_cask_list() {
        let mut t = TestContext::new();
        t.ctx.kind = PackageKind::Cask;
        install(&t.ctx, &names(&["iterm2"]), true).unwrap();
        assert_eq!(t.packages.calls(), ["install cask --force iterm2"]);
        assert_eq!(
            t.read_json(&t.ctx.paths.bootstrap_file()),
            json!({"casks": ["iterm2"]})
        );
    }

    #[test]
    fn installed_filters_by_prefix() {
        let t = TestContext::new();
        t.write_manifest(&json!({"formulas": ["git", "gnupg", "wget"]}));
        assert_eq!(installed(&t.ctx, Some("g")).unwrap(), ["git", "gnupg"]);
        assert_eq!(installed(&t.ctx, None).unwrap().len(), 3);
        assert!(installed(&t.ctx, Some("z")).unwrap().is_empty());
    }

    #[test]
    fn missing_excludes_listed_packages_and_their_dependencies() {
        let t = TestContext::with_packages(
            FakePackages::default()
                .with_installed(PackageKind::Formula, "git")
                .with_installed(PackageKind::Formula, "pcre2")
                .with_installed(PackageKind::Formula, "htop")
                .with_dependent("pcre2", "git"),
        );
        t.write_manifest(&json!({"formulas": ["git"]}));
        assert_eq!(missing(&t.ctx).unwrap(), ["htop"]);
    }

    #[test]
    fn missing_requires_a_manifest() {
        let t = TestContext::new();
        let err = missing(&t.ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::CiderError>(),
            Some(crate::error::CiderError::ManifestMissing { .. })
        ));
    }

    #[test]
    fn restore_phase_counts_failures_as_skipped() {
        let t = TestContext::with_packages(
            FakePackages::default()
                .failing("broken")
                .with_installed(PackageKind::Formula, "git"),
        );
        let m = manifest(&json!({"formulas": ["git", "broken", "jq"]}));
        let result = InstallPackages.run(&t.ctx, &m).unwrap();
        assert_eq!(
            result,
            TaskResult::Skipped("1 changed, 1 already ok, 1 skipped".to_string())
        );
        assert_eq!(t.log.errors().len(), 1);
    }
}
