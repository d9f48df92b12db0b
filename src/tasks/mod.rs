//! Named restore phases and the operations behind each CLI command.
//!
//! Every phase is a [`Task`]; [`restore_tasks`] lists them in the order
//! restore runs them.  The free functions in each module (installing a
//! package, setting a preference, ...) are the single-item operations the
//! command handlers call directly.
mod context;
pub mod defaults;
pub mod icons;
pub mod packages;
mod processing;
pub mod scripts;
pub mod symlinks;
pub mod taps;

pub use context::{Context, home_dir};
pub use processing::{TaskResult, TaskStats};

use anyhow::Result;

use crate::config::manifest::Manifest;
use crate::logging::TaskStatus;

/// A named, executable restore phase.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether the manifest gives this task anything to do.
    fn should_run(&self, ctx: &Context, manifest: &Manifest) -> bool;

    /// Execute the task.
    ///
    /// Per-item failures are logged and counted; an `Err` aborts the whole
    /// restore.
    ///
    /// # Errors
    ///
    /// Returns an error if a failure must stop the remaining phases, such as
    /// a failing script or an unwritable state file.
    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult>;
}

/// The restore phases, in execution order.
#[must_use]
pub fn restore_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(scripts::RunBeforeScripts),
        Box::new(taps::AddTaps),
        Box::new(packages::InstallPackages),
        Box::new(symlinks::Relink),
        Box::new(defaults::ApplyDefaults),
        Box::new(icons::ApplyIcons),
        Box::new(scripts::RunAfterScripts),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Propagates the task's error after recording it as failed.
pub fn execute(task: &dyn Task, ctx: &Context, manifest: &Manifest) -> Result<()> {
    if !task.should_run(ctx, manifest) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx, manifest) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}

/// Execute `tasks` in order, stopping at the first fatal error.
///
/// # Errors
///
/// Returns the first task error.
pub fn execute_all(tasks: &[Box<dyn Task>], ctx: &Context, manifest: &Manifest) -> Result<()> {
    for task in tasks {
        execute(task.as_ref(), ctx, manifest)?;
    }
    Ok(())
}

/// Shared helpers for task unit tests.
///
/// Provides fakes for the system bindings and a [`TestContext`] that wires
/// them into a [`Context`] rooted in a temporary directory.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub mod test_helpers {
    use std::collections::{BTreeSet, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use serde_json::Value;

    use super::Context;
    use crate::config::Paths;
    use crate::config::manifest::PackageKind;
    use crate::logging::MemoryLog;
    use crate::resources::defaults::PreferenceWriter;
    use crate::resources::icon::{IconSetter, MacApps};
    use crate::resources::package::{PackageManager, PackageOutcome};
    use crate::resources::test_helpers::MockExecutor;
    use crate::resources::trash::SystemTrash;

    /// In-memory package manager.
    ///
    /// Installing marks a package installed; installing it again is
    /// [`PackageOutcome::AlreadySatisfied`].  Names added with
    /// [`failing`](Self::failing) always report failure.
    #[derive(Debug, Default)]
    pub struct FakePackages {
        installed: Mutex<BTreeSet<(PackageKind, String)>>,
        taps: Mutex<BTreeSet<String>>,
        failing: HashSet<String>,
        dependents: Vec<(String, String)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakePackages {
        /// Make every action on `name` fail.
        #[must_use]
        pub fn failing(mut self, name: &str) -> Self {
            self.failing.insert(name.to_string());
            self
        }

        /// Mark `name` as already installed.
        #[must_use]
        pub fn with_installed(self, kind: PackageKind, name: &str) -> Self {
            self.installed
                .lock()
                .unwrap()
                .insert((kind, name.to_string()));
            self
        }

        /// Declare that `dependent` depends on `name`.
        #[must_use]
        pub fn with_dependent(mut self, name: &str, dependent: &str) -> Self {
            self.dependents
                .push((name.to_string(), dependent.to_string()));
            self
        }

        /// Actions issued so far, e.g. `"install cask iterm2"`.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn outcome(&self, name: &str, changed: bool) -> PackageOutcome {
            if self.failing.contains(name) {
                PackageOutcome::Failed {
                    detail: format!("Error: No available formula with the name \"{name}\""),
                }
            } else if changed {
                PackageOutcome::Applied
            } else {
                PackageOutcome::AlreadySatisfied
            }
        }
    }

    impl PackageManager for FakePackages {
        fn install(&self, kind: PackageKind, name: &str, force: bool) -> Result<PackageOutcome> {
            let flag = if force { " --force" } else { "" };
            self.record(format!("install {kind}{flag} {name}"));
            if self.failing.contains(name) {
                return Ok(self.outcome(name, false));
            }
            let added = self
                .installed
                .lock()
                .unwrap()
                .insert((kind, name.to_string()));
            Ok(self.outcome(name, added || force))
        }

        fn remove(&self, kind: PackageKind, name: &str) -> Result<PackageOutcome> {
            self.record(format!("remove {kind} {name}"));
            let removed = self
                .installed
                .lock()
                .unwrap()
                .remove(&(kind, name.to_string()));
            Ok(self.outcome(name, removed))
        }

        fn tap(&self, name: &str) -> Result<PackageOutcome> {
            self.record(format!("tap {name}"));
            let added = self.taps.lock().unwrap().insert(name.to_string());
            Ok(self.outcome(name, added))
        }

        fn untap(&self, name: &str) -> Result<PackageOutcome> {
            self.record(format!("untap {name}"));
            let removed = self.taps.lock().unwrap().remove(name);
            Ok(self.outcome(name, removed))
        }

        fn list(&self, kind: PackageKind) -> Result<BTreeSet<String>> {
            Ok(self
                .installed
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, name)| name.clone())
                .collect())
        }

        fn dependents(&self, _: PackageKind, name: &str) -> Result<BTreeSet<String>> {
            Ok(self
                .dependents
                .iter()
                .filter(|(dep, _)| dep == name)
                .map(|(_, dependent)| dependent.clone())
                .collect())
        }
    }

    /// Preference writer that records `"write domain key value"` lines.
    #[derive(Debug, Default)]
    pub struct FakeDefaults {
        calls: Mutex<Vec<String>>,
        failing_keys: HashSet<String>,
    }

    impl FakeDefaults {
        /// Make writes of `key` fail.
        #[must_use]
        pub fn failing(mut self, key: &str) -> Self {
            self.failing_keys.insert(key.to_string());
            self
        }

        /// Calls issued so far.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PreferenceWriter for FakeDefaults {
        fn write(&self, domain: &str, key: &str, value: &Value, force: bool) -> Result<()> {
            let flag = if force { " (force)" } else { "" };
            self.calls
                .lock()
                .unwrap()
                .push(format!("write {domain} {key} {value}{flag}"));
            if self.failing_keys.contains(key) {
                anyhow::bail!("defaults write {domain} {key} failed");
            }
            Ok(())
        }

        fn delete(&self, domain: &str, key: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete {domain} {key}"));
            Ok(())
        }
    }

    /// Icon setter that records `"set <app> <icon>"` / `"rm <app>"` lines.
    #[derive(Debug, Default)]
    pub struct FakeIcons {
        calls: Mutex<Vec<String>>,
    }

    impl FakeIcons {
        /// Calls issued so far.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl IconSetter for FakeIcons {
        fn set_icon(&self, app: &Path, icon: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("set {} {}", app.display(), icon.display()));
            Ok(())
        }

        fn remove_icon(&self, app: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("rm {}", app.display()));
            Ok(())
        }
    }

    /// A [`Context`] over fakes, rooted in a temporary directory laid out as
    /// `home/`, `home/.cider/`, `Applications/` and `trash/`.
    #[derive(Debug)]
    pub struct TestContext {
        /// Keeps the temporary directory alive.
        pub dir: tempfile::TempDir,
        /// The context under test.
        pub ctx: Context,
        /// Everything the tasks logged.
        pub log: Arc<MemoryLog>,
        /// The package manager fake.
        pub packages: Arc<FakePackages>,
        /// The preference writer fake.
        pub defaults: Arc<FakeDefaults>,
        /// The icon setter fake.
        pub icons: Arc<FakeIcons>,
        /// The executor used for scripts.
        pub executor: Arc<MockExecutor>,
    }

    impl TestContext {
        /// Context with default fakes and an executor that fails every call.
        pub fn new() -> Self {
            Self::build(
                FakePackages::default(),
                FakeDefaults::default(),
                MockExecutor::with_responses(Vec::new()),
            )
        }

        /// Context with the given package manager fake.
        pub fn with_packages(packages: FakePackages) -> Self {
            Self::build(
                packages,
                FakeDefaults::default(),
                MockExecutor::with_responses(Vec::new()),
            )
        }

        /// Context with the given preference writer fake.
        pub fn with_defaults(defaults: FakeDefaults) -> Self {
            Self::build(
                FakePackages::default(),
                defaults,
                MockExecutor::with_responses(Vec::new()),
            )
        }

        /// Context with the given script executor.
        pub fn with_executor(executor: MockExecutor) -> Self {
            Self::build(FakePackages::default(), FakeDefaults::default(), executor)
        }

        fn build(packages: FakePackages, defaults: FakeDefaults, executor: MockExecutor) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let home = dir.path().join("home");
            let root = home.join(".cider");
            std::fs::create_dir_all(root.join("symlinks")).unwrap();
            std::fs::create_dir_all(dir.path().join("Applications")).unwrap();

            let log = Arc::new(MemoryLog::new());
            let packages = Arc::new(packages);
            let defaults = Arc::new(defaults);
            let icons = Arc::new(FakeIcons::default());
            let executor = Arc::new(executor);
            let ctx = Context {
                paths: Paths::new(root),
                home,
                kind: PackageKind::Formula,
                log: Arc::clone(&log) as Arc<dyn crate::logging::Log>,
                executor: Arc::clone(&executor) as Arc<dyn crate::exec::Executor>,
                packages: Arc::clone(&packages) as Arc<dyn PackageManager>,
                defaults: Arc::clone(&defaults) as Arc<dyn PreferenceWriter>,
                apps: Arc::new(MacApps::with_dirs(vec![dir.path().join("Applications")])),
                icons: Arc::clone(&icons) as Arc<dyn IconSetter>,
                trash: Arc::new(SystemTrash::new(dir.path().join("trash"))),
            };
            Self {
                dir,
                ctx,
                log,
                packages,
                defaults,
                icons,
                executor,
            }
        }

        /// The tool directory.
        pub fn root(&self) -> PathBuf {
            self.ctx.paths.root.clone()
        }

        /// The fake home directory.
        pub fn home(&self) -> PathBuf {
            self.ctx.home.clone()
        }

        /// Create an application bundle that the locator will find.
        pub fn install_app(&self, name: &str) -> PathBuf {
            let bundle = self.dir.path().join("Applications").join(format!("{name}.app"));
            std::fs::create_dir_all(&bundle).unwrap();
            bundle
        }

        /// Write the manifest document.
        pub fn write_manifest(&self, doc: &Value) {
            crate::store::save(&self.ctx.paths.bootstrap_file(), doc).unwrap();
        }

        /// Read back a state file as raw JSON.
        pub fn read_json(&self, path: &Path) -> Value {
            crate::store::load(path, None).unwrap()
        }
    }
}
