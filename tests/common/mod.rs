// Shared helpers for integration tests.
//
// Provides a temporary home directory with a tool directory inside it, fake
// system bindings that record what they were asked to do, and a builder for
// the task context wired to them.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;

use cider_cli::config::Paths;
use cider_cli::config::manifest::PackageKind;
use cider_cli::exec::{ExecResult, Executor};
use cider_cli::logging::{Log, MemoryLog};
use cider_cli::platform::Preflight;
use cider_cli::resources::defaults::PreferenceWriter;
use cider_cli::resources::icon::{IconSetter, MacApps};
use cider_cli::resources::package::{PackageManager, PackageOutcome};
use cider_cli::resources::trash::SystemTrash;
use cider_cli::tasks::Context;

/// Runs no real commands.  Scripts exit with the code configured for them
/// (0 by default) and every program is reported as present.
#[derive(Debug, Default)]
pub struct ScriptRunner {
    exit_codes: HashMap<String, i32>,
    scripts: Mutex<Vec<String>>,
}

impl ScriptRunner {
    /// Make `script` exit with `code`.
    pub fn exiting(mut self, script: &str, code: i32) -> Self {
        self.exit_codes.insert(script.to_string(), code);
        self
    }

    /// Scripts run so far, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl Executor for ScriptRunner {
    fn run(&self, program: &str, _: &[&str]) -> Result<ExecResult> {
        anyhow::bail!("unexpected command: {program}")
    }

    fn run_in(&self, _: &Path, program: &str, _: &[&str]) -> Result<ExecResult> {
        anyhow::bail!("unexpected command: {program}")
    }

    fn run_unchecked(&self, program: &str, _: &[&str]) -> Result<ExecResult> {
        anyhow::bail!("unexpected command: {program}")
    }

    fn run_script(&self, script: &str, _: &Path) -> Result<i32> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(self.exit_codes.get(script).copied().unwrap_or(0))
    }

    fn which(&self, _: &str) -> bool {
        true
    }
}

/// In-memory package manager that records `"install cask b"` style calls.
#[derive(Debug, Default)]
pub struct RecordingPackages {
    installed: Mutex<BTreeSet<(PackageKind, String)>>,
    taps: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingPackages {
    /// Actions issued so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget the recorded calls, keeping what is installed.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn outcome(changed: bool) -> PackageOutcome {
    if changed {
        PackageOutcome::Applied
    } else {
        PackageOutcome::AlreadySatisfied
    }
}

impl PackageManager for RecordingPackages {
    fn install(&self, kind: PackageKind, name: &str, _: bool) -> Result<PackageOutcome> {
        self.record(format!("install {kind} {name}"));
        Ok(outcome(
            self.installed
                .lock()
                .unwrap()
                .insert((kind, name.to_string())),
        ))
    }

    fn remove(&self, kind: PackageKind, name: &str) -> Result<PackageOutcome> {
        self.record(format!("remove {kind} {name}"));
        Ok(outcome(
            self.installed
                .lock()
                .unwrap()
                .remove(&(kind, name.to_string())),
        ))
    }

    fn tap(&self, name: &str) -> Result<PackageOutcome> {
        self.record(format!("tap {name}"));
        Ok(outcome(self.taps.lock().unwrap().insert(name.to_string())))
    }

    fn untap(&self, name: &str) -> Result<PackageOutcome> {
        self.record(format!("untap {name}"));
        Ok(outcome(self.taps.lock().unwrap().remove(name)))
    }

    fn list(&self, kind: PackageKind) -> Result<BTreeSet<String>> {
        Ok(self
            .installed
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, n)| n.clone())
            .collect())
    }

    fn dependents(&self, _: PackageKind, _: &str) -> Result<BTreeSet<String>> {
        Ok(BTreeSet::new())
    }
}

/// Preference writer that records `"domain key value"` lines.
#[derive(Debug, Default)]
pub struct RecordingDefaults {
    writes: Mutex<Vec<String>>,
}

impl RecordingDefaults {
    /// Writes issued so far.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl PreferenceWriter for RecordingDefaults {
    fn write(&self, domain: &str, key: &str, value: &Value, _: bool) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(format!("{domain} {key} {value}"));
        Ok(())
    }

    fn delete(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }
}

/// Icon setter that does nothing.
#[derive(Debug, Default)]
pub struct NoIcons;

impl IconSetter for NoIcons {
    fn set_icon(&self, _: &Path, _: &Path) -> Result<()> {
        Ok(())
    }

    fn remove_icon(&self, _: &Path) -> Result<()> {
        Ok(())
    }
}

/// An isolated machine: a temporary home with a `.cider` tool directory,
/// an `Applications` folder and a trash, plus recording fakes.
pub struct Sandbox {
    /// Temporary directory holding everything else.
    pub dir: tempfile::TempDir,
    /// Everything logged through the context.
    pub log: Arc<MemoryLog>,
    /// The package manager fake.
    pub packages: Arc<RecordingPackages>,
    /// The preference writer fake.
    pub defaults: Arc<RecordingDefaults>,
    /// The script runner fake.
    pub runner: Arc<ScriptRunner>,
}

impl Sandbox {
    /// Create a sandbox whose scripts all succeed.
    pub fn new() -> Self {
        Self::with_runner(ScriptRunner::default())
    }

    /// Create a sandbox with the given script runner.
    pub fn with_runner(runner: ScriptRunner) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("home/.cider/symlinks"))
            .expect("create symlink root");
        Self {
            dir,
            log: Arc::new(MemoryLog::new()),
            packages: Arc::new(RecordingPackages::default()),
            defaults: Arc::new(RecordingDefaults::default()),
            runner: Arc::new(runner),
        }
    }

    /// The fake home directory.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// The tool directory.
    pub fn root(&self) -> PathBuf {
        self.home().join(".cider")
    }

    /// A context bound to this sandbox's fakes.
    pub fn context(&self) -> Context {
        Context {
            paths: Paths::new(self.root()),
            home: self.home(),
            kind: PackageKind::Formula,
            log: Arc::clone(&self.log) as Arc<dyn Log>,
            executor: Arc::clone(&self.runner) as Arc<dyn Executor>,
            packages: Arc::clone(&self.packages) as Arc<dyn PackageManager>,
            defaults: Arc::clone(&self.defaults) as Arc<dyn PreferenceWriter>,
            apps: Arc::new(MacApps::with_dirs(vec![self.dir.path().join("Applications")])),
            icons: Arc::new(NoIcons),
            trash: Arc::new(SystemTrash::new(self.dir.path().join("trash"))),
        }
    }

    /// A preflight that passes on this sandbox.
    pub fn preflight(&self) -> Preflight {
        Preflight {
            os_version: Some("14.4.1".to_string()),
            toolchain: self.dir.path().to_path_buf(),
        }
    }

    /// Write `bootstrap.json`.
    pub fn write_manifest(&self, doc: &Value) {
        cider_cli::store::save(&self.root().join("bootstrap.json"), doc)
            .expect("write manifest");
    }

    /// Write `defaults.json`.
    pub fn write_defaults(&self, doc: &Value) {
        cider_cli::store::save(&self.root().join("defaults.json"), doc)
            .expect("write defaults");
    }

    /// Create a file under the managed symlink root.
    pub fn add_source(&self, relative: &str) -> PathBuf {
        let path = self.root().join("symlinks").join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create source dir");
        std::fs::write(&path, relative).expect("write source");
        path
    }

    /// Raw bytes of a file under the tool directory.
    pub fn bytes(&self, relative: &str) -> Vec<u8> {
        std::fs::read(self.root().join(relative)).expect("read state file")
    }

    /// Parsed snapshot of previously created links.
    pub fn snapshot(&self) -> Value {
        cider_cli::store::load(&self.root().join(".cache/symlink_targets.json"), None)
            .expect("read snapshot")
    }
}
