//! Production [`Log`] backend: tracing events plus a per-phase summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{CHANGED, CONFLICT, ITEM_FAILED, SATISFIED, STAGE, SUMMARY};
use super::types::{Log, Outcome, TaskEntry, TaskStatus};
use super::utils::log_file_path;

/// Forward `fn(&self, &str)` methods of [`Log`] to the inherent methods of
/// the same name.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Emits everything as [`tracing`] events and remembers each phase's
/// result so [`print_summary`](Self::print_summary) can list them.
///
/// The file layer installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) writes every
/// event to `$XDG_CACHE_HOME/cider/<command>.log`, whatever the console
/// verbosity.
#[derive(Debug)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`.  The log file itself is opened by the
    /// subscriber; only its path is kept here for the summary.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Where this run's log file lives.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Phase results recorded so far.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Report one item under its class's target.
    pub fn outcome(&self, outcome: Outcome, msg: &str) {
        match outcome {
            Outcome::Changed => tracing::info!(target: CHANGED, "{msg}"),
            Outcome::Satisfied => tracing::debug!(target: SATISFIED, "{msg}"),
            Outcome::Conflict { forced: true } => {
                tracing::warn!(target: CONFLICT, "{msg}");
            }
            Outcome::Conflict { forced: false } => {
                tracing::error!(target: CONFLICT, "{msg}");
            }
            Outcome::Failed => tracing::error!(target: ITEM_FAILED, "{msg}"),
        }
    }

    /// Record a phase result for the summary.
    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.tasks.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Whether any phase aborted.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Number of phases that aborted.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.tasks.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|t| t.status == TaskStatus::Failed)
                .count()
        })
    }

    /// Emit one summary row per recorded phase, then the totals.
    pub fn print_summary(&self) {
        let tasks = self.task_entries();
        if tasks.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        for task in &tasks {
            let suffix = task
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            tracing::info!(
                target: SUMMARY,
                status = task.status.label(),
                "{}{suffix}",
                task.name
            );
        }

        println!();
        self.info(&format!(
            "{} phases: \x1b[32m{} ok\x1b[0m, \x1b[2m{} n/a\x1b[0m, \x1b[33m{} with skipped items\x1b[0m, \x1b[31m{} failed\x1b[0m",
            tasks.len(),
            count(TaskStatus::Ok),
            count(TaskStatus::NotApplicable),
            count(TaskStatus::Skipped),
            count(TaskStatus::Failed),
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.record_task(name, status, message);
    }

    fn outcome(&self, outcome: Outcome, msg: &str) {
        self.outcome(outcome, msg);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    /// `XDG_CACHE_HOME` is process-wide; tests that point it at a temp dir
    /// take this lock first.
    static CACHE_ENV: Mutex<()> = Mutex::new(());

    /// A logger whose events land in a private log file for the lifetime of
    /// the returned guard.
    fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
        use super::super::subscriber::FileLayer;
        use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

        let tmp = tempfile::tempdir().unwrap();
        let (layer, log) = {
            let _env = CACHE_ENV
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            // SAFETY: serialized by CACHE_ENV and reset before it is released.
            #[allow(unsafe_code)]
            unsafe {
                std::env::set_var("XDG_CACHE_HOME", tmp.path());
            }
            let built = (FileLayer::new("test").unwrap(), Logger::new("test"));
            #[allow(unsafe_code)]
            unsafe {
                std::env::remove_var("XDG_CACHE_HOME");
            }
            built
        };
        let subscriber = tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG));
        let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
        (log, tmp, guard)
    }

    fn file_contents(log: &Logger) -> String {
        fs::read_to_string(log.log_path().unwrap()).unwrap()
    }

    #[test]
    fn records_tasks_in_order() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("Relink symlinks", TaskStatus::Ok, None);
        log.record_task("Install packages", TaskStatus::Skipped, Some("1 failed"));
        let tasks = log.task_entries();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "Relink symlinks");
        assert_eq!(tasks[1].message.as_deref(), Some("1 failed"));
    }

    #[test]
    fn failure_count_only_counts_failed() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(!log.has_failures());
        log.record_task("a", TaskStatus::Ok, None);
        log.record_task("b", TaskStatus::Failed, Some("error 1"));
        log.record_task("c", TaskStatus::Skipped, None);
        assert_eq!(log.failure_count(), 1);
        assert!(log.has_failures());
    }

    #[test]
    fn debug_always_reaches_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        assert!(file_contents(&log).contains(&format!("[debug] {marker}")));
    }

    #[test]
    fn outcomes_are_tagged_by_class() {
        let (log, _tmp, _guard) = isolated_logger();
        log.outcome(Outcome::Changed, "linked ~/.vimrc");
        log.outcome(Outcome::Satisfied, "git");
        log.outcome(Outcome::Conflict { forced: false }, "~/.zshrc is a file");
        log.outcome(Outcome::Conflict { forced: true }, "~/.gitconfig");
        log.outcome(Outcome::Failed, "wget: no such formula");
        let contents = file_contents(&log);
        assert!(contents.contains("[changed] linked ~/.vimrc"));
        assert!(contents.contains("[ok] git"));
        assert!(contents.contains("[conflict] ~/.zshrc is a file"));
        assert!(contents.contains("[conflict, forced] ~/.gitconfig"));
        assert!(contents.contains("[skipped] wget: no such formula"));
    }

    #[test]
    fn summary_rows_carry_status() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("Add taps", TaskStatus::NotApplicable, None);
        log.record_task("Apply icons", TaskStatus::Skipped, Some("1 skipped"));
        log.print_summary();
        let contents = file_contents(&log);
        assert!(contents.contains("==> Summary"));
        assert!(contents.contains("[n/a] Add taps"));
        assert!(contents.contains("[skipped] Apply icons (1 skipped)"));
        assert!(contents.contains("2 phases:"));
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_task("via-trait", TaskStatus::Ok, None);
        log_ref.outcome(Outcome::Changed, "via-trait-outcome");
        assert_eq!(log.task_entries().len(), 1);
        assert!(file_contents(&log).contains("[changed] via-trait-outcome"));
    }
}
