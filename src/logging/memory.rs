//! In-memory [`Log`] that records every line instead of printing it.
use std::sync::Mutex;

use super::types::{Log, Outcome, TaskEntry, TaskStatus};

/// Severity of a recorded line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Stage header.
    Stage,
    /// Informational line.
    Info,
    /// Debug line.
    Debug,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

/// A [`Log`] that keeps everything in memory.
///
/// Used wherever the caller needs to inspect what was reported rather than
/// show it, most notably in tests.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<(Level, String)>>,
    tasks: Mutex<Vec<TaskEntry>>,
    outcomes: Mutex<Vec<(Outcome, String)>>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded at `level`, in order.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines.lock().map_or_else(
            |_| Vec::new(),
            |lines| {
                lines
                    .iter()
                    .filter(|(l, _)| *l == level)
                    .map(|(_, m)| m.clone())
                    .collect()
            },
        )
    }

    /// Warning messages, in order.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.messages(Level::Warn)
    }

    /// Error messages, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages(Level::Error)
    }

    /// Recorded task results, in order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| Vec::new(), |t| t.clone())
    }

    /// Item outcomes, in order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<(Outcome, String)> {
        self.outcomes.lock().map_or_else(|_| Vec::new(), |o| o.clone())
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, msg.to_string()));
        }
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(Level::Stage, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }

    fn outcome(&self, outcome: Outcome, msg: &str) {
        let level = match outcome {
            Outcome::Changed => Level::Info,
            Outcome::Satisfied => Level::Debug,
            Outcome::Conflict { forced: true } => Level::Warn,
            Outcome::Conflict { forced: false } | Outcome::Failed => Level::Error,
        };
        self.push(level, msg);
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push((outcome, msg.to_string()));
        }
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
