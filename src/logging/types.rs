//! Reporting vocabulary shared by every [`Log`] backend.

/// One phase's line in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Phase name as shown to the user.
    pub name: String,
    /// How the phase ended.
    pub status: TaskStatus,
    /// Counts or error text shown after the name.
    pub message: Option<String>,
}

/// How a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Every item was applied or already in place.
    Ok,
    /// The manifest declares nothing for this phase.
    NotApplicable,
    /// The phase finished but some items were skipped.
    Skipped,
    /// The phase aborted the run.
    Failed,
}

impl TaskStatus {
    const ALL: [Self; 4] = [Self::Ok, Self::NotApplicable, Self::Skipped, Self::Failed];

    /// Stable label carried in the `status` field of summary events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotApplicable => "n/a",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Inverse of [`label`](Self::label).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Summary glyph and its ANSI colour.
    #[must_use]
    pub const fn marker(self) -> (&'static str, &'static str) {
        match self {
            Self::Ok => ("✓", "\x1b[32m"),
            Self::NotApplicable => ("·", "\x1b[2m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}

/// Result class of one reconciled item (a package, tap, link, preference
/// or icon).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The system was changed to match the manifest.
    Changed,
    /// Nothing to do.
    Satisfied,
    /// Something else occupies the item's place.  With `forced` it was
    /// moved aside and this is a warning; otherwise it is an error.
    Conflict {
        /// Whether `--force` was given.
        forced: bool,
    },
    /// The item could not be applied and is counted as skipped.
    Failed,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes through `tracing`;
/// [`MemoryLog`](super::memory::MemoryLog) keeps everything in memory so
/// callers can assert on what was reported.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a task result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);

    /// Report how one item turned out.  Satisfied items are debug output,
    /// forced conflicts warnings, unforced conflicts and failures errors.
    fn outcome(&self, outcome: Outcome, msg: &str);
}
