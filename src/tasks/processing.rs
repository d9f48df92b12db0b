use super::context::Context;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use cider_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("1 changed, 0 already ok, 2 skipped".into());
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed and every item is in place.
    Ok,
    /// Task completed but some items were skipped after per-item errors.
    Skipped(String),
}

/// Counters for batch tasks that process many items.
///
/// Provides consistent summary logging across all tasks.
///
/// # Examples
///
/// ```
/// use cider_cli::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
///
/// assert_eq!(stats.summary(), "3 changed, 10 already ok");
/// ```
///
/// When items are skipped, the summary includes the count:
///
/// ```
/// use cider_cli::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items skipped due to errors.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self) -> String {
        if self.skipped > 0 {
            format!(
                "{} changed, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} changed, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        let summary = self.summary();
        ctx.log.info(&summary);
        if self.skipped > 0 {
            TaskResult::Skipped(summary)
        } else {
            TaskResult::Ok
        }
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::TestContext;

    #[test]
    fn finish_without_skips_is_ok() {
        let t = TestContext::new();
        let stats = TaskStats {
            changed: 2,
            already_ok: 1,
            skipped: 0,
        };
        assert_eq!(stats.finish(&t.ctx), TaskResult::Ok);
        assert_eq!(
            t.log.messages(crate::logging::Level::Info),
            ["2 changed, 1 already ok"]
        );
    }

    #[test]
    fn finish_with_skips_reports_them() {
        let t = TestContext::new();
        let stats = TaskStats {
            changed: 0,
            already_ok: 0,
            skipped: 1,
        };
        assert_eq!(
            stats.finish(&t.ctx),
            TaskResult::Skipped("0 changed, 0 already ok, 1 skipped".to_string())
        );
    }

    #[test]
    fn add_assign_sums_counters() {
        let mut total = TaskStats {
            changed: 1,
            already_ok: 2,
            skipped: 3,
        };
        total += TaskStats {
            changed: 10,
            already_ok: 20,
            skipped: 30,
        };
        assert_eq!(
            total,
            TaskStats {
                changed: 11,
                already_ok: 22,
                skipped: 33
            }
        );
    }
}
