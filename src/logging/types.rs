//! Core logging types: report entries, statuses, and the [`Log`] trait.
use serde::Serialize;

/// Outcome of one entry (or one whole task) for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Task that produced the entry (e.g. "Link dotfiles").
    pub task: String,
    /// Entry name within the task, or `None` for a task-level record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    /// Final status.
    pub status: EntryStatus,
    /// Optional detail message (e.g., skip reason or error description).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Status of a processed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// A change was made.
    Applied,
    /// The entry already matched the desired state.
    AlreadyOk,
    /// Dry-run mode; the change was only described.
    DryRun,
    /// Deliberately not processed (conflict policy `skip`, build gate).
    Skipped,
    /// Gated out by `hosts` / `enabled`.
    NotApplicable,
    /// Processed with a warning (e.g. missing tool).
    Warned,
    /// The entry could not be processed.
    Failed,
}

/// Worst outcome of a run, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Nothing failed or warned.
    Clean,
    /// At least one warning, no failures.
    Warnings,
    /// At least one failure.
    Failed,
}

impl RunStatus {
    /// Fold a set of entries into the worst status.
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ReportEntry>) -> Self {
        entries
            .into_iter()
            .map(|e| match e.status {
                EntryStatus::Failed => Self::Failed,
                EntryStatus::Warned => Self::Warnings,
                _ => Self::Clean,
            })
            .max()
            .unwrap_or(Self::Clean)
    }

    /// Process exit code for this status.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Warnings => 1,
            Self::Failed => 2,
        }
    }
}

/// Structured run report written by `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Subcommand that produced the report.
    pub command: String,
    /// Whether the run was a dry run.
    pub dry_run: bool,
    /// Worst outcome.
    pub status: RunStatus,
    /// Every recorded entry, in processing order.
    pub entries: Vec<ReportEntry>,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes through `tracing`; tests can
/// substitute any implementation that collects records.
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
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an entry outcome for the report.
    fn record(&self, task: &str, item: Option<&str>, status: EntryStatus, message: Option<&str>);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry(status: EntryStatus) -> ReportEntry {
        ReportEntry {
            task: "t".to_string(),
            item: None,
            status,
            message: None,
        }
    }

    #[test]
    fn run_status_is_worst_outcome() {
        assert_eq!(RunStatus::from_entries(&[]), RunStatus::Clean);
        assert_eq!(
            RunStatus::from_entries(&[entry(EntryStatus::Applied), entry(EntryStatus::Skipped)]),
            RunStatus::Clean
        );
        assert_eq!(
            RunStatus::from_entries(&[entry(EntryStatus::Warned), entry(EntryStatus::AlreadyOk)]),
            RunStatus::Warnings
        );
        assert_eq!(
            RunStatus::from_entries(&[entry(EntryStatus::Failed), entry(EntryStatus::Warned)]),
            RunStatus::Failed
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(RunStatus::Clean.exit_code(), 0);
        assert_eq!(RunStatus::Warnings.exit_code(), 1);
        assert_eq!(RunStatus::Failed.exit_code(), 2);
    }

    #[test]
    fn report_entry_serializes_without_empty_fields() {
        let json = serde_json::to_string(&entry(EntryStatus::AlreadyOk)).unwrap();
        assert_eq!(json, r#"{"task":"t","status":"already_ok"}"#);
    }

    #[test]
    fn report_serializes_status() {
        let report = Report {
            command: "apply".to_string(),
            dry_run: true,
            status: RunStatus::Warnings,
            entries: vec![ReportEntry {
                task: "Check tools".to_string(),
                item: Some("nvim".to_string()),
                status: EntryStatus::Warned,
                message: Some("not found on PATH".to_string()),
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "warnings");
        assert_eq!(value["entries"][0]["item"], "nvim");
        assert_eq!(value["entries"][0]["status"], "warned");
    }
}
