//! Structured logger with dry-run awareness and report collection.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{EntryStatus, Log, Report, ReportEntry, RunStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and report collection.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/dotctl/<command>.log` (default `~/.cache/dotctl/<command>.log`)
/// with timestamps and ANSI codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    command: String,
    entries: Mutex<Vec<ReportEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(command, log_file_path(command))
    }

    /// Create a logger that reports `log_file` as its log location.
    #[must_use]
    pub fn with_log_file(command: &str, log_file: Option<PathBuf>) -> Self {
        Self {
            command: command.to_string(),
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record an entry outcome for the report.
    pub fn record(&self, task: &str, item: Option<&str>, status: EntryStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(ReportEntry {
                task: task.to_string(),
                item: item.map(String::from),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the entries with `status`.
    #[must_use]
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries
            .lock()
            .map_or(0, |guard| guard.iter().filter(|e| e.status == status).count())
    }

    /// Worst outcome recorded so far.
    #[must_use]
    pub fn run_status(&self) -> RunStatus {
        self.entries
            .lock()
            .map_or(RunStatus::Failed, |guard| RunStatus::from_entries(guard.iter()))
    }

    /// Build the structured report.
    #[must_use]
    pub fn report(&self, dry_run: bool) -> Report {
        let entries = self.entries();
        Report {
            command: self.command.clone(),
            dry_run,
            status: RunStatus::from_entries(&entries),
            entries,
        }
    }

    /// Write the report as pretty-printed JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be serialised or written.
    pub fn write_report(&self, path: &Path, dry_run: bool) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.report(dry_run))
            .context("serializing run report")?;
        crate::resources::helpers::fs::ensure_parent_dir(path)
            .with_context(|| format!("creating directory for {}", path.display()))?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("writing report to {}", path.display()))
    }

    /// Print the summary of all recorded entries.
    #[allow(clippy::print_stdout)]
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let mut applied = 0u32;
        let mut ok = 0u32;
        let mut not_applicable = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut warned = 0u32;
        let mut failed = 0u32;

        for entry in &entries {
            let (icon, color) = match entry.status {
                EntryStatus::Applied => {
                    applied += 1;
                    ("✓", "\x1b[32m")
                }
                EntryStatus::AlreadyOk => {
                    ok += 1;
                    continue;
                }
                EntryStatus::NotApplicable => {
                    not_applicable += 1;
                    continue;
                }
                EntryStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                EntryStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                EntryStatus::Warned => {
                    warned += 1;
                    ("!", "\x1b[33m")
                }
                EntryStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let label = entry
                .item
                .as_ref()
                .map_or_else(|| entry.task.clone(), |item| format!("{}: {item}", entry.task));
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {label}{suffix}\x1b[0m"));
        }

        println!();
        let total = applied + ok + not_applicable + skipped + dry_run + warned + failed;
        self.info(&format!(
            "{total} entries: \x1b[32m{applied} applied\x1b[0m, {ok} ok, \x1b[2m{not_applicable} n/a\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[33m{warned} warned\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record(&self, task: &str, item: Option<&str>, status: EntryStatus, message: Option<&str>) {
        self.record(task, item, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.entries().is_empty(), "expected empty entry list");
        assert_eq!(log.run_status(), RunStatus::Clean);
    }

    #[test]
    fn record_entry_with_item_and_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record(
            "Link dotfiles",
            Some("zshrc"),
            EntryStatus::Skipped,
            Some("conflict policy skip"),
        );
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item.as_deref(), Some("zshrc"));
        assert_eq!(entries[0].message.as_deref(), Some("conflict policy skip"));
    }

    #[test]
    fn run_status_tracks_worst_entry() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record("a", None, EntryStatus::Applied, None);
        assert_eq!(log.run_status(), RunStatus::Clean);
        log.record("b", None, EntryStatus::Warned, None);
        assert_eq!(log.run_status(), RunStatus::Warnings);
        log.record("c", None, EntryStatus::Failed, Some("boom"));
        assert_eq!(log.run_status(), RunStatus::Failed);
        assert_eq!(log.count(EntryStatus::Failed), 1);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record("via-trait", None, EntryStatus::AlreadyOk, None);
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn messages_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("marker-{}", std::process::id());
        log.stage(&format!("stage-{marker}"));
        log.debug(&format!("debug-{marker}"));
        log.dry_run(&format!("dry-{marker}"));
        log.error(&format!("error-{marker}"));
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains(&format!("==> stage-{marker}")));
        assert!(contents.contains(&format!("[debug] debug-{marker}")));
        assert!(contents.contains(&format!("[dry run] dry-{marker}")));
        assert!(contents.contains(&format!("[error] error-{marker}")));
    }

    #[test]
    fn write_report_produces_json() {
        let (log, tmp, _guard) = isolated_logger();
        log.record("Build", Some("nvim"), EntryStatus::Applied, None);
        let path = tmp.path().join("out").join("report.json");
        log.write_report(&path, false).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["command"], "test");
        assert_eq!(value["status"], "clean");
        assert_eq!(value["entries"][0]["item"], "nvim");
    }
}
