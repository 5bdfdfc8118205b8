//! Named, sequential tasks that wire configuration to resources.
pub mod builds;
pub mod context;
pub mod directories;
pub mod dotfiles;
pub mod hooks;
pub mod migrate;
pub mod repos;
pub mod shell;
pub mod tools;

pub use context::Context;

use anyhow::Result;

use crate::config::filter::GateReason;
use crate::logging::EntryStatus;
use crate::resources::reconcile::{Plan, Reconciled};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotctl::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("nothing configured".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed.
    Ok,
    /// Task was skipped as a whole.
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for tasks that process many entries.
///
/// # Examples
///
/// ```
/// use dotctl::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 3, already_ok: 10, ..TaskStats::default() };
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3, failed: 1 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped, 1 failed");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Entries changed (or that would change in dry-run).
    pub changed: u32,
    /// Entries already in the desired state.
    pub already_ok: u32,
    /// Entries skipped by a filter, policy or gate.
    pub skipped: u32,
    /// Entries that failed.
    pub failed: u32,
}

impl TaskStats {
    /// Format the summary string.
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        let mut out = format!("{} {verb}, {} already ok", self.changed, self.already_ok);
        if self.skipped > 0 {
            out.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            out.push_str(&format!(", {} failed", self.failed));
        }
        out
    }

    /// Count one recorded status.
    pub const fn count(&mut self, status: EntryStatus) {
        match status {
            EntryStatus::Applied | EntryStatus::DryRun => self.changed += 1,
            EntryStatus::AlreadyOk => self.already_ok += 1,
            EntryStatus::Skipped | EntryStatus::NotApplicable | EntryStatus::Warned => {
                self.skipped += 1;
            }
            EntryStatus::Failed => self.failed += 1,
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &'static str;

    /// Whether this task has anything to do for the current configuration.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// Per-entry failures are recorded and do not fail the task.
    ///
    /// # Errors
    ///
    /// Returns an error only when the task as a whole cannot proceed.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The tasks run by `apply`, in execution order.
#[must_use]
pub fn all_apply_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(tools::CheckTools),
        Box::new(hooks::RunHooks::pre_link()),
        Box::new(directories::CreateDirectories),
        Box::new(repos::CloneRepos),
        Box::new(migrate::MigrateLegacyLinks),
        Box::new(dotfiles::LinkDotfiles),
        Box::new(shell::PatchShellFiles),
        Box::new(hooks::RunHooks::post_link()),
        Box::new(builds::RunBuilds),
    ]
}

/// Execute a task, recording task-level outcomes in the logger.
pub fn execute(task: &dyn Task, ctx: &Context) {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record(task.name(), None, EntryStatus::NotApplicable, None);
        return;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok | TaskResult::DryRun) => {}
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record(task.name(), None, EntryStatus::Skipped, Some(&reason));
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record(task.name(), None, EntryStatus::Failed, Some(&format!("{e:#}")));
        }
    }
}

/// Record an entry gated out by `hosts` / `enabled`.
pub(crate) fn record_gated(
    ctx: &Context,
    stats: &mut TaskStats,
    task: &str,
    item: &str,
    reason: &GateReason,
) {
    ctx.log.debug(&format!("{item}: not applicable ({reason})"));
    let reason = reason.to_string();
    ctx.log
        .record(task, Some(item), EntryStatus::NotApplicable, Some(&reason));
    stats.count(EntryStatus::NotApplicable);
}

/// Record an entry failure and keep going.
pub(crate) fn record_failure(
    ctx: &Context,
    stats: &mut TaskStats,
    task: &str,
    item: &str,
    err: &dyn std::fmt::Display,
) {
    let message = err.to_string();
    ctx.log.error(&format!("{item}: {message}"));
    ctx.log
        .record(task, Some(item), EntryStatus::Failed, Some(&message));
    stats.count(EntryStatus::Failed);
}

/// Log and record the outcome of one reconciled resource.
pub(crate) fn record_reconciled(
    ctx: &Context,
    stats: &mut TaskStats,
    task: &str,
    item: &str,
    outcome: &Reconciled,
) {
    let status = match outcome.plan {
        Plan::AlreadySatisfied => {
            ctx.log.debug(&outcome.message);
            EntryStatus::AlreadyOk
        }
        Plan::Leave => {
            ctx.log.warn(&outcome.message);
            EntryStatus::Skipped
        }
        _ if ctx.dry_run => {
            ctx.log.dry_run(&outcome.message);
            EntryStatus::DryRun
        }
        _ => {
            ctx.log.info(&outcome.message);
            EntryStatus::Applied
        }
    };
    let message = (status != EntryStatus::AlreadyOk).then_some(outcome.message.as_str());
    ctx.log.record(task, Some(item), status, message);
    stats.count(status);
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use std::path::PathBuf;
    use std::sync::Arc;
    use test_helpers::{empty_config, sandbox_context};

    /// A mock task for testing `execute()`.
    struct MockTask {
        should_run: bool,
        result: Result<TaskResult, String>,
    }

    impl Task for MockTask {
        fn name(&self) -> &'static str {
            "mock"
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    fn run_mock(should_run: bool, result: Result<TaskResult, String>) -> Vec<EntryStatus> {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, log) = sandbox_context(
            empty_config(PathBuf::from("/tmp")),
            dir.path(),
            dir.path(),
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        execute(&MockTask { should_run, result }, &ctx);
        log.entries().into_iter().map(|e| e.status).collect()
    }

    #[test]
    fn execute_records_non_applicable_task() {
        assert_eq!(
            run_mock(false, Ok(TaskResult::Ok)),
            vec![EntryStatus::NotApplicable]
        );
    }

    #[test]
    fn execute_records_nothing_for_ok_task() {
        assert!(run_mock(true, Ok(TaskResult::Ok)).is_empty());
        assert!(run_mock(true, Ok(TaskResult::DryRun)).is_empty());
    }

    #[test]
    fn execute_records_failed_task() {
        assert_eq!(
            run_mock(true, Err("kaboom".to_string())),
            vec![EntryStatus::Failed]
        );
    }

    #[test]
    fn execute_records_skipped_task() {
        assert_eq!(
            run_mock(true, Ok(TaskResult::Skipped("not needed".to_string()))),
            vec![EntryStatus::Skipped]
        );
    }

    #[test]
    fn apply_task_order() {
        let names: Vec<&str> = all_apply_tasks().iter().map(|t| t.name()).collect();
        insta::assert_yaml_snapshot!(names, @r"
        - Check tools
        - Run pre-link hooks
        - Create directories
        - Clone repositories
        - Migrate legacy links
        - Link dotfiles
        - Patch shell files
        - Run post-link hooks
        - Run builds
        ");
    }

    #[test]
    fn stats_count_statuses() {
        let mut stats = TaskStats::default();
        for s in [
            EntryStatus::Applied,
            EntryStatus::DryRun,
            EntryStatus::AlreadyOk,
            EntryStatus::NotApplicable,
            EntryStatus::Failed,
        ] {
            stats.count(s);
        }
        assert_eq!(
            stats,
            TaskStats {
                changed: 2,
                already_ok: 1,
                skipped: 1,
                failed: 1
            }
        );
    }
}
