//! Check that required tools are on `PATH`.
use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::logging::EntryStatus;

/// Warn about required programs missing from `PATH`.
#[derive(Debug)]
pub struct CheckTools;

impl Task for CheckTools {
    fn name(&self) -> &'static str {
        "Check tools"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.entries.tools.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        let mut seen = std::collections::BTreeSet::new();
        for tool in &ctx.config.entries.tools {
            if !seen.insert(tool.as_str()) {
                continue;
            }
            if ctx.executor.which(tool) {
                ctx.log.debug(&format!("{tool}: found"));
                ctx.log
                    .record(self.name(), Some(tool), EntryStatus::AlreadyOk, None);
                stats.count(EntryStatus::AlreadyOk);
            } else {
                ctx.log.warn(&format!("{tool}: not found on PATH"));
                ctx.log.record(
                    self.name(),
                    Some(tool),
                    EntryStatus::Warned,
                    Some("not found on PATH"),
                );
                stats.count(EntryStatus::Warned);
            }
        }
        Ok(stats.finish(ctx))
    }
}
