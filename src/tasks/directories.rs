//! Ensure configured directories.
use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, record_failure, record_gated, record_reconciled};
use crate::config::filter::Filtered as _;
use crate::resources::directory::DirectoryResource;
use crate::resources::reconcile::reconcile;

/// Create configured directories.
#[derive(Debug)]
pub struct CreateDirectories;

impl Task for CreateDirectories {
    fn name(&self) -> &'static str {
        "Create directories"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.entries.directories.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        for (name, dir) in &ctx.config.entries.directories {
            if let Err(reason) = dir.gate(ctx.host()) {
                record_gated(ctx, &mut stats, self.name(), name, &reason);
                continue;
            }
            let path = match ctx.expand(&dir.path) {
                Ok(path) => path,
                Err(e) => {
                    record_failure(ctx, &mut stats, self.name(), name, &e);
                    continue;
                }
            };
            let mode = dir.mode.as_deref().and_then(DirectoryResource::parse_mode);
            let resource = DirectoryResource::new(path, mode);
            match reconcile(&resource, ctx.conflict, ctx.dry_run) {
                Ok(outcome) => record_reconciled(ctx, &mut stats, self.name(), name, &outcome),
                Err(e) => record_failure(ctx, &mut stats, self.name(), name, &e),
            }
        }
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::collections::Directory;
    use crate::logging::EntryStatus;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{empty_config, sandbox_context};
    use std::sync::Arc;

    #[test]
    fn creates_home_relative_directory_and_gates_hosts() {
        let home = tempfile::tempdir().unwrap();
        let mut config = empty_config(home.path().join("dots"));
        config.entries.directories.insert(
            "projects".to_string(),
            Directory {
                path: "~/projects".to_string(),
                ..Directory::default()
            },
        );
        config.entries.directories.insert(
            "work".to_string(),
            Directory {
                path: "work".to_string(),
                hosts: vec!["workbox".to_string()],
                ..Directory::default()
            },
        );
        let (ctx, log) = sandbox_context(
            config,
            home.path(),
            home.path(),
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        CreateDirectories.run(&ctx).unwrap();
        assert!(home.path().join("projects").is_dir());
        assert!(!home.path().join("work").exists());
        let statuses: Vec<_> = log.entries().into_iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![EntryStatus::Applied, EntryStatus::NotApplicable]
        );
    }
}
