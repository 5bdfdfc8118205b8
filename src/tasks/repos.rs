//! Clone configured repositories.
use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, record_failure, record_gated, record_reconciled};
use crate::config::filter::Filtered as _;
use crate::resources::reconcile::reconcile;
use crate::resources::repo::RepoResource;

/// Clone configured git repositories.
#[derive(Debug)]
pub struct CloneRepos;

impl Task for CloneRepos {
    fn name(&self) -> &'static str {
        "Clone repositories"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.entries.repos.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        for (name, repo) in &ctx.config.entries.repos {
            if let Err(reason) = repo.gate(ctx.host()) {
                record_gated(ctx, &mut stats, self.name(), name, &reason);
                continue;
            }
            if repo.url.is_empty() {
                record_failure(ctx, &mut stats, self.name(), name, &"repository has no url");
                continue;
            }
            let path = match ctx.expand(&repo.path) {
                Ok(path) => path,
                Err(e) => {
                    record_failure(ctx, &mut stats, self.name(), name, &e);
                    continue;
                }
            };
            let resource = RepoResource::new(repo.url.clone(), path, repo.branch.clone());
            match reconcile(&resource, ctx.conflict, ctx.dry_run) {
                Ok(outcome) => record_reconciled(ctx, &mut stats, self.name(), name, &outcome),
                Err(e) => record_failure(ctx, &mut stats, self.name(), name, &e),
            }
        }
        Ok(stats.finish(ctx))
    }
}
