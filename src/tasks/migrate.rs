//! Re-point links left behind by moved sources.
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, record_failure};
use crate::config::dotfiles::{Dotfile, LinkAction};
use crate::config::filter::Filtered as _;
use crate::error::DotctlError;
use crate::logging::EntryStatus;
use crate::resources::Resource as _;
use crate::resources::helpers::fs::remove_path;
use crate::resources::link::LinkResource;

/// Re-point links that still target a source's old (legacy) location.
///
/// Runs before linking so the link task sees the new link as correct
/// instead of treating the stale one as a conflict.
#[derive(Debug)]
pub struct MigrateLegacyLinks;

impl Task for MigrateLegacyLinks {
    fn name(&self) -> &'static str {
        "Migrate legacy links"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.legacy_paths.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        for (name, dotfile) in &ctx.config.entries.dotfiles {
            if dotfile.action == LinkAction::Copy || dotfile.template || dotfile.gate(ctx.host()).is_err()
            {
                continue;
            }
            let olds = ctx
                .config
                .legacy_paths
                .iter()
                .filter(|(_, new)| **new == dotfile.source)
                .map(|(old, _)| old);
            for old in olds {
                match migrate_one(ctx, dotfile, old) {
                    Ok(None) => {}
                    Ok(Some(message)) => {
                        let status = if ctx.dry_run {
                            ctx.log.dry_run(&message);
                            EntryStatus::DryRun
                        } else {
                            ctx.log.info(&message);
                            EntryStatus::Applied
                        };
                        ctx.log.record(self.name(), Some(name), status, Some(&message));
                        stats.count(status);
                    }
                    Err(e) => record_failure(ctx, &mut stats, self.name(), name, &e),
                }
            }
        }
        Ok(stats.finish(ctx))
    }
}

/// Re-point the target of `dotfile` if it links to `old`. Returns a
/// description of the change, or `None` when there is nothing to migrate.
fn migrate_one(ctx: &Context, dotfile: &Dotfile, old: &str) -> Result<Option<String>, DotctlError> {
    let target = ctx.expand(&dotfile.target_or_default())?;
    let Ok(dest) = std::fs::read_link(&target) else {
        return Ok(None);
    };
    let old_path = ctx.root().join(old);
    if resolve_link(&target, dest) != old_path {
        return Ok(None);
    }
    let new_path = ctx.resolve_source(&dotfile.source)?;
    let message = format!(
        "{}: {} -> {}",
        target.display(),
        old_path.display(),
        new_path.display()
    );
    if ctx.dry_run {
        return Ok(Some(format!("would re-point {message}")));
    }
    remove_path(&target)?;
    LinkResource::new(new_path, target, dotfile.action).create()?;
    Ok(Some(format!("re-pointed {message}")))
}

fn resolve_link(link: &Path, dest: PathBuf) -> PathBuf {
    if dest.is_absolute() {
        return dest;
    }
    match link.parent() {
        Some(parent) => parent.join(dest),
        None => dest,
    }
}
