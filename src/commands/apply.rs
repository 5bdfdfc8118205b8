//! Command: apply the configuration to the home directory.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{ApplyOpts, GlobalOpts};
use crate::logging::{Log, Logger};
use crate::tasks::{self, Task};

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or the home directory
/// cannot be determined. Per-entry failures are only recorded.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let mut ctx = setup
        .context(Arc::clone(log) as Arc<dyn Log>, global.dry_run)?
        .with_force(opts.force);
    if let Some(conflict) = opts.conflict {
        ctx = ctx.with_conflict(conflict);
    }
    log.info(&format!("conflict policy: {}", ctx.conflict));

    let all_tasks = tasks::all_apply_tasks();
    let selected = select_tasks(&all_tasks, &opts.only, &opts.skip);
    run_tasks_to_completion(selected, &ctx, log);
    Ok(())
}

/// Filter tasks by `--only` (takes precedence) or `--skip`, matching
/// case-insensitive substrings of the task name.
fn select_tasks<'a>(
    all: &'a [Box<dyn Task>],
    only: &[String],
    skip: &[String],
) -> Vec<&'a dyn Task> {
    all.iter()
        .filter(|t| {
            let name = t.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            !skip.iter().any(|s| name.contains(&s.to_lowercase()))
        })
        .map(AsRef::as_ref)
        .collect()
}
