//! Command: run one named build.
use std::sync::Arc;

use anyhow::{Result, bail};

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{BuildOpts, GlobalOpts};
use crate::logging::{Log, Logger};
use crate::tasks::Task;
use crate::tasks::builds::RunBuilds;

/// Run a single named build through the build gate.
///
/// # Errors
///
/// Returns an error if configuration loading fails or no build has that
/// name.
pub fn run(global: &GlobalOpts, opts: &BuildOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    if !setup.config.entries.builds.contains_key(&opts.name) {
        bail!("unknown build '{}'", opts.name);
    }
    let ctx = setup
        .context(Arc::clone(log) as Arc<dyn Log>, global.dry_run)?
        .with_force(opts.force)
        .with_requested_build(Some(opts.name.clone()));
    let task: &dyn Task = &RunBuilds;
    run_tasks_to_completion([task], &ctx, log);
    Ok(())
}
