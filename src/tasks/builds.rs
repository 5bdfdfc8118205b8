//! Run configured builds through the build gate.
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use super::{Context, Task, TaskResult, TaskStats, record_failure, record_gated};
use crate::builds::{BuildLedger, CommandGitProbe, Decision, GateInput, GitProbe, should_run};
use crate::config::builds::{Build, RunMode};
use crate::config::filter::Filtered as _;
use crate::error::{BuildError, DotctlError};
use crate::logging::EntryStatus;

/// Run build steps that pass the run-mode gate.
#[derive(Debug)]
pub struct RunBuilds;

impl Task for RunBuilds {
    fn name(&self) -> &'static str {
        "Run builds"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.entries.builds.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let git = CommandGitProbe::new(&*ctx.executor);
        run_with(ctx, &git)
    }
}

/// Run the build task with an explicit git probe.
///
/// # Errors
///
/// Returns an error when the build ledger cannot be loaded.
pub fn run_with(ctx: &Context, git: &dyn GitProbe) -> Result<TaskResult> {
    let task = RunBuilds.name();
    let mut stats = TaskStats::default();
    let ledger_path = ctx.ledger_path();
    let mut ledger = BuildLedger::load(&ledger_path)?;

    let requested = ctx.requested_build.as_deref();
    for (name, build) in &ctx.config.entries.builds {
        if requested.is_some_and(|r| r != name.as_str()) {
            continue;
        }
        if let Err(reason) = build.gate(ctx.host()) {
            record_gated(ctx, &mut stats, task, name, &reason);
            continue;
        }
        let working_dir = match build
            .working_dir
            .as_deref()
            .map(|wd| ctx.resolve_source(wd))
            .transpose()
        {
            Ok(wd) => wd,
            Err(e) => {
                record_failure(ctx, &mut stats, task, name, &e);
                continue;
            }
        };

        let input = GateInput {
            name,
            run_mode: build.run,
            working_dir: working_dir.as_deref(),
            force: ctx.force,
            requested,
        };
        let reason = match should_run(&input, &ledger, git) {
            Decision::Skip(reason) => {
                let reason = reason.to_string();
                ctx.log.debug(&format!("{name}: {reason}"));
                ctx.log
                    .record(task, Some(name), EntryStatus::Skipped, Some(&reason));
                stats.count(EntryStatus::Skipped);
                continue;
            }
            Decision::Run(reason) => reason,
        };

        if ctx.dry_run {
            let msg = format!("would build {name} ({reason})");
            ctx.log.dry_run(&msg);
            ctx.log
                .record(task, Some(name), EntryStatus::DryRun, Some(&msg));
            stats.count(EntryStatus::DryRun);
            continue;
        }

        ctx.log.info(&format!("building {name} ({reason})"));
        let run_dir = working_dir.clone().unwrap_or_else(|| ctx.root().to_path_buf());
        if let Err(e) = run_commands(ctx, name, build, &run_dir) {
            record_failure(ctx, &mut stats, task, name, &e);
            continue;
        }
        if build.run == RunMode::Once
            && let Err(e) = remember(&mut ledger, &ledger_path, name, working_dir, git)
        {
            record_failure(ctx, &mut stats, task, name, &e);
            continue;
        }
        let msg = format!("built {name}");
        ctx.log.info(&msg);
        ctx.log
            .record(task, Some(name), EntryStatus::Applied, Some(&msg));
        stats.count(EntryStatus::Applied);
    }
    Ok(stats.finish(ctx))
}

/// Run each command with `sh -c`, stopping at the first failure.
fn run_commands(ctx: &Context, name: &str, build: &Build, dir: &std::path::Path) -> Result<(), BuildError> {
    for command in &build.commands {
        ctx.log.debug(&format!("{name}: {command}"));
        ctx.executor
            .run_in(dir, "sh", &["-c", command.as_str()])
            .map_err(|e| BuildError::CommandFailed {
                build: name.to_string(),
                command: command.clone(),
                reason: format!("{e:#}"),
            })?;
    }
    Ok(())
}

/// Record a completed `once` build and persist the ledger.
fn remember(
    ledger: &mut BuildLedger,
    path: &std::path::Path,
    name: &str,
    working_dir: Option<PathBuf>,
    git: &dyn GitProbe,
) -> Result<(), DotctlError> {
    let hash = working_dir.and_then(|wd| git.head_hash(&wd));
    ledger.record(name, hash, Utc::now());
    ledger.save(path)?;
    Ok(())
}
