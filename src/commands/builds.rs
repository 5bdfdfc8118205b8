//! Command: inspect and reset the build ledger.
use std::path::Path;

use anyhow::{Result, bail};

use crate::builds::{BuildLedger, LEDGER_FILE};
use crate::cli::{BuildsCommand, GlobalOpts};
use crate::config::Config;
use crate::logging::Logger;

/// Run a `builds` subcommand.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written, or `reset`
/// names a build with no record.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, command: &BuildsCommand, log: &Logger) -> Result<()> {
    let state_dir = super::resolve_state_dir(global)?;
    let ledger_path = state_dir.join(LEDGER_FILE);
    match command {
        BuildsCommand::List => {
            let setup = super::CommandSetup::init(global, log)?;
            for line in list(&setup.config, &BuildLedger::load(&ledger_path)?) {
                println!("{line}");
            }
            Ok(())
        }
        BuildsCommand::Reset { name } => reset(&ledger_path, name.as_deref(), global.dry_run, log),
    }
}

/// One line per configured build, plus ledger records with no build.
fn list(config: &Config, ledger: &BuildLedger) -> Vec<String> {
    let mut lines: Vec<String> = config
        .entries
        .builds
        .iter()
        .map(|(name, build)| {
            let state = ledger.get(name).map_or_else(
                || "never completed".to_string(),
                |record| {
                    let hash = record
                        .git_hash
                        .as_deref()
                        .map(|h| format!(" at {}", h.get(..12).unwrap_or(h)))
                        .unwrap_or_default();
                    format!("completed {}{hash}", record.completed_at.to_rfc3339())
                },
            );
            format!("{name} ({}): {state}", build.run)
        })
        .collect();
    lines.extend(
        ledger
            .builds
            .keys()
            .filter(|name| !config.entries.builds.contains_key(*name))
            .map(|name| format!("{name}: recorded, no longer configured")),
    );
    lines
}

fn reset(path: &Path, name: Option<&str>, dry_run: bool, log: &Logger) -> Result<()> {
    let mut ledger = BuildLedger::load(path)?;
    match name {
        Some(name) => {
            if !ledger.remove(name) {
                bail!("no ledger record for build '{name}'");
            }
            if dry_run {
                log.dry_run(&format!("would forget build {name}"));
                return Ok(());
            }
            log.info(&format!("forgot build {name}"));
        }
        None => {
            let count = ledger.builds.len();
            ledger.clear();
            if dry_run {
                log.dry_run(&format!("would forget {count} build record(s)"));
                return Ok(());
            }
            log.info(&format!("forgot {count} build record(s)"));
        }
    }
    ledger.save(path)?;
    Ok(())
}
