//! Command: load and validate the configuration without touching anything.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::logging::{EntryStatus, Logger};

const TASK: &str = "Validate configuration";

/// Run the check command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded (parse errors,
/// recipe conflicts, invalid patterns).
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    record(&setup.config, log);
    log.print_summary();
    Ok(())
}

/// Record the loaded recipes and every validation warning.
fn record(config: &Config, log: &Logger) {
    for recipe in &config.recipes {
        log.record("Resolve recipes", Some(recipe), EntryStatus::AlreadyOk, None);
    }
    for skipped in &config.skipped_recipes {
        log.record(
            "Resolve recipes",
            Some(&skipped.name),
            EntryStatus::NotApplicable,
            Some(&skipped.reason),
        );
    }
    for warning in config.validate() {
        log.record(
            TASK,
            Some(&warning.item),
            EntryStatus::Warned,
            Some(&format!("{}: {}", warning.source, warning.message)),
        );
    }
}
