//! `dotctl` command-line entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use dotctl::cli::{Cli, Command};
use dotctl::commands;
use dotctl::logging::{self, EntryStatus, Logger, RunStatus};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.command.name();
    if matches!(args.command, Command::Version) {
        commands::version::run();
        return ExitCode::SUCCESS;
    }

    logging::init_subscriber(args.verbose, command);
    let log = Arc::new(Logger::new(command));

    let result = match &args.command {
        Command::Apply(opts) => commands::apply::run(&args.global, opts, &log),
        Command::Build(opts) => commands::build::run(&args.global, opts, &log),
        Command::Builds(sub) => commands::builds::run(&args.global, sub, &log),
        Command::Check => commands::check::run(&args.global, &log),
        Command::Version => Ok(()),
    };

    if let Err(e) = &result {
        let message = format!("{e:#}");
        log.error(&message);
        log.record(command, None, EntryStatus::Failed, Some(&message));
    }
    if let Some(path) = &args.global.report
        && let Err(e) = log.write_report(path, args.global.dry_run)
    {
        log.error(&format!("{e:#}"));
        return ExitCode::from(RunStatus::Failed.exit_code());
    }
    ExitCode::from(log.run_status().exit_code())
}
