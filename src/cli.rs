//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConflictPolicy;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "dotctl",
    about = "Declarative dotfiles, recipes and build steps for your home directory",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Host name used for `hosts` filters
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Directory for the build ledger and rendered templates
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link dotfiles, patch shell files and run builds
    Apply(ApplyOpts),
    /// Run one named build
    Build(BuildOpts),
    /// Inspect or reset the build ledger
    #[command(subcommand)]
    Builds(BuildsCommand),
    /// Load and validate the configuration without changing anything
    Check,
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file and report.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Apply(_) => "apply",
            Self::Build(_) => "build",
            Self::Builds(_) => "builds",
            Self::Check => "check",
            Self::Version => "version",
        }
    }
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ApplyOpts {
    /// What to do with conflicting targets (overrides the config setting)
    #[arg(long, value_enum)]
    pub conflict: Option<ConflictPolicy>,

    /// Rerun `once` builds that already completed
    #[arg(long)]
    pub force: bool,

    /// Skip specific tasks
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only specific tasks
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

/// Options for the `build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BuildOpts {
    /// Build to run
    pub name: String,

    /// Run even if the build already completed
    #[arg(long)]
    pub force: bool,
}

/// `builds` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BuildsCommand {
    /// List builds and their ledger state
    List,
    /// Forget completion records (all builds when no name is given)
    Reset {
        /// Build to forget
        name: Option<String>,
    },
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::unreachable
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply_with_global_flags() {
        let cli = Cli::parse_from([
            "dotctl",
            "--root",
            "/dots",
            "--host",
            "Laptop",
            "-d",
            "apply",
            "--report",
            "out.json",
        ]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/dots")));
        assert_eq!(cli.global.host.as_deref(), Some("Laptop"));
        assert!(cli.global.dry_run);
        assert_eq!(cli.global.report, Some(PathBuf::from("out.json")));
        assert!(matches!(cli.command, Command::Apply(_)));
    }

    #[test]
    fn parse_apply_options() {
        let cli = Cli::parse_from([
            "dotctl",
            "apply",
            "--conflict",
            "skip",
            "--force",
            "--skip",
            "builds,hooks",
        ]);
        let Command::Apply(opts) = cli.command else {
            unreachable!("parsed apply");
        };
        assert_eq!(opts.conflict, Some(ConflictPolicy::Skip));
        assert!(opts.force);
        assert_eq!(opts.skip, vec!["builds", "hooks"]);
        assert!(opts.only.is_empty());
    }

    #[test]
    fn parse_build_requires_name() {
        assert!(Cli::try_parse_from(["dotctl", "build"]).is_err());
        let cli = Cli::parse_from(["dotctl", "build", "neovim", "--force"]);
        let Command::Build(opts) = cli.command else {
            unreachable!("parsed build");
        };
        assert_eq!(opts.name, "neovim");
        assert!(opts.force);
    }

    #[test]
    fn parse_builds_subcommands() {
        let cli = Cli::parse_from(["dotctl", "builds", "list"]);
        assert!(matches!(cli.command, Command::Builds(BuildsCommand::List)));
        let cli = Cli::parse_from(["dotctl", "builds", "reset", "neovim"]);
        assert!(matches!(
            cli.command,
            Command::Builds(BuildsCommand::Reset { name: Some(ref n) }) if n == "neovim"
        ));
        let cli = Cli::parse_from(["dotctl", "builds", "reset"]);
        assert!(matches!(
            cli.command,
            Command::Builds(BuildsCommand::Reset { name: None })
        ));
    }

    #[test]
    fn unknown_conflict_policy_is_rejected() {
        assert!(Cli::try_parse_from(["dotctl", "apply", "--conflict", "merge"]).is_err());
    }

    #[test]
    fn command_names() {
        let cli = Cli::parse_from(["dotctl", "-v", "check"]);
        assert!(cli.verbose);
        assert_eq!(cli.command.name(), "check");
        assert_eq!(Cli::parse_from(["dotctl", "version"]).command.name(), "version");
    }
}
