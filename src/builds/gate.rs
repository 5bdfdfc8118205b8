//! Decide whether a build runs.
use std::fmt;
use std::path::Path;

use super::git::GitProbe;
use super::ledger::BuildLedger;
use crate::config::builds::RunMode;

/// What the gate needs to know about one build.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    /// Build name.
    pub name: &'a str,
    /// Configured run mode.
    pub run_mode: RunMode,
    /// Expanded working directory, when one is configured.
    pub working_dir: Option<&'a Path>,
    /// `--force` was given.
    pub force: bool,
    /// Build explicitly requested by name (`dotctl build <name>`).
    pub requested: Option<&'a str>,
}

/// Why a build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReason {
    /// Run mode `always`.
    Always,
    /// Manual build requested by name.
    Requested,
    /// No completion record.
    NeverCompleted,
    /// Record exists but `--force` was given.
    Forced,
    /// `HEAD` moved since the recorded build.
    SourceChanged {
        /// Hash recorded at the last build.
        recorded: Option<String>,
        /// Current hash.
        current: String,
    },
    /// Same `HEAD`, but the working tree is dirty.
    UncommittedChanges,
}

impl fmt::Display for RunReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("run mode always"),
            Self::Requested => f.write_str("requested"),
            Self::NeverCompleted => f.write_str("not built yet"),
            Self::Forced => f.write_str("forced"),
            Self::SourceChanged { current, .. } => {
                write!(f, "source changed (now {})", short(current))
            }
            Self::UncommittedChanges => f.write_str("uncommitted changes"),
        }
    }
}

/// Why a build is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Manual build not named on the command line.
    ManualNotRequested,
    /// Completed before and there is no way to detect changes.
    AlreadyCompleted,
    /// Completed before and the checkout is unchanged.
    Unchanged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManualNotRequested => "manual, not requested",
            Self::AlreadyCompleted => "already completed",
            Self::Unchanged => "already completed, no changes",
        })
    }
}

/// Gate outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Execute the build's commands.
    Run(RunReason),
    /// Do nothing.
    Skip(SkipReason),
}

impl Decision {
    /// Whether the build should execute.
    #[must_use]
    pub const fn is_run(&self) -> bool {
        matches!(self, Self::Run(_))
    }
}

/// Decide whether a build executes this run.
///
/// Only reads: the ledger is updated by the caller after a successful build.
#[must_use]
pub fn should_run(input: &GateInput<'_>, ledger: &BuildLedger, git: &dyn GitProbe) -> Decision {
    match input.run_mode {
        RunMode::Always => Decision::Run(RunReason::Always),
        RunMode::Manual if input.requested == Some(input.name) => {
            Decision::Run(RunReason::Requested)
        }
        RunMode::Manual => Decision::Skip(SkipReason::ManualNotRequested),
        RunMode::Once => once(input, ledger, git),
    }
}

fn once(input: &GateInput<'_>, ledger: &BuildLedger, git: &dyn GitProbe) -> Decision {
    let Some(record) = ledger.get(input.name) else {
        return Decision::Run(RunReason::NeverCompleted);
    };
    if input.force {
        return Decision::Run(RunReason::Forced);
    }
    let Some(dir) = input.working_dir else {
        return Decision::Skip(SkipReason::AlreadyCompleted);
    };
    let Some(current) = git.head_hash(dir) else {
        return Decision::Skip(SkipReason::AlreadyCompleted);
    };
    if record.git_hash.as_deref() != Some(current.as_str()) {
        return Decision::Run(RunReason::SourceChanged {
            recorded: record.git_hash.clone(),
            current,
        });
    }
    if git.is_dirty(dir) {
        return Decision::Run(RunReason::UncommittedChanges);
    }
    Decision::Skip(SkipReason::Unchanged)
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
