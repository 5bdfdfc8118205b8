//! Conflict planning and plan execution for filesystem resources.
//!
//! Reconciling is split into three steps so each can be tested on its own:
//! classify the target ([`Resource::current_state`]), pick an action with the
//! pure [`plan`] function, then execute (or, in dry-run, describe) it.
use std::fmt;

use super::helpers::fs::{backup_path, move_to_backup, remove_path};
use super::{Resource, TargetState};
use crate::config::ConflictPolicy;
use crate::error::ResourceError;

/// What to do with a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Target is absent: create it.
    Create,
    /// Target already matches: nothing to do.
    AlreadySatisfied,
    /// Move the existing target to a backup path, then create.
    BackupThenCreate,
    /// Remove the existing target, then create.
    RemoveThenCreate,
    /// Leave the existing target untouched.
    Leave,
}

impl Plan {
    /// Whether executing the plan changes the filesystem.
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(
            self,
            Self::Create | Self::BackupThenCreate | Self::RemoveThenCreate
        )
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::AlreadySatisfied => "already satisfied",
            Self::BackupThenCreate => "back up then create",
            Self::RemoveThenCreate => "remove then create",
            Self::Leave => "leave",
        })
    }
}

/// Choose the action for a classified target under a conflict policy.
///
/// Total over every `(state, policy)` pair. A correct target is left alone
/// under every policy.
#[must_use]
pub const fn plan(state: &TargetState, policy: ConflictPolicy) -> Plan {
    match (state, policy) {
        (TargetState::Absent, _) => Plan::Create,
        (TargetState::Correct, _) => Plan::AlreadySatisfied,
        (_, ConflictPolicy::Backup) => Plan::BackupThenCreate,
        (_, ConflictPolicy::Overwrite) => Plan::RemoveThenCreate,
        (_, ConflictPolicy::Skip) => Plan::Leave,
    }
}

/// Result of reconciling one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// State observed before acting.
    pub state: TargetState,
    /// Action chosen.
    pub plan: Plan,
    /// Human-readable description of what happened (or would happen).
    pub message: String,
}

/// Classify, plan and apply one resource.
///
/// In dry-run mode nothing beyond metadata reads happens; the message
/// describes what would be done.
///
/// # Errors
///
/// Returns an error if the source is missing, the target cannot be
/// classified, or any step of the plan fails.
pub fn reconcile(
    resource: &dyn Resource,
    policy: ConflictPolicy,
    dry_run: bool,
) -> Result<Reconciled, ResourceError> {
    resource.source_ready(dry_run)?;
    let state = resource.current_state()?;
    let plan = plan(&state, policy);
    let target = resource.target();
    let description = resource.description();

    let message = match plan {
        Plan::AlreadySatisfied => format!("{description} (already up to date)"),
        Plan::Leave => format!("left {} ({state}, conflict policy skip)", target.display()),
        Plan::Create if dry_run => format!("would create {description}"),
        Plan::BackupThenCreate if dry_run => format!(
            "would back up {} to {} then create {description}",
            target.display(),
            backup_path(target).display()
        ),
        Plan::RemoveThenCreate if dry_run => {
            format!("would remove {} ({state}) then create {description}", target.display())
        }
        Plan::Create => {
            resource.create()?;
            format!("created {description}")
        }
        Plan::BackupThenCreate => {
            let backup = move_to_backup(target)?;
            resource.create()?;
            format!("backed up to {} and created {description}", backup.display())
        }
        Plan::RemoveThenCreate => {
            remove_path(target)?;
            resource.create()?;
            format!("replaced {state} with {description}")
        }
    };

    Ok(Reconciled {
        state,
        plan,
        message,
    })
}
