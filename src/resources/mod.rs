//! Idempotent filesystem resources (classify, plan, apply).
pub mod directory;
pub mod helpers;
pub mod link;
pub mod managed_block;
pub mod reconcile;
pub mod repo;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ResourceError;

/// Observed state of a target path, classified without following a final
/// symlink.
///
/// # Examples
///
/// ```
/// use dotctl::resources::TargetState;
///
/// let wrong = TargetState::WrongLink { points_to: "/gone".into() };
/// assert_ne!(wrong, TargetState::Correct);
/// assert!(TargetState::RegularFile.is_conflict());
/// assert!(!TargetState::Absent.is_conflict());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    /// Nothing exists at the target.
    Absent,
    /// The target already matches the desired state.
    Correct,
    /// The target is a symlink pointing somewhere else (or nowhere).
    WrongLink {
        /// Destination of the existing link.
        points_to: PathBuf,
    },
    /// The target is a regular file.
    RegularFile,
    /// The target is a real directory.
    Directory,
}

impl TargetState {
    /// Whether something unexpected occupies the target.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::WrongLink { .. } | Self::RegularFile | Self::Directory
        )
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Correct => write!(f, "correct"),
            Self::WrongLink { points_to } => write!(f, "link to {}", points_to.display()),
            Self::RegularFile => write!(f, "regular file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// A target the reconciler can classify and create.
///
/// Implementations only know how to inspect their target and how to create it
/// from scratch; moving an existing target out of the way is handled by
/// [`reconcile::reconcile`] according to the conflict policy.
pub trait Resource {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Path the resource occupies.
    fn target(&self) -> &Path;

    /// Classify the current target.
    ///
    /// # Errors
    ///
    /// Returns an error if the target's metadata cannot be read for a reason
    /// other than it being absent.
    fn current_state(&self) -> Result<TargetState, ResourceError>;

    /// Create the target. Called only when the target is known to be absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be created.
    fn create(&self) -> Result<(), ResourceError>;

    /// Check the resource's inputs before anything is touched.
    ///
    /// `dry_run` lets resources whose source is produced during the run (e.g.
    /// rendered templates) accept a source that does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::SourceMissing`] when the source is absent.
    fn source_ready(&self, _dry_run: bool) -> Result<(), ResourceError> {
        Ok(())
    }
}
