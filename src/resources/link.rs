//! Dotfile resource: a symlink to, or a copy of, a source under the root.
use std::path::{Path, PathBuf};

use super::helpers::fs::{copy_dir_recursive, ensure_parent_dir, files_equal, trees_match};
use super::{Resource, TargetState};
use crate::config::dotfiles::LinkAction;
use crate::error::ResourceError;

/// A dotfile placed at its target by symlinking or copying.
#[derive(Debug, Clone)]
pub struct LinkResource {
    /// Absolute source path.
    pub source: PathBuf,
    /// Absolute target path.
    pub target: PathBuf,
    /// How the source is materialised.
    pub action: LinkAction,
    /// The source is produced during the run (rendered template), so a
    /// dry run may not find it yet.
    pub generated: bool,
}

impl LinkResource {
    /// Create a new link resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, action: LinkAction) -> Self {
        Self {
            source,
            target,
            action,
            generated: false,
        }
    }

    /// Mark the source as produced during the run.
    #[must_use]
    pub const fn generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    fn classify_link(&self) -> Result<TargetState, ResourceError> {
        let dest = std::fs::read_link(&self.target)
            .map_err(|e| ResourceError::io("read link", &self.target, e))?;
        if self.action == LinkAction::Copy {
            return Ok(TargetState::WrongLink { points_to: dest });
        }
        let resolved = if dest.is_absolute() {
            dest.clone()
        } else {
            self.target
                .parent()
                .map_or_else(|| dest.clone(), |p| p.join(&dest))
        };
        if paths_equal(&resolved, &self.source) || same_file(&resolved, &self.source) {
            return Ok(TargetState::Correct);
        }
        if !resolved.exists() {
            return Ok(TargetState::WrongLink { points_to: dest });
        }
        // Valid links elsewhere are the user's choice; leave them alone.
        tracing::debug!(
            "{} links to {} instead of {}, leaving it",
            self.target.display(),
            dest.display(),
            self.source.display()
        );
        Ok(TargetState::Correct)
    }

    fn copy_matches(&self) -> bool {
        if self.source.is_dir() {
            trees_match(&self.source, &self.target)
        } else {
            files_equal(&self.source, &self.target)
        }
    }
}

impl Resource for LinkResource {
    fn description(&self) -> String {
        match self.action {
            LinkAction::Copy => {
                format!("{} (copy of {})", self.target.display(), self.source.display())
            }
            LinkAction::Symlink | LinkAction::SymlinkDir => {
                format!("{} -> {}", self.target.display(), self.source.display())
            }
        }
    }

    fn target(&self) -> &Path {
        &self.target
    }

    fn current_state(&self) -> Result<TargetState, ResourceError> {
        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TargetState::Absent),
            Err(e) => return Err(ResourceError::io("inspect", &self.target, e)),
        };
        if meta.is_symlink() {
            return self.classify_link();
        }
        if self.action == LinkAction::Copy
            && self.source.is_dir() == meta.is_dir()
            && self.copy_matches()
        {
            return Ok(TargetState::Correct);
        }
        if meta.is_dir() {
            return Ok(TargetState::Directory);
        }
        Ok(TargetState::RegularFile)
    }

    fn create(&self) -> Result<(), ResourceError> {
        ensure_parent_dir(&self.target)?;
        match self.action {
            LinkAction::Symlink | LinkAction::SymlinkDir => create_symlink(&self.source, &self.target)
                .map_err(|e| ResourceError::io("create link", &self.target, e)),
            LinkAction::Copy if self.source.is_dir() => {
                copy_dir_recursive(&self.source, &self.target)
            }
            LinkAction::Copy => std::fs::copy(&self.source, &self.target)
                .map(|_| ())
                .map_err(|e| ResourceError::io("copy to", &self.target, e)),
        }
    }

    fn source_ready(&self, dry_run: bool) -> Result<(), ResourceError> {
        if dry_run && self.generated {
            return Ok(());
        }
        if !self.source.exists() {
            return Err(ResourceError::SourceMissing(self.source.clone()));
        }
        if self.action == LinkAction::SymlinkDir && !self.source.is_dir() {
            return Err(ResourceError::UnexpectedTarget {
                path: self.source.clone(),
                reason: "symlink_dir source is not a directory".to_string(),
            });
        }
        Ok(())
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Whether both paths canonicalise to the same location.
fn same_file(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}

/// Remove a symlink without touching its destination.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not
/// `remove_file`), so the raw `FILE_ATTRIBUTE_DIRECTORY` flag is checked.
pub(crate) fn remove_symlink(path: &Path, meta: &std::fs::Metadata) -> std::io::Result<()> {
    if is_dir_like(meta) {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Check if metadata represents a directory-like entry.
/// On Windows, `symlink_metadata().is_dir()` returns `false` for directory symlinks,
/// so we check the raw `FILE_ATTRIBUTE_DIRECTORY` bit instead.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}
