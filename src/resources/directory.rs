//! Directory resource with an optional mode.
use std::path::{Path, PathBuf};

use super::{Resource, TargetState};
use crate::error::ResourceError;

/// A directory that should exist, optionally with a permission mode.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Directory path (absolute).
    pub path: PathBuf,
    /// Octal mode applied on creation (Unix only).
    pub mode: Option<u32>,
}

impl DirectoryResource {
    /// Create a new directory resource.
    #[must_use]
    pub const fn new(path: PathBuf, mode: Option<u32>) -> Self {
        Self { path, mode }
    }

    /// Parse an octal mode string such as `"700"`.
    ///
    /// Returns `None` for anything that is not 3 or 4 octal digits.
    #[must_use]
    pub fn parse_mode(mode: &str) -> Option<u32> {
        if !(3..=4).contains(&mode.len()) {
            return None;
        }
        u32::from_str_radix(mode, 8).ok()
    }
}

impl Resource for DirectoryResource {
    fn description(&self) -> String {
        match self.mode {
            Some(mode) => format!("directory {} ({mode:o})", self.path.display()),
            None => format!("directory {}", self.path.display()),
        }
    }

    fn target(&self) -> &Path {
        &self.path
    }

    fn current_state(&self) -> Result<TargetState, ResourceError> {
        let meta = match std::fs::symlink_metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TargetState::Absent),
            Err(e) => return Err(ResourceError::io("inspect", &self.path, e)),
        };
        if meta.is_dir() {
            return Ok(TargetState::Correct);
        }
        if meta.is_symlink() {
            // A link to a directory serves just as well.
            if self.path.is_dir() {
                return Ok(TargetState::Correct);
            }
            let points_to = std::fs::read_link(&self.path)
                .map_err(|e| ResourceError::io("read link", &self.path, e))?;
            return Ok(TargetState::WrongLink { points_to });
        }
        Ok(TargetState::RegularFile)
    }

    fn create(&self) -> Result<(), ResourceError> {
        std::fs::create_dir_all(&self.path)
            .map_err(|e| ResourceError::io("create directory", &self.path, e))?;

        #[cfg(unix)]
        if let Some(mode) = self.mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| ResourceError::io("set mode on", &self.path, e))?;
        }

        Ok(())
    }
}
