//! Git repository resource.
use std::path::{Path, PathBuf};

use git2::Repository;
use git2::build::RepoBuilder;

use super::helpers::fs::ensure_parent_dir;
use super::{Resource, TargetState};
use crate::error::ResourceError;

/// A git repository cloned to a local path.
#[derive(Debug, Clone)]
pub struct RepoResource {
    /// Remote URL.
    pub url: String,
    /// Clone destination (absolute).
    pub path: PathBuf,
    /// Branch to check out instead of the remote's default.
    pub branch: Option<String>,
}

impl RepoResource {
    /// Create a new repository resource.
    #[must_use]
    pub const fn new(url: String, path: PathBuf, branch: Option<String>) -> Self {
        Self { url, path, branch }
    }
}

impl Resource for RepoResource {
    fn description(&self) -> String {
        match &self.branch {
            Some(branch) => format!("{} ({} @ {branch})", self.path.display(), self.url),
            None => format!("{} ({})", self.path.display(), self.url),
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
        if meta.is_symlink() && !self.path.exists() {
            let points_to = std::fs::read_link(&self.path)
                .map_err(|e| ResourceError::io("read link", &self.path, e))?;
            return Ok(TargetState::WrongLink { points_to });
        }
        if !self.path.is_dir() {
            return Ok(TargetState::RegularFile);
        }
        if Repository::open(&self.path).is_ok() {
            return Ok(TargetState::Correct);
        }
        let mut entries = std::fs::read_dir(&self.path)
            .map_err(|e| ResourceError::io("read directory", &self.path, e))?;
        if entries.next().is_none() {
            // git clones into an empty directory without complaint.
            return Ok(TargetState::Absent);
        }
        Ok(TargetState::Directory)
    }

    fn create(&self) -> Result<(), ResourceError> {
        ensure_parent_dir(&self.path)?;
        let mut builder = RepoBuilder::new();
        if let Some(branch) = &self.branch {
            builder.branch(branch);
        }
        builder
            .clone(&self.url, &self.path)
            .map(|_| ())
            .map_err(|source| ResourceError::Git {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::ConflictPolicy;
    use crate::resources::reconcile::{Plan, reconcile};

    fn resource(path: PathBuf) -> RepoResource {
        RepoResource::new("https://example.invalid/r.git".to_string(), path, None)
    }

    #[test]
    fn description_mentions_branch() {
        let r = RepoResource::new(
            "https://x/r.git".to_string(),
            PathBuf::from("/src/r"),
            Some("main".to_string()),
        );
        assert_eq!(r.description(), "/src/r (https://x/r.git @ main)");
    }

    #[test]
    fn missing_and_empty_paths_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resource(dir.path().join("r")).current_state().unwrap(),
            TargetState::Absent
        );
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        assert_eq!(
            resource(dir.path().join("empty")).current_state().unwrap(),
            TargetState::Absent
        );
    }

    #[test]
    fn existing_repository_is_correct() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r");
        Repository::init(&path).unwrap();
        let res = reconcile(&resource(path), ConflictPolicy::Backup, false).unwrap();
        assert_eq!(res.plan, Plan::AlreadySatisfied);
    }

    #[test]
    fn populated_non_repository_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("notes"), "x").unwrap();
        assert_eq!(
            resource(path).current_state().unwrap(),
            TargetState::Directory
        );
    }

    #[test]
    fn clones_local_repository() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = dir.path().join("upstream");
        let repo = Repository::init(&upstream).unwrap();
        std::fs::write(upstream.join("README"), "hi").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README")).unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("t", "t@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();

        let dest = dir.path().join("clone");
        let r = RepoResource::new(upstream.to_string_lossy().to_string(), dest.clone(), None);
        let res = reconcile(&r, ConflictPolicy::Backup, false).unwrap();
        assert_eq!(res.plan, Plan::Create);
        assert_eq!(std::fs::read_to_string(dest.join("README")).unwrap(), "hi");
        assert_eq!(r.current_state().unwrap(), TargetState::Correct);
    }

    #[test]
    fn clone_failure_is_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = RepoResource::new(
            dir.path().join("nope").to_string_lossy().to_string(),
            dir.path().join("dest"),
            None,
        );
        assert!(matches!(r.create(), Err(ResourceError::Git { .. })));
    }
}
