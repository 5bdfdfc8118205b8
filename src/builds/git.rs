//! Git working-tree probe used by the build gate.
use std::path::Path;

use crate::exec::Executor;

/// Read-only view of a git working directory.
#[cfg_attr(test, mockall::automock)]
pub trait GitProbe {
    /// Commit hash of `HEAD`, or `None` if `dir` is not a usable checkout.
    fn head_hash(&self, dir: &Path) -> Option<String>;

    /// Whether the working tree has uncommitted changes.
    fn is_dirty(&self, dir: &Path) -> bool;
}

/// [`GitProbe`] that shells out to `git` through an [`Executor`].
#[derive(Debug)]
pub struct CommandGitProbe<'a> {
    executor: &'a dyn Executor,
}

impl<'a> CommandGitProbe<'a> {
    /// Create a probe running `git` via `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }
}

impl GitProbe for CommandGitProbe<'_> {
    fn head_hash(&self, dir: &Path) -> Option<String> {
        let result = self
            .executor
            .run_unchecked_in(dir, "git", &["rev-parse", "HEAD"])
            .ok()?;
        let hash = result.stdout.trim();
        (result.success && !hash.is_empty()).then(|| hash.to_string())
    }

    fn is_dirty(&self, dir: &Path) -> bool {
        self.executor
            .run_unchecked_in(dir, "git", &["status", "--porcelain"])
            .is_ok_and(|r| r.success && !r.stdout.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn head_hash_trims_output() {
        let exec = MockExecutor::ok("abc123\n");
        let probe = CommandGitProbe::new(&exec);
        assert_eq!(probe.head_hash(Path::new("/src")).as_deref(), Some("abc123"));
        assert_eq!(exec.calls(), vec!["git rev-parse HEAD"]);
    }

    #[test]
    fn head_hash_none_outside_repo() {
        let exec = MockExecutor::fail();
        assert_eq!(CommandGitProbe::new(&exec).head_hash(Path::new("/src")), None);
    }

    #[test]
    fn dirty_when_porcelain_has_output() {
        let exec = MockExecutor::ok(" M src/main.c\n");
        assert!(CommandGitProbe::new(&exec).is_dirty(Path::new("/src")));
        let exec = MockExecutor::ok("");
        assert!(!CommandGitProbe::new(&exec).is_dirty(Path::new("/src")));
    }
}
