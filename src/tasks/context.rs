//! Shared state handed to every task.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::builds::LEDGER_FILE;
use crate::config::{Config, ConflictPolicy, paths};
use crate::error::ConfigError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// Shared context for task execution.
pub struct Context {
    /// Resolved configuration; read-only once loaded.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and report recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// User's home directory path.
    pub home: PathBuf,
    /// Directory holding the build ledger and rendered templates.
    pub state_dir: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Conflict policy in effect (settings, overridden by `--conflict`).
    pub conflict: ConflictPolicy,
    /// `--force`: rerun `once` builds that already completed.
    pub force: bool,
    /// Build named on the command line; limits the build task to it.
    pub requested_build: Option<String>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("state_dir", &self.state_dir)
            .field("executor", &"<dyn Executor>")
            .field("conflict", &self.conflict)
            .field("force", &self.force)
            .field("requested_build", &self.requested_build)
            .finish()
    }
}

impl Context {
    /// Creates a new context for task execution.
    ///
    /// The conflict policy starts from the configuration's settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: bool,
        executor: Arc<dyn Executor>,
        state_dir: PathBuf,
    ) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine the home directory"))?;
        Ok(Self::with_home(config, platform, log, dry_run, executor, state_dir, home))
    }

    /// Like [`Context::new`] with an explicit home directory.
    #[must_use]
    pub fn with_home(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: bool,
        executor: Arc<dyn Executor>,
        state_dir: PathBuf,
        home: PathBuf,
    ) -> Self {
        let conflict = config.settings.conflict;
        Self {
            config,
            platform,
            log,
            dry_run,
            home,
            state_dir,
            executor,
            conflict,
            force: false,
            requested_build: None,
        }
    }

    /// Override the conflict policy.
    #[must_use]
    pub const fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }

    /// Set `--force`.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Limit the build task to one named build.
    #[must_use]
    pub fn with_requested_build(mut self, name: Option<String>) -> Self {
        self.requested_build = name;
        self
    }

    /// Root directory of the dotfiles repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Current host name (lowercase).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Expand a home-relative path (`~`, `$VAR`, or relative to home).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Expand`] when a referenced variable is unset.
    pub fn expand(&self, raw: &str) -> Result<PathBuf, ConfigError> {
        paths::expand(raw, &self.home)
    }

    /// Resolve a path that is relative to the dotfiles root unless it is
    /// absolute or starts with `~` / `$`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Expand`] when a referenced variable is unset.
    pub fn resolve_source(&self, raw: &str) -> Result<PathBuf, ConfigError> {
        if paths::is_fragment_relative(raw) {
            Ok(self.root().join(raw))
        } else {
            self.expand(raw)
        }
    }

    /// Path of the build ledger.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE)
    }

    /// Directory receiving rendered templates.
    #[must_use]
    pub fn rendered_dir(&self) -> PathBuf {
        self.state_dir.join("rendered")
    }
}
