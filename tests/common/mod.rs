// Shared helpers for integration tests.
//
// Provides a temporary dotfiles root, home and state directory plus a fluent
// builder so each integration test can set up an isolated environment
// without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotctl::config::Config;
use dotctl::exec::{Executor, SystemExecutor};
use dotctl::logging::{EntryStatus, Log, Logger};
use dotctl::platform::Platform;
use dotctl::tasks::{self, Context};

/// Host every test runs as unless it says otherwise.
pub const HOST: &str = "laptop";

/// An isolated dotfiles root, home directory and state directory backed by a
/// [`tempfile::TempDir`].
pub struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    /// Dotfiles repository root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("dots")
    }

    /// Home directory used for `~` expansion.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// State directory (ledger and rendered templates).
    pub fn state(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    /// Write `content` to `root/rel`, creating parent directories.
    pub fn write_root(&self, rel: &str, content: &str) {
        write(&self.root().join(rel), content);
    }

    /// Write `content` to `home/rel`, creating parent directories.
    pub fn write_home(&self, rel: &str, content: &str) {
        write(&self.home().join(rel), content);
    }

    /// Read `home/rel` as a string.
    pub fn read_home(&self, rel: &str) -> String {
        std::fs::read_to_string(self.home().join(rel)).expect("read home file")
    }

    /// Load the configuration for `host`.
    pub fn load(&self, host: &str) -> Result<Config, dotctl::error::ConfigError> {
        Config::load(&self.root(), host)
    }

    /// Build a task context for `config` with the real executor.
    pub fn context(&self, config: Config, dry_run: bool) -> (Context, Arc<Logger>) {
        let log = Arc::new(Logger::with_log_file("test", None));
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        let ctx = Context::with_home(
            Arc::new(config),
            Arc::new(Platform::new(HOST, Some("zsh"))),
            Arc::clone(&log) as Arc<dyn Log>,
            dry_run,
            executor,
            self.state(),
            self.home(),
        );
        (ctx, log)
    }

    /// Load the configuration and run every apply task once.
    pub fn apply(&self, dry_run: bool) -> Vec<(String, EntryStatus)> {
        let config = self.load(HOST).expect("load config");
        let (ctx, log) = self.context(config, dry_run);
        for task in tasks::all_apply_tasks() {
            tasks::execute(task.as_ref(), &ctx);
        }
        log.entries()
            .into_iter()
            .filter_map(|e| e.item.map(|item| (item, e.status)))
            .collect()
    }
}

/// Fluent builder for [`Sandbox`].
pub struct SandboxBuilder {
    sandbox: Sandbox,
}

impl SandboxBuilder {
    /// Begin with empty root and home directories and no `dotctl.toml`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let sandbox = Sandbox { dir };
        std::fs::create_dir_all(sandbox.root()).expect("create root");
        std::fs::create_dir_all(sandbox.home()).expect("create home");
        Self { sandbox }
    }

    /// Write the base `dotctl.toml`.
    pub fn config(self, content: &str) -> Self {
        self.sandbox.write_root("dotctl.toml", content);
        self
    }

    /// Write `recipes/<name>/recipe.toml`.
    pub fn recipe(self, name: &str, content: &str) -> Self {
        self.sandbox
            .write_root(&format!("recipes/{name}/recipe.toml"), content);
        self
    }

    /// Write any file under the root.
    pub fn file(self, rel: &str, content: &str) -> Self {
        self.sandbox.write_root(rel, content);
        self
    }

    /// Write any file under the home directory.
    pub fn home_file(self, rel: &str, content: &str) -> Self {
        self.sandbox.write_home(rel, content);
        self
    }

    /// Finish building.
    pub fn build(self) -> Sandbox {
        self.sandbox
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    std::fs::write(path, content).expect("write file");
}

/// Status recorded for `item`, if any.
pub fn status_of(entries: &[(String, EntryStatus)], item: &str) -> Option<EntryStatus> {
    entries
        .iter()
        .find(|(name, _)| name == item)
        .map(|(_, status)| *status)
}
