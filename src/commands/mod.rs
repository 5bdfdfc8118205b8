//! Subcommand orchestration: shared setup, then one module per command.
pub mod apply;
pub mod build;
pub mod builds;
pub mod check;
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{CONFIG_FILE, Config};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{EntryStatus, Log, Logger};
use crate::platform::Platform;
use crate::tasks::{self, Context, Task};

const ROOT_ENV: &str = "DOTCTL_ROOT";
const HOST_ENV: &str = "DOTCTL_HOST";
const STATE_ENV: &str = "DOTCTL_STATE_DIR";

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates root and host resolution and configuration loading so that
/// each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected host.
    pub platform: Arc<Platform>,
    /// Resolved configuration.
    pub config: Arc<Config>,
    /// Ledger and rendered-template directory.
    pub state_dir: PathBuf,
    /// Executor shared by every task.
    pub executor: Arc<dyn Executor>,
}

impl CommandSetup {
    /// Resolve the root, host and state directory, then load and validate
    /// the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be determined or the configuration
    /// fails to load. Nothing on disk has been touched at that point.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        let root = resolve_root(global)?;
        let host = global
            .host
            .clone()
            .or_else(|| std::env::var(HOST_ENV).ok());
        let platform = Platform::detect(host.as_deref(), &*executor);
        let state_dir = resolve_state_dir(global)?;

        log.stage("Loading configuration");
        log.debug(&format!("root: {}", root.display()));
        log.debug(&format!("state: {}", state_dir.display()));
        let config = Config::load(&root, &platform.hostname)?;
        log.info(&format!(
            "host {}: {} recipe(s), {} dotfile(s), {} build(s)",
            config.host,
            config.recipes.len(),
            config.entries.dotfiles.len(),
            config.entries.builds.len()
        ));
        for skipped in &config.skipped_recipes {
            log.debug(&format!("recipe {} skipped: {}", skipped.name, skipped.reason));
        }

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self {
            platform: Arc::new(platform),
            config: Arc::new(config),
            state_dir,
            executor,
        })
    }

    /// Build the task context for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn context(&self, log: Arc<dyn Log>, dry_run: bool) -> Result<Context> {
        Context::new(
            Arc::clone(&self.config),
            Arc::clone(&self.platform),
            log,
            dry_run,
            Arc::clone(&self.executor),
            self.state_dir.clone(),
        )
    }
}

/// Resolve the dotfiles root directory.
///
/// Order: `--root`, `DOTCTL_ROOT`, the current directory if it holds a
/// `dotctl.toml`, then `~/.dotfiles`. A relative choice is made absolute
/// against the current directory, since link targets must point at
/// absolute sources.
///
/// # Errors
///
/// Returns an error if none of the candidates applies.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let env = std::env::var_os(ROOT_ENV).map(PathBuf::from);
    let cwd = std::env::current_dir().ok();
    let home = dirs::home_dir();
    let root = root_candidate(global.root.clone(), env, cwd.as_deref(), home.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!("cannot determine dotfiles root. Use --root or set {ROOT_ENV}")
        })?;
    absolute(&root)
}

fn root_candidate(
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    cwd: Option<&Path>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    explicit
        .or(env)
        .or_else(|| cwd.filter(|c| c.join(CONFIG_FILE).is_file()).map(Path::to_path_buf))
        .or_else(|| home.map(|h| h.join(".dotfiles")))
}

/// Resolve the state directory.
///
/// Order: `--state-dir`, `DOTCTL_STATE_DIR`, the platform state directory,
/// then `~/.local/state`; the last two get a `dotctl` subdirectory. Rendered
/// templates are linked from here, so the result is absolute.
///
/// # Errors
///
/// Returns an error if no candidate applies.
pub fn resolve_state_dir(global: &GlobalOpts) -> Result<PathBuf> {
    let env = std::env::var_os(STATE_ENV).map(PathBuf::from);
    let state = state_candidate(
        global.state_dir.clone(),
        env,
        dirs::state_dir(),
        dirs::home_dir().as_deref(),
    )
    .ok_or_else(|| anyhow::anyhow!("cannot determine the state directory. Use --state-dir"))?;
    absolute(&state)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("cannot make {} absolute", path.display()))
}

fn state_candidate(
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    platform: Option<PathBuf>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    explicit.or(env).or_else(|| {
        platform
            .or_else(|| home.map(|h| h.join(".local").join("state")))
            .map(|dir| dir.join("dotctl"))
    })
}

/// Execute every task in order and print the summary.
///
/// Task failures are recorded, not returned; the caller derives the exit
/// status from the logger.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
) {
    for task in tasks {
        tasks::execute(task, ctx);
    }

    log.print_summary();

    let failed = log.count(EntryStatus::Failed);
    if failed > 0 {
        log.error(&format!("{failed} entr{} failed", if failed == 1 { "y" } else { "ies" }));
    }
}
