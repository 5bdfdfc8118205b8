//! Configuration: the base file, recipe fragments and the merged result.
pub mod builds;
pub mod collections;
pub mod dotfiles;
pub mod filter;
pub mod paths;
pub mod recipes;
pub mod toml_loader;
pub mod validation;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::platform::Platform;
use collections::Collections;
use recipes::{RecipeSettings, SkippedRecipe};

/// Name of the base configuration file at the dotfiles root.
pub const CONFIG_FILE: &str = "dotctl.toml";

/// What to do with an existing target that is not what the config wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Rename the target to `<target>.bak`, then create.
    #[default]
    Backup,
    /// Remove the target, then create.
    Overwrite,
    /// Leave the target untouched.
    Skip,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backup => "backup",
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
        })
    }
}

/// The `[settings]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default conflict policy.
    pub conflict: ConflictPolicy,
    /// Files receiving the managed shell block; derived from `$SHELL` when
    /// absent.
    pub shell_files: Option<Vec<String>>,
}

/// On-disk shape of `dotctl.toml`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    recipes: RecipeSettings,
    #[serde(flatten)]
    collections: Collections,
}

/// Fully resolved configuration for one host.
#[derive(Debug)]
pub struct Config {
    /// Dotfiles root directory.
    pub root: PathBuf,
    /// Host the configuration was resolved for.
    pub host: String,
    /// Tool settings.
    pub settings: Settings,
    /// Merged entries from the base file and every applicable recipe.
    pub entries: Collections,
    /// Root-relative legacy source paths (old to new).
    pub legacy_paths: BTreeMap<String, String>,
    /// Names of merged recipes, in merge order.
    pub recipes: Vec<String>,
    /// Recipes gated out for this host.
    pub skipped_recipes: Vec<SkippedRecipe>,
}

impl Config {
    /// Load `dotctl.toml` from `root` and merge its recipes for `host`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is missing or malformed, or if
    /// two sources define the same entry.
    pub fn load(root: &Path, host: &str) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        let file: ConfigFile = toml_loader::load(&path)?;
        Self::resolve(root, host, file)
    }

    /// Resolve configuration from in-memory base content.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus the read of the base file.
    pub fn parse(root: &Path, host: &str, content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml_loader::parse(&root.join(CONFIG_FILE), content)?;
        Self::resolve(root, host, file)
    }

    fn resolve(root: &Path, host: &str, file: ConfigFile) -> Result<Self, ConfigError> {
        let host = crate::platform::normalize_host(host);
        let resolution = recipes::resolve(root, file.collections, &file.recipes, &host)?;
        Ok(Self {
            root: root.to_path_buf(),
            host,
            settings: file.settings,
            entries: resolution.collections,
            legacy_paths: resolution.legacy_paths,
            recipes: resolution.recipes,
            skipped_recipes: resolution.skipped,
        })
    }

    /// Files that receive the managed shell block.
    #[must_use]
    pub fn shell_files(&self, platform: &Platform) -> Vec<String> {
        self.settings
            .shell_files
            .clone()
            .unwrap_or_else(|| platform.default_shell_files())
    }

    /// Run every validator and collect the warnings.
    #[must_use]
    pub fn validate(&self) -> Vec<validation::ValidationWarning> {
        validation::validate_all(self)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_config_loads() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let config = Config::load(dir.path(), "laptop").unwrap();
        assert!(config.entries.is_empty());
        assert_eq!(config.settings.conflict, ConflictPolicy::Backup);
        assert!(config.recipes.is_empty());
    }

    #[test]
    fn missing_config_is_load_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path(), "laptop").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn settings_and_collections_parse_together() {
        let dir = TempDir::new().unwrap();
        let config = Config::parse(
            dir.path(),
            "Laptop",
            r#"
            tools = ["git"]
            [settings]
            conflict = "overwrite"
            shell_files = ["~/.zshrc"]
            [dotfiles.zshrc]
            source = "zshrc"
            [env]
            EDITOR = "nvim"
        "#,
        )
        .unwrap();
        assert_eq!(config.host, "laptop");
        assert_eq!(config.settings.conflict, ConflictPolicy::Overwrite);
        assert_eq!(config.entries.dotfiles["zshrc"].target.as_deref(), Some("~/.zshrc"));
        assert_eq!(config.entries.env["EDITOR"], "nvim");
        assert_eq!(config.entries.tools, vec!["git"]);
    }

    #[test]
    fn shell_files_default_from_platform() {
        let dir = TempDir::new().unwrap();
        let config = Config::parse(dir.path(), "h", "").unwrap();
        let platform = Platform::new("h", Some("zsh"));
        assert_eq!(config.shell_files(&platform), vec!["~/.zshrc"]);
    }

    #[test]
    fn invalid_conflict_policy_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::parse(dir.path(), "h", "[settings]\nconflict = \"ask\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn conflict_policy_display_matches_toml() {
        assert_eq!(ConflictPolicy::Backup.to_string(), "backup");
        assert_eq!(ConflictPolicy::Overwrite.to_string(), "overwrite");
        assert_eq!(ConflictPolicy::Skip.to_string(), "skip");
    }
}
