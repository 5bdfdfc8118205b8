//! Non-fatal configuration checks.
use std::path::{Component, Path};

use super::Config;
use super::collections::{Directory, Repo};
use super::builds::Build;
use super::dotfiles::Dotfile;
use std::collections::BTreeMap;

/// Minimum length for octal mode strings.
const OCTAL_MODE_MIN_LEN: usize = 3;

/// Maximum length for octal mode strings.
const OCTAL_MODE_MAX_LEN: usize = 4;

/// A validation warning detected after configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The collection the entry belongs to (e.g., "dotfiles", "builds").
    pub source: String,
    /// The entry that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for configuration validators.
///
/// Validators never fail; problems that would break an apply are reported
/// as warnings so `check` can list all of them at once.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    fn validate(&self, root: &Path) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator (e.g., "dotfiles").
    #[allow(dead_code)] // Part of trait contract; implementors define it
    fn name(&self) -> &'static str;
}

/// Validator for dotfile entries.
#[derive(Debug)]
pub struct DotfileValidator<'a> {
    dotfiles: &'a BTreeMap<String, Dotfile>,
}

impl<'a> DotfileValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(dotfiles: &'a BTreeMap<String, Dotfile>) -> Self {
        Self { dotfiles }
    }
}

impl ConfigValidator for DotfileValidator<'_> {
    fn validate(&self, root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, dotfile) in self.dotfiles {
            let source = dotfile.source.as_str();
            if source.trim().is_empty() {
                warnings.push(ValidationWarning::new("dotfiles", name, "source is empty"));
                continue;
            }

            // `~` and `$VAR` sources are only known at apply time
            if source.starts_with('~') || source.starts_with('$') {
                continue;
            }

            if Path::new(source)
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                warnings.push(ValidationWarning::new(
                    "dotfiles",
                    name,
                    format!("source '{source}' escapes the dotfiles root"),
                ));
            }

            let source_path = root.join(source);
            if !source_path.exists() {
                warnings.push(ValidationWarning::new(
                    "dotfiles",
                    name,
                    format!("source file does not exist: {}", source_path.display()),
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "dotfiles"
    }
}

/// Validates an octal mode string (e.g., "700", "0755").
///
/// Returns `Some(error_message)` if the mode is invalid, or `None` if valid.
fn validate_octal_mode(mode: &str) -> Option<String> {
    if !mode.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!(
            "invalid octal mode '{mode}': must contain only digits"
        ));
    }

    if mode.len() < OCTAL_MODE_MIN_LEN || mode.len() > OCTAL_MODE_MAX_LEN {
        return Some(format!(
            "invalid mode length '{mode}': must be {OCTAL_MODE_MIN_LEN} or {OCTAL_MODE_MAX_LEN} digits"
        ));
    }

    if let Some(c) = mode.chars().find(|&c| c > '7') {
        return Some(format!("invalid octal digit '{c}' in mode '{mode}'"));
    }

    None
}

/// Validator for directory entries.
#[derive(Debug)]
pub struct DirectoryValidator<'a> {
    directories: &'a BTreeMap<String, Directory>,
}

impl<'a> DirectoryValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(directories: &'a BTreeMap<String, Directory>) -> Self {
        Self { directories }
    }
}

impl ConfigValidator for DirectoryValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, dir) in self.directories {
            if dir.path.trim().is_empty() {
                warnings.push(ValidationWarning::new("directories", name, "path is empty"));
            }
            if let Some(error) = dir.mode.as_deref().and_then(validate_octal_mode) {
                warnings.push(ValidationWarning::new("directories", name, error));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "directories"
    }
}

/// Validator for repository entries.
#[derive(Debug)]
pub struct RepoValidator<'a> {
    repos: &'a BTreeMap<String, Repo>,
}

impl<'a> RepoValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(repos: &'a BTreeMap<String, Repo>) -> Self {
        Self { repos }
    }
}

impl ConfigValidator for RepoValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        self.repos
            .iter()
            .filter(|(_, repo)| repo.url.trim().is_empty())
            .map(|(name, _)| ValidationWarning::new("repos", name, "repository has no url"))
            .collect()
    }

    fn name(&self) -> &'static str {
        "repos"
    }
}

/// Validator for build entries.
#[derive(Debug)]
pub struct BuildValidator<'a> {
    builds: &'a BTreeMap<String, Build>,
}

impl<'a> BuildValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(builds: &'a BTreeMap<String, Build>) -> Self {
        Self { builds }
    }
}

impl ConfigValidator for BuildValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        self.builds
            .iter()
            .filter(|(_, build)| build.commands.iter().all(|c| c.trim().is_empty()))
            .map(|(name, _)| ValidationWarning::new("builds", name, "build has no commands"))
            .collect()
    }

    fn name(&self) -> &'static str {
        "builds"
    }
}

/// Run every validator against a resolved configuration.
#[must_use]
pub fn validate_all(config: &Config) -> Vec<ValidationWarning> {
    let entries = &config.entries;
    let validators: [&dyn ConfigValidator; 4] = [
        &DotfileValidator::new(&entries.dotfiles),
        &DirectoryValidator::new(&entries.directories),
        &RepoValidator::new(&entries.repos),
        &BuildValidator::new(&entries.builds),
    ];
    validators
        .iter()
        .flat_map(|v| v.validate(&config.root))
        .collect()
}
