//! Recipe fragments: discovery, gating, path rewriting and merging.
//!
//! A recipe is a `recipe.toml` file carrying the same collections as the base
//! configuration plus a `[recipe]` header. Fragments are found either from an
//! explicit `include` list or by scanning the recipe directory, then merged
//! into the base configuration one at a time.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::collections::{Collections, Merger};
use super::filter::{self, Enabled, GateReason};
use super::paths;
use super::toml_loader;
use crate::error::ConfigError;

/// File name that marks a recipe directory.
pub const RECIPE_FILE: &str = "recipe.toml";

/// Label used for the base configuration in conflict messages.
pub const BASE_SOURCE: &str = "dotctl.toml";

/// The `[recipes]` table of the base configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecipeSettings {
    /// Explicit recipe references, merged in order.
    pub include: Vec<String>,
    /// Discover every `recipe.toml` under `dir`.
    pub auto: bool,
    /// Recipe directory, relative to the dotfiles root.
    pub dir: String,
    /// Glob patterns excluding discovered recipe directories.
    pub exclude: Vec<String>,
    /// Per-directory overrides of a fragment's own gate.
    pub overrides: BTreeMap<String, RecipeOverride>,
}

impl Default for RecipeSettings {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            auto: false,
            dir: "recipes".to_string(),
            exclude: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }
}

/// Gate values that replace a fragment's own `[recipe]` values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipeOverride {
    /// Replaces the fragment's `enabled` unless inherited.
    pub enabled: Enabled,
    /// Replaces the fragment's `hosts` when present.
    pub hosts: Option<Vec<String>>,
}

/// The `[recipe]` header of a fragment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipeMeta {
    /// Display name; defaults to the directory name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Enable flag for the whole fragment.
    pub enabled: Enabled,
    /// Hosts the whole fragment applies to (empty = all).
    pub hosts: Vec<String>,
    /// Old source path to new source path, fragment-relative.
    pub legacy_paths: BTreeMap<String, String>,
}

/// On-disk shape of a recipe file.
#[derive(Debug, Deserialize)]
struct RecipeFile {
    #[serde(default)]
    recipe: RecipeMeta,
    #[serde(flatten)]
    collections: Collections,
}

/// A loaded recipe fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Display name.
    pub name: String,
    /// Fragment directory relative to the dotfiles root (`/`-separated).
    pub dir: String,
    /// Optional description.
    pub description: Option<String>,
    /// Effective enable flag after overrides.
    pub enabled: Enabled,
    /// Effective host list after overrides.
    pub hosts: Vec<String>,
    /// Entries contributed by this fragment.
    pub collections: Collections,
    /// Legacy path mappings.
    pub legacy_paths: BTreeMap<String, String>,
}

impl Fragment {
    /// Load a fragment from `path`, applying any override keyed by its
    /// directory name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] or [`ConfigError::Parse`].
    pub fn load(
        root: &Path,
        path: &Path,
        overrides: &BTreeMap<String, RecipeOverride>,
    ) -> Result<Self, ConfigError> {
        let file: RecipeFile = toml_loader::load(path)?;
        let parent = path.parent().unwrap_or(root);
        let dir_name = parent
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let over = overrides.get(&dir_name);

        let meta = file.recipe;
        let enabled = over.map_or(Enabled::Inherited, |o| o.enabled).or(meta.enabled);
        let hosts = over
            .and_then(|o| o.hosts.clone())
            .unwrap_or(meta.hosts)
            .iter()
            .map(|h| crate::platform::normalize_host(h))
            .collect();

        Ok(Self {
            name: meta.name.unwrap_or(dir_name),
            dir: paths::relative_to(parent, root),
            description: meta.description,
            enabled,
            hosts,
            collections: file.collections,
            legacy_paths: meta.legacy_paths,
        })
    }

    /// Label used in conflict messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("recipe '{}'", self.name)
    }

    /// Evaluate the fragment-level gate.
    ///
    /// # Errors
    ///
    /// Returns the [`GateReason`] when the fragment must be skipped.
    pub fn gate(&self, host: &str) -> Result<(), GateReason> {
        filter::check(self.enabled, &self.hosts, host)
    }

    /// Normalise entries, rewrite fragment-relative paths to root-relative
    /// ones and push the fragment host filter down onto its entries.
    pub fn prepare(&mut self) {
        self.collections.normalize();
        self.collections.rewrite_paths(&self.dir);
        self.collections.inherit_hosts(&self.hosts);
        self.legacy_paths = std::mem::take(&mut self.legacy_paths)
            .into_iter()
            .map(|(old, new)| (paths::prefix(&self.dir, &old), paths::prefix(&self.dir, &new)))
            .collect();
    }
}

/// A fragment that was found but not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecipe {
    /// Fragment name.
    pub name: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of merging the base configuration with its recipes.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Merged collections.
    pub collections: Collections,
    /// Root-relative legacy path mappings (old to new).
    pub legacy_paths: BTreeMap<String, String>,
    /// Names of merged fragments, in merge order.
    pub recipes: Vec<String>,
    /// Fragments gated out for this host.
    pub skipped: Vec<SkippedRecipe>,
}

/// Turn one `include` reference into a recipe file path.
///
/// References containing `/` or ending in `.toml` are paths relative to the
/// root (or absolute); anything else names a directory under `dir`.
#[must_use]
pub fn reference_path(root: &Path, dir: &str, reference: &str) -> PathBuf {
    if reference.contains('/') || reference.ends_with(".toml") {
        root.join(reference)
    } else {
        root.join(dir).join(reference).join(RECIPE_FILE)
    }
}

/// List the recipe files to merge, in merge order.
///
/// # Errors
///
/// Returns [`ConfigError::RecipeModeConflict`] when both modes are set, and
/// pattern or I/O errors from discovery.
pub fn discover(root: &Path, settings: &RecipeSettings) -> Result<Vec<PathBuf>, ConfigError> {
    if settings.auto && !settings.include.is_empty() {
        return Err(ConfigError::RecipeModeConflict);
    }
    if !settings.auto {
        return Ok(settings
            .include
            .iter()
            .map(|r| reference_path(root, &settings.dir, r))
            .collect());
    }

    let patterns = settings
        .exclude
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| ConfigError::InvalidPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let recipe_dir = root.join(&settings.dir);
    let mut found = Vec::new();
    if recipe_dir.is_dir() {
        scan(&recipe_dir, &mut found)?;
    }
    found.sort();

    Ok(found
        .into_iter()
        .filter(|file| {
            let parent = file.parent().unwrap_or(&recipe_dir);
            let rel = paths::relative_to(parent, &recipe_dir);
            let name = parent
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            !patterns.iter().any(|p| p.matches(&rel) || p.matches(&name))
        })
        .collect())
}

fn scan(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            scan(&path, found)?;
        } else if entry.file_name() == RECIPE_FILE {
            found.push(path);
        }
    }
    Ok(())
}

/// Merge `base` with every recipe selected by `settings` for `host`.
///
/// # Errors
///
/// Returns the first load, parse, discovery or conflict error; nothing is
/// partially merged from the failing fragment.
pub fn resolve(
    root: &Path,
    mut base: Collections,
    settings: &RecipeSettings,
    host: &str,
) -> Result<Resolution, ConfigError> {
    base.normalize();
    let mut merger = Merger::new();
    merger.merge(BASE_SOURCE, base)?;

    let mut resolution = Resolution::default();
    for path in discover(root, settings)? {
        let mut fragment = Fragment::load(root, &path, &settings.overrides)?;
        if let Err(reason) = fragment.gate(host) {
            tracing::debug!("skipping recipe {}: {reason}", fragment.name);
            resolution.skipped.push(SkippedRecipe {
                name: fragment.name,
                reason: reason.to_string(),
            });
            continue;
        }
        fragment.prepare();
        let label = fragment.label();
        merger.merge(&label, fragment.collections)?;
        resolution.legacy_paths.extend(fragment.legacy_paths);
        resolution.recipes.push(fragment.name);
    }

    resolution.collections = merger.into_collections();
    Ok(resolution)
}
