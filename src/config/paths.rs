//! Path rewriting and expansion helpers shared by the resolver and tasks.
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Whether `path` is relative to the fragment that declared it.
///
/// Absolute paths and paths starting with `~` or `$` are left alone by
/// recipe rewriting.
#[must_use]
pub fn is_fragment_relative(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('~')
        && !path.starts_with('$')
        && !Path::new(path).is_absolute()
}

/// Prefix a fragment-relative path with the fragment directory.
///
/// `dir` is `/`-separated and relative to the dotfiles root; an empty `dir`
/// (the root itself) leaves the path unchanged apart from a leading `./`.
#[must_use]
pub fn prefix(dir: &str, path: &str) -> String {
    let path = path.trim_start_matches("./");
    if !is_fragment_relative(path) || dir.is_empty() {
        return path.to_string();
    }
    format!("{}/{path}", dir.trim_end_matches('/'))
}

/// Expand `~` and `$VAR` references, resolving relative results against
/// `home`.
///
/// # Errors
///
/// Returns [`ConfigError::Expand`] when a referenced variable is unset.
pub fn expand(raw: &str, home: &Path) -> Result<PathBuf, ConfigError> {
    let home_str = home.to_string_lossy().into_owned();
    let expanded = shellexpand::full_with_context(
        raw,
        || Some(home_str),
        |var| std::env::var(var).map(Some),
    )
    .map_err(|e| ConfigError::Expand {
        input: raw.to_string(),
        message: e.to_string(),
    })?;
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(home.join(path))
    }
}

/// Render `path` relative to `root` with `/` separators, or the full path
/// when it lies outside `root`.
#[must_use]
pub fn relative_to(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
