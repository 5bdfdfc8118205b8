//! Managed text block inside a user-owned file (e.g. `~/.zshrc`).
//!
//! The block is delimited by [`BEGIN_MARKER`] and [`END_MARKER`]. Only the
//! first complete span is managed; every line outside it is preserved
//! verbatim.
use std::path::{Path, PathBuf};

use crate::error::PatchError;

/// Line opening the managed block.
pub const BEGIN_MARKER: &str = "# >>> dotctl managed block >>>";
/// Line closing the managed block.
pub const END_MARKER: &str = "# <<< dotctl managed block <<<";
/// Opening delimiter written by older releases; migrated on sight.
pub const LEGACY_BEGIN_MARKER: &str = "# BEGIN DOTFILES MANAGED";
/// Closing delimiter written by older releases; migrated on sight.
pub const LEGACY_END_MARKER: &str = "# END DOTFILES MANAGED";

/// Outcome of [`patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// Full file content, one entry per line.
    pub lines: Vec<String>,
    /// Whether `lines` differs from the input.
    pub changed: bool,
}

/// Bring the managed block in `lines` up to date with `desired`.
///
/// Pure and idempotent: patching the output again with the same `desired`
/// lines reports `changed == false`.
///
/// # Examples
///
/// ```
/// use dotctl::resources::managed_block::{patch, BEGIN_MARKER, END_MARKER};
///
/// let file = vec!["export PATH=$HOME/bin:$PATH".to_string()];
/// let desired = vec!["alias ll='ls -la'".to_string()];
/// let first = patch(&file, &desired);
/// assert!(first.changed);
/// assert_eq!(first.lines[1], "");
/// assert_eq!(first.lines[2], BEGIN_MARKER);
/// assert_eq!(first.lines.last().map(String::as_str), Some(END_MARKER));
/// assert!(!patch(&first.lines, &desired).changed);
/// ```
#[must_use]
pub fn patch(lines: &[String], desired: &[String]) -> Patched {
    let mut migrated = false;
    let lines: Vec<String> = lines
        .iter()
        .map(|line| match line.trim() {
            LEGACY_BEGIN_MARKER => {
                migrated = true;
                BEGIN_MARKER.to_string()
            }
            LEGACY_END_MARKER => {
                migrated = true;
                END_MARKER.to_string()
            }
            _ => line.clone(),
        })
        .collect();

    let Some((begin, end)) = find_span(&lines) else {
        return Patched {
            lines: append_block(&lines, desired),
            changed: true,
        };
    };

    let interior: Vec<&String> = lines.iter().skip(begin + 1).take(end - begin - 1).collect();
    if block_matches(&interior, desired) {
        return Patched {
            lines,
            changed: migrated,
        };
    }

    let patched = lines
        .iter()
        .take(begin + 1)
        .chain(desired)
        .chain(lines.iter().skip(end))
        .cloned()
        .collect();
    Patched {
        lines: patched,
        changed: true,
    }
}

/// Index of the first begin marker and the first end marker after it.
fn find_span(lines: &[String]) -> Option<(usize, usize)> {
    let begin = lines.iter().position(|l| l.trim() == BEGIN_MARKER)?;
    let end = lines
        .iter()
        .skip(begin + 1)
        .position(|l| l.trim() == END_MARKER)?;
    Some((begin, begin + 1 + end))
}

/// Drop partial blocks, then append a fresh one.
fn append_block(lines: &[String], desired: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + desired.len() + 3);
    let mut in_orphan = false;
    for line in lines {
        let trimmed = line.trim();
        if trimmed == BEGIN_MARKER {
            in_orphan = true;
            continue;
        }
        if trimmed == END_MARKER {
            continue;
        }
        if in_orphan {
            if trimmed.is_empty() {
                in_orphan = false;
            } else {
                continue;
            }
        }
        out.push(line.clone());
    }

    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    if !out.is_empty() {
        out.push(String::new());
    }
    out.push(BEGIN_MARKER.to_string());
    out.extend(desired.iter().cloned());
    out.push(END_MARKER.to_string());
    out
}

fn meaningful<'a>(lines: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    lines
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

fn block_matches(interior: &[&String], desired: &[String]) -> bool {
    let current = meaningful(interior.iter().copied());
    let wanted = meaningful(desired.iter());
    current.len() == wanted.len() && wanted.iter().all(|w| current.contains(w))
}

/// Whether any current or legacy delimiter appears in `lines`.
#[must_use]
pub fn has_markers(lines: &[String]) -> bool {
    lines.iter().any(|l| {
        matches!(
            l.trim(),
            BEGIN_MARKER | END_MARKER | LEGACY_BEGIN_MARKER | LEGACY_END_MARKER
        )
    })
}

/// File I/O around [`patch`]: a shell startup file with a managed block.
///
/// The file's line ending (`\n` or `\r\n`) and whether it ends with a
/// newline are kept when it is rewritten.
#[derive(Debug, Clone)]
pub struct ShellBlockResource {
    /// File holding the block.
    pub path: PathBuf,
    /// Lines the block should contain.
    pub desired: Vec<String>,
    /// Only touch files that already carry a block (or parts of one).
    pub existing_only: bool,
}

impl ShellBlockResource {
    /// Create a new managed-block resource.
    #[must_use]
    pub const fn new(path: PathBuf, desired: Vec<String>) -> Self {
        Self {
            path,
            desired,
            existing_only: false,
        }
    }

    /// Leave files without any delimiter alone instead of appending a block.
    #[must_use]
    pub const fn existing_only(mut self, existing_only: bool) -> Self {
        self.existing_only = existing_only;
        self
    }

    /// File being patched.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file; a missing file is empty.
    fn read(&self) -> Result<String, PatchError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(PatchError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Patch the file. Returns whether it needed changes; in dry-run mode
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] if the file cannot be read or written.
    pub fn apply(&self, dry_run: bool) -> Result<bool, PatchError> {
        let content = self.read()?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        if self.existing_only && !has_markers(&lines) {
            return Ok(false);
        }
        let patched = patch(&lines, &self.desired);
        if !patched.changed || dry_run {
            return Ok(patched.changed);
        }
        let write_err = |source| PatchError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let mut out = patched.lines.join(eol);
        if content.is_empty() || content.ends_with('\n') {
            out.push_str(eol);
        }
        // Plain write so a symlinked rc file keeps its link.
        std::fs::write(&self.path, out).map_err(write_err)?;
        Ok(true)
    }
}
