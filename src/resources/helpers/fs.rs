//! File-system resource helpers.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ResourceError;

/// Suffix appended to a target moved out of the way by the backup policy.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ResourceError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| ResourceError::io("create parent", parent, e))?;
    }
    Ok(())
}

/// Remove whatever is at `path`: a file, a symlink (dangling or not, never
/// its destination), or a real directory tree.
///
/// Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<(), ResourceError> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else if meta.is_symlink() {
        crate::resources::link::remove_symlink(path, &meta)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| ResourceError::io("remove", path, e))
}

/// First free backup name for `target`: `<target>.bak`, then `<target>.bak.1`,
/// `<target>.bak.2`, and so on.
#[must_use]
pub fn backup_path(target: &Path) -> PathBuf {
    let base = {
        let mut s = target.as_os_str().to_os_string();
        s.push(BACKUP_SUFFIX);
        PathBuf::from(s)
    };
    if base.symlink_metadata().is_err() {
        return base;
    }
    (1u32..)
        .map(|n| {
            let mut s = base.as_os_str().to_os_string();
            s.push(format!(".{n}"));
            PathBuf::from(s)
        })
        .find(|p| p.symlink_metadata().is_err())
        .unwrap_or(base)
}

/// Rename `target` to its backup path and return that path.
///
/// # Errors
///
/// Returns an error if the rename fails.
pub fn move_to_backup(target: &Path) -> Result<PathBuf, ResourceError> {
    let backup = backup_path(target);
    std::fs::rename(target, &backup).map_err(|e| ResourceError::io("back up", target, e))?;
    Ok(backup)
}

/// Recursively copy a directory tree.
///
/// Symlinks within the source tree are *followed*: the function uses
/// [`Path::is_dir`] (which follows symlinks) so directory symlinks are
/// recursed into and their contents materialised rather than copying the
/// link itself.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), ResourceError> {
    std::fs::create_dir_all(dst).map_err(|e| ResourceError::io("create directory", dst, e))?;
    let entries = std::fs::read_dir(src).map_err(|e| ResourceError::io("read directory", src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ResourceError::io("read entry in", src, e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)
                .map_err(|e| ResourceError::io("copy", &src_path, e))?;
        }
    }
    Ok(())
}

/// Whether `dst` holds the same tree as `src`: the same entry names at every
/// level and byte-identical files.
///
/// Source symlinks are followed, matching [`copy_dir_recursive`]. Anything
/// unreadable counts as a mismatch.
#[must_use]
pub fn trees_match(src: &Path, dst: &Path) -> bool {
    let (Ok(names), Ok(dst_names)) = (entry_names(src), entry_names(dst)) else {
        return false;
    };
    if names != dst_names {
        return false;
    }
    names.iter().all(|name| {
        let (s, d) = (src.join(name), dst.join(name));
        let Ok(meta) = d.symlink_metadata() else {
            return false;
        };
        if s.is_dir() {
            meta.is_dir() && trees_match(&s, &d)
        } else {
            meta.is_file() && files_equal(&s, &d)
        }
    })
}

/// Whether both files can be read and have identical contents.
#[must_use]
pub fn files_equal(a: &Path, b: &Path) -> bool {
    match (std::fs::read(a), std::fs::read(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn entry_names(dir: &Path) -> std::io::Result<Vec<OsString>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

/// Write `contents` to `path` through a sibling temporary file and a rename,
/// so readers never observe a half-written file.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".dotctl-tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}
