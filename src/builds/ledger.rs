//! Persisted record of completed `once` builds.
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::resources::helpers::fs::write_atomic;

/// File name of the ledger inside the state directory.
pub const LEDGER_FILE: &str = "builds.json";

/// Completion record of one `once` build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// When the build last completed successfully.
    pub completed_at: DateTime<Utc>,
    /// HEAD of the working directory at that time, if it was a git checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,
}

/// Persistent record of completed builds, keyed by build name.
///
/// A plain value: load it, mutate it, save it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLedger {
    /// Records by build name.
    #[serde(default)]
    pub builds: BTreeMap<String, BuildRecord>,
}

impl BuildLedger {
    /// Load the ledger; a missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Ledger`] if the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ledger_error(path, e)),
        };
        serde_json::from_str(&content).map_err(|e| ledger_error(path, e))
    }

    /// Write the ledger, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Ledger`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), BuildError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| ledger_error(path, e))?;
        json.push('\n');
        write_atomic(path, json.as_bytes()).map_err(|e| ledger_error(path, e))
    }

    /// Record a successful build.
    pub fn record(&mut self, name: &str, git_hash: Option<String>, now: DateTime<Utc>) {
        self.builds.insert(
            name.to_string(),
            BuildRecord {
                completed_at: now,
                git_hash,
            },
        );
    }

    /// Look up a build's record.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BuildRecord> {
        self.builds.get(name)
    }

    /// Forget one build. Returns whether it was recorded.
    pub fn remove(&mut self, name: &str) -> bool {
        self.builds.remove(name).is_some()
    }

    /// Forget every build.
    pub fn clear(&mut self) {
        self.builds.clear();
    }
}

fn ledger_error(path: &Path, e: impl std::fmt::Display) -> BuildError {
    BuildError::Ledger {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = BuildLedger::load(&dir.path().join(LEDGER_FILE)).unwrap();
        assert!(ledger.builds.is_empty());
    }

    #[test]
    fn save_then_load_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join(LEDGER_FILE);
        let mut ledger = BuildLedger::default();
        ledger.record("neovim", Some("abc123".to_string()), at(1_700_000_000));
        ledger.record("fzf", None, at(1_700_000_100));
        ledger.save(&path).unwrap();
        assert_eq!(BuildLedger::load(&path).unwrap(), ledger);
    }

    #[test]
    fn json_shape_omits_missing_hash() {
        let mut ledger = BuildLedger::default();
        ledger.record("fzf", None, at(0));
        ledger.record("nvim", Some("deadbeef".to_string()), at(0));
        let value = serde_json::to_value(&ledger).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "builds": {
                    "fzf": { "completed_at": "1970-01-01T00:00:00Z" },
                    "nvim": { "completed_at": "1970-01-01T00:00:00Z", "git_hash": "deadbeef" }
                }
            })
        );
    }

    #[test]
    fn corrupt_file_is_ledger_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            BuildLedger::load(&path),
            Err(BuildError::Ledger { .. })
        ));
    }

    #[test]
    fn remove_and_clear() {
        let mut ledger = BuildLedger::default();
        ledger.record("a", None, at(0));
        ledger.record("b", None, at(0));
        assert!(ledger.remove("a"));
        assert!(!ledger.remove("a"));
        assert!(ledger.get("b").is_some());
        ledger.clear();
        assert!(ledger.builds.is_empty());
    }
}
