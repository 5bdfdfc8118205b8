//! TOML file loading with typed errors.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Read and deserialize a TOML file.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if the file cannot be read and
/// [`ConfigError::Parse`] if its contents do not match `T`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &content)
}

/// Deserialize TOML `content` that was read from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the contents do not match `T`.
pub fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "name = \"x\"\n").unwrap();
        let sample: Sample = load(&path).unwrap();
        assert_eq!(sample.name, "x");
    }

    #[test]
    fn missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load::<Sample>(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = parse::<Sample>(Path::new("bad.toml"), "name = ").unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, Path::new("bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn schema_mismatch_is_parse_error() {
        let err = parse::<Sample>(Path::new("s.toml"), "name = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
