//! Domain-specific error types for the dotctl engine.
//!
//! Internal modules return typed errors (e.g. [`ConfigError`], [`BuildError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DotctlError
//! ├── Config(ConfigError)    : loading, recipe resolution, merge conflicts
//! ├── Resource(ResourceError): per-entry reconcile failures
//! ├── Build(BuildError)      : build commands and the build ledger
//! ├── Patch(PatchError)      : managed-block file I/O
//! └── Template(TemplateError): dotfile template rendering
//! ```
//!
//! Configuration errors are fatal for the whole run and are raised before
//! anything is touched. The other three are fatal for a single entry only;
//! tasks record them in the report and move on.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the dotctl engine.
#[derive(Error, Debug)]
pub enum DotctlError {
    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single filesystem entry could not be reconciled.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A build step failed.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A managed block could not be read or written.
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    /// A dotfile template could not be rendered.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Errors that arise while loading and merging configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two sources define the same logical name in one collection.
    #[error("{kind} '{key}' from {fragment} conflicts with the definition in {existing}")]
    Conflict {
        /// Collection the key belongs to (e.g. `"dotfile"`, `"build"`).
        kind: &'static str,
        /// The duplicated logical name.
        key: String,
        /// Source being merged when the collision was found.
        fragment: String,
        /// Source that already owns the key.
        existing: String,
    },

    /// A configuration file is missing or unreadable.
    #[error("cannot read {path}: {source}")]
    Load {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML for its schema.
    #[error("cannot parse {path}: {message}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Both `recipes.include` and `recipes.auto` were set.
    #[error("recipes.include and recipes.auto are mutually exclusive")]
    RecipeModeConflict,

    /// A recipe exclusion is not a valid glob pattern.
    #[error("invalid recipe exclude pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// Reason reported by the glob parser.
        message: String,
    },

    /// Recursive recipe discovery failed.
    #[error("cannot scan recipe directory {path}: {source}")]
    Discovery {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A `~` or `$VAR` reference could not be expanded.
    #[error("cannot expand '{input}': {message}")]
    Expand {
        /// The raw path.
        input: String,
        /// Reason reported by the expander.
        message: String,
    },
}

/// Errors that arise while reconciling one filesystem entry.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The source the entry points at does not exist.
    #[error("source does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The target exists with a type the action cannot handle.
    #[error("unexpected target at {}: {reason}", .path.display())]
    UnexpectedTarget {
        /// Target path.
        path: PathBuf,
        /// What was found there.
        reason: String,
    },

    /// A git operation (clone, open) failed.
    #[error("git {}: {source}", .path.display())]
    Git {
        /// Repository path.
        path: PathBuf,
        /// Underlying git error.
        source: git2::Error,
    },

    /// A filesystem call failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        /// Short verb describing the failed step.
        action: &'static str,
        /// Path the step operated on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ResourceError {
    /// Build an [`ResourceError::Io`] from a verb, a path and the error.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors that arise from build steps and the build ledger.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A command exited non-zero (or could not be spawned).
    #[error("build '{build}' failed at `{command}`: {reason}")]
    CommandFailed {
        /// Build name.
        build: String,
        /// The command that failed.
        command: String,
        /// Exit status or spawn error.
        reason: String,
    },

    /// The ledger file could not be read or written.
    #[error("build ledger {}: {message}", .path.display())]
    Ledger {
        /// Ledger path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

/// Errors that arise while patching a managed block into a text file.
#[derive(Error, Debug)]
pub enum PatchError {
    /// The target file exists but cannot be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The patched content cannot be written back.
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while rendering a dotfile template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template references a variable that is not defined.
    #[error("undefined template variable '{name}'")]
    UnknownVariable {
        /// Variable name as written in the template.
        name: String,
    },

    /// The placeholder pattern failed to compile.
    #[error("template pattern: {0}")]
    Pattern(#[from] regex::Error),
}
