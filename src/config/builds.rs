//! Build step entries.
use serde::Deserialize;
use std::fmt;

use super::filter::{Enabled, impl_filtered};

/// When a build is eligible to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Run on every invocation.
    Always,
    /// Run until it has succeeded once, then again only when its working
    /// directory's git state changes.
    #[default]
    Once,
    /// Run only when requested by name.
    Manual,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::Once => "once",
            Self::Manual => "manual",
        })
    }
}

/// A named sequence of shell commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Build {
    /// Commands run in order with `sh -c`.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Directory the commands run in (dotfiles root when absent).
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Run mode.
    #[serde(default)]
    pub run: RunMode,
    /// Hosts this build applies to (empty = all).
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Enable flag.
    #[serde(default)]
    pub enabled: Enabled,
}

impl_filtered!(Build);
