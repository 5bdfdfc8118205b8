//! Dotfile entries: a source under the dotfiles root placed at a target.
use serde::Deserialize;

use super::filter::{Enabled, impl_filtered};

/// How a dotfile source is materialised at its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAction {
    /// Symlink the target to the source file.
    #[default]
    Symlink,
    /// Copy the source (file or directory tree) to the target.
    Copy,
    /// Symlink the target to a source directory.
    SymlinkDir,
}

/// A dotfile to place in the home directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dotfile {
    /// Source path, relative to the dotfiles root after recipe rewriting.
    pub source: String,
    /// Target path; `~` and `$VAR` are expanded, relative paths are
    /// home-relative. Defaults to `~/.<source>` when normalised.
    #[serde(default)]
    pub target: Option<String>,
    /// Materialisation strategy.
    #[serde(default)]
    pub action: LinkAction,
    /// Render the source with `[vars]` before placing it.
    #[serde(default)]
    pub template: bool,
    /// Hosts this dotfile applies to (empty = all).
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Enable flag.
    #[serde(default)]
    pub enabled: Enabled,
}

impl_filtered!(Dotfile);

impl Dotfile {
    /// Fill in the default target from the current (un-prefixed) source.
    pub fn default_target(&mut self) {
        if self.target.is_none() {
            let source = self.source.trim_start_matches("./");
            self.target = Some(format!("~/.{source}"));
        }
    }

    /// Target as written, or the conventional default.
    #[must_use]
    pub fn target_or_default(&self) -> String {
        self.target
            .clone()
            .unwrap_or_else(|| format!("~/.{}", self.source.trim_start_matches("./")))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn parses_full_entry() {
        let toml_str = r#"
            [zshrc]
            source = "zsh/zshrc"
            target = "~/.zshrc"
            action = "copy"
            template = true
            hosts = ["laptop"]
            enabled = false
        "#;
        let map: BTreeMap<String, Dotfile> = toml::from_str(toml_str).unwrap();
        let d = &map["zshrc"];
        assert_eq!(d.source, "zsh/zshrc");
        assert_eq!(d.target.as_deref(), Some("~/.zshrc"));
        assert_eq!(d.action, LinkAction::Copy);
        assert!(d.template);
        assert_eq!(d.hosts, vec!["laptop"]);
        assert_eq!(d.enabled, Enabled::Disabled);
    }

    #[test]
    fn defaults_apply_to_minimal_entry() {
        let d: Dotfile = toml::from_str(r#"source = "vimrc""#).unwrap();
        assert_eq!(d.action, LinkAction::Symlink);
        assert!(!d.template);
        assert!(d.hosts.is_empty());
        assert_eq!(d.enabled, Enabled::Inherited);
        assert!(d.target.is_none());
    }

    #[test]
    fn symlink_dir_action_parses() {
        let d: Dotfile = toml::from_str(
            r#"
            source = "nvim"
            action = "symlink_dir"
        "#,
        )
        .unwrap();
        assert_eq!(d.action, LinkAction::SymlinkDir);
    }

    #[test]
    fn default_target_uses_source() {
        let mut d = Dotfile {
            source: "./gitconfig".to_string(),
            ..Dotfile::default()
        };
        d.default_target();
        assert_eq!(d.target.as_deref(), Some("~/.gitconfig"));
    }

    #[test]
    fn default_target_keeps_explicit_value() {
        let mut d = Dotfile {
            source: "zsh/zshrc".to_string(),
            target: Some("~/.zshrc".to_string()),
            ..Dotfile::default()
        };
        d.default_target();
        assert_eq!(d.target.as_deref(), Some("~/.zshrc"));
    }
}
