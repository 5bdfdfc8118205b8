//! Entry collections shared by the base configuration and recipe fragments,
//! and the transactional merge that combines them.
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use super::builds::Build;
use super::dotfiles::Dotfile;
use super::filter::{Enabled, Filtered, impl_filtered};
use super::paths;
use crate::error::ConfigError;

/// A directory that must exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Directory {
    /// Directory path (`~` and `$VAR` expanded, relative = home-relative).
    pub path: String,
    /// Octal permission bits applied on creation (unix only).
    #[serde(default)]
    pub mode: Option<String>,
    /// Hosts this directory applies to (empty = all).
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Enable flag.
    #[serde(default)]
    pub enabled: Enabled,
}

/// A git repository that must be cloned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repo {
    /// Remote URL.
    #[serde(default)]
    pub url: String,
    /// Clone destination.
    pub path: String,
    /// Branch to check out instead of the remote default.
    #[serde(default)]
    pub branch: Option<String>,
    /// Hosts this repository applies to (empty = all).
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Enable flag.
    #[serde(default)]
    pub enabled: Enabled,
}

/// A named shell command run before or after linking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hook {
    /// Command line passed to `sh -c`.
    pub command: String,
    /// Hosts this hook applies to (empty = all).
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Enable flag.
    #[serde(default)]
    pub enabled: Enabled,
}

impl_filtered!(Directory, Repo, Hook);

/// Hook scripts, appended across fragments rather than keyed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookScripts {
    /// Scripts run before linking.
    pub pre_link: Vec<String>,
    /// Scripts run after linking.
    pub post_link: Vec<String>,
}

/// Every collection a configuration source can contribute.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Collections {
    /// Files linked or copied into the home directory.
    pub dotfiles: BTreeMap<String, Dotfile>,
    /// Directories to create.
    pub directories: BTreeMap<String, Directory>,
    /// Repositories to clone.
    pub repos: BTreeMap<String, Repo>,
    /// Shell aliases for the managed block.
    pub aliases: BTreeMap<String, String>,
    /// Shell functions (name to body) for the managed block.
    pub functions: BTreeMap<String, String>,
    /// Environment exports for the managed block.
    pub env: BTreeMap<String, String>,
    /// Commands run before linking.
    pub pre_link: BTreeMap<String, Hook>,
    /// Commands run after linking.
    pub post_link: BTreeMap<String, Hook>,
    /// Build steps.
    pub builds: BTreeMap<String, Build>,
    /// Template variables.
    pub vars: BTreeMap<String, String>,
    /// Programs expected on `PATH`.
    pub tools: Vec<String>,
    /// Hook scripts.
    pub hooks: HookScripts,
}

impl Collections {
    /// Derive default dotfile targets and lowercase every host list.
    ///
    /// Must run before [`Collections::rewrite_paths`] so default targets come
    /// from the source as written.
    pub fn normalize(&mut self) {
        for dotfile in self.dotfiles.values_mut() {
            dotfile.default_target();
        }
        self.for_each_filtered(|entry| entry.normalize_hosts());
    }

    /// Prefix every fragment-relative path with `dir`.
    pub fn rewrite_paths(&mut self, dir: &str) {
        for dotfile in self.dotfiles.values_mut() {
            dotfile.source = paths::prefix(dir, &dotfile.source);
        }
        for build in self.builds.values_mut() {
            if let Some(wd) = &build.working_dir {
                build.working_dir = Some(paths::prefix(dir, wd));
            }
        }
        for script in self
            .hooks
            .pre_link
            .iter_mut()
            .chain(self.hooks.post_link.iter_mut())
        {
            *script = paths::prefix(dir, script);
        }
    }

    /// Copy `hosts` onto every filterable entry without a host list.
    pub fn inherit_hosts(&mut self, hosts: &[String]) {
        if hosts.is_empty() {
            return;
        }
        self.for_each_filtered(|entry| entry.inherit_hosts(hosts));
    }

    fn for_each_filtered(&mut self, mut f: impl FnMut(&mut dyn Filtered)) {
        for e in self.dotfiles.values_mut() {
            f(e);
        }
        for e in self.directories.values_mut() {
            f(e);
        }
        for e in self.repos.values_mut() {
            f(e);
        }
        for e in self.pre_link.values_mut().chain(self.post_link.values_mut()) {
            f(e);
        }
        for e in self.builds.values_mut() {
            f(e);
        }
    }

    /// Total number of keyed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dotfiles.len()
            + self.directories.len()
            + self.repos.len()
            + self.aliases.len()
            + self.functions.len()
            + self.env.len()
            + self.pre_link.len()
            + self.post_link.len()
            + self.builds.len()
            + self.vars.len()
    }

    /// Whether no keyed entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates collections from several sources, remembering which source
/// contributed each key.
#[derive(Debug, Default)]
pub struct Merger {
    merged: Collections,
    origins: HashMap<(&'static str, String), String>,
}

impl Merger {
    /// Start with no sources merged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `incoming` from the source labelled `source`.
    ///
    /// All keyed collections are checked first; on the first duplicate key
    /// nothing from `incoming` is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Conflict`] naming both sources.
    pub fn merge(&mut self, source: &str, incoming: Collections) -> Result<(), ConfigError> {
        let m = &self.merged;
        self.check("dotfile", m.dotfiles.keys(), incoming.dotfiles.keys(), source)?;
        self.check("directory", m.directories.keys(), incoming.directories.keys(), source)?;
        self.check("repo", m.repos.keys(), incoming.repos.keys(), source)?;
        self.check("alias", m.aliases.keys(), incoming.aliases.keys(), source)?;
        self.check("function", m.functions.keys(), incoming.functions.keys(), source)?;
        self.check("env", m.env.keys(), incoming.env.keys(), source)?;
        self.check("pre_link hook", m.pre_link.keys(), incoming.pre_link.keys(), source)?;
        self.check("post_link hook", m.post_link.keys(), incoming.post_link.keys(), source)?;
        self.check("build", m.builds.keys(), incoming.builds.keys(), source)?;
        self.check("var", m.vars.keys(), incoming.vars.keys(), source)?;

        let Collections {
            dotfiles,
            directories,
            repos,
            aliases,
            functions,
            env,
            pre_link,
            post_link,
            builds,
            vars,
            tools,
            hooks,
        } = incoming;
        self.insert("dotfile", dotfiles, |c| &mut c.dotfiles, source);
        self.insert("directory", directories, |c| &mut c.directories, source);
        self.insert("repo", repos, |c| &mut c.repos, source);
        self.insert("alias", aliases, |c| &mut c.aliases, source);
        self.insert("function", functions, |c| &mut c.functions, source);
        self.insert("env", env, |c| &mut c.env, source);
        self.insert("pre_link hook", pre_link, |c| &mut c.pre_link, source);
        self.insert("post_link hook", post_link, |c| &mut c.post_link, source);
        self.insert("build", builds, |c| &mut c.builds, source);
        self.insert("var", vars, |c| &mut c.vars, source);

        self.merged.tools.extend(tools);
        self.merged.hooks.pre_link.extend(hooks.pre_link);
        self.merged.hooks.post_link.extend(hooks.post_link);
        Ok(())
    }

    fn check<'a>(
        &self,
        kind: &'static str,
        existing: impl Iterator<Item = &'a String>,
        incoming: impl Iterator<Item = &'a String>,
        source: &str,
    ) -> Result<(), ConfigError> {
        let existing: Vec<&String> = existing.collect();
        for key in incoming {
            if existing.contains(&key) {
                return Err(ConfigError::Conflict {
                    kind,
                    key: key.clone(),
                    fragment: source.to_string(),
                    existing: self.origin(kind, key).unwrap_or_default().to_string(),
                });
            }
        }
        Ok(())
    }

    fn insert<V>(
        &mut self,
        kind: &'static str,
        entries: BTreeMap<String, V>,
        target: impl FnOnce(&mut Collections) -> &mut BTreeMap<String, V>,
        source: &str,
    ) {
        let map = target(&mut self.merged);
        for (key, value) in entries {
            self.origins
                .insert((kind, key.clone()), source.to_string());
            map.insert(key, value);
        }
    }

    /// Source that contributed `key` to the `kind` collection.
    #[must_use]
    pub fn origin(&self, kind: &'static str, key: &str) -> Option<&str> {
        self.origins
            .get(&(kind, key.to_string()))
            .map(String::as_str)
    }

    /// Finish merging.
    #[must_use]
    pub fn into_collections(self) -> Collections {
        self.merged
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Collections {
        toml::from_str(toml_str).unwrap()
    }

    // -----------------------------------------------------------------------
    // Parsing and normalisation
    // -----------------------------------------------------------------------

    #[test]
    fn parses_every_collection() {
        let c = parse(
            r#"
            tools = ["git"]
            [vars]
            email = "me@example.com"
            [dotfiles.zshrc]
            source = "zshrc"
            [directories.projects]
            path = "~/projects"
            mode = "700"
            [repos.nvim]
            url = "https://example.com/nvim.git"
            path = "~/.config/nvim"
            [aliases]
            ll = "ls -la"
            [functions]
            mkcd = "mkdir -p $1"
            [env]
            EDITOR = "nvim"
            [pre_link.sub]
            command = "true"
            [post_link.cache]
            command = "fc-cache"
            [hooks]
            pre_link = ["scripts/pre.sh"]
            [builds.nvim]
            commands = ["make"]
        "#,
        );
        assert_eq!(c.tools, vec!["git"]);
        assert_eq!(c.len(), 10);
        assert_eq!(c.directories["projects"].mode.as_deref(), Some("700"));
        assert_eq!(c.hooks.pre_link, vec!["scripts/pre.sh"]);
        assert!(c.hooks.post_link.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let c = parse("something_else = 1\n[dotfiles.a]\nsource = \"a\"\n");
        assert_eq!(c.dotfiles.len(), 1);
    }

    #[test]
    fn normalize_sets_targets_and_lowercases_hosts() {
        let mut c = parse(
            r#"
            [dotfiles.a]
            source = "a.txt"
            hosts = ["Laptop"]
            [builds.b]
            hosts = ["WORK"]
        "#,
        );
        c.normalize();
        assert_eq!(c.dotfiles["a"].target.as_deref(), Some("~/.a.txt"));
        assert_eq!(c.dotfiles["a"].hosts, vec!["laptop"]);
        assert_eq!(c.builds["b"].hosts, vec!["work"]);
    }

    // -----------------------------------------------------------------------
    // Rewrite and host push-down
    // -----------------------------------------------------------------------

    #[test]
    fn rewrite_prefixes_relative_paths_only() {
        let mut c = parse(
            r#"
            [dotfiles.b]
            source = "b.txt"
            [dotfiles.abs]
            source = "~/elsewhere"
            [builds.x]
            working_dir = "src"
            [builds.y]
            working_dir = "$HOME/src"
            [hooks]
            post_link = ["post.sh"]
        "#,
        );
        c.normalize();
        c.rewrite_paths("recipes/extra");
        assert_eq!(c.dotfiles["b"].source, "recipes/extra/b.txt");
        assert_eq!(c.dotfiles["b"].target.as_deref(), Some("~/.b.txt"));
        assert_eq!(c.dotfiles["abs"].source, "~/elsewhere");
        assert_eq!(c.builds["x"].working_dir.as_deref(), Some("recipes/extra/src"));
        assert_eq!(c.builds["y"].working_dir.as_deref(), Some("$HOME/src"));
        assert_eq!(c.hooks.post_link, vec!["recipes/extra/post.sh"]);
    }

    #[test]
    fn inherit_hosts_fills_only_unfiltered_entries() {
        let mut c = parse(
            r#"
            [dotfiles.plain]
            source = "p"
            [dotfiles.own]
            source = "o"
            hosts = ["other"]
            [repos.r]
            path = "~/r"
            [pre_link.h]
            command = "true"
        "#,
        );
        c.inherit_hosts(&["work".to_string()]);
        assert_eq!(c.dotfiles["plain"].hosts, vec!["work"]);
        assert_eq!(c.dotfiles["own"].hosts, vec!["other"]);
        assert_eq!(c.repos["r"].hosts, vec!["work"]);
        assert_eq!(c.pre_link["h"].hosts, vec!["work"]);
    }

    // -----------------------------------------------------------------------
    // Merger
    // -----------------------------------------------------------------------

    #[test]
    fn merge_disjoint_sources() {
        let mut merger = Merger::new();
        merger
            .merge("dotctl.toml", parse("tools = [\"git\"]\n[dotfiles.a]\nsource = \"a\"\n"))
            .unwrap();
        merger
            .merge(
                "recipe 'extra'",
                parse("tools = [\"nvim\"]\n[dotfiles.b]\nsource = \"b\"\n"),
            )
            .unwrap();
        assert_eq!(merger.origin("dotfile", "b"), Some("recipe 'extra'"));
        let merged = merger.into_collections();
        assert_eq!(merged.dotfiles.len(), 2);
        assert_eq!(merged.tools, vec!["git", "nvim"]);
    }

    #[test]
    fn conflict_names_both_sources_and_inserts_nothing() {
        let mut merger = Merger::new();
        merger
            .merge("dotctl.toml", parse("[dotfiles.x]\nsource = \"x\"\n"))
            .unwrap();
        let err = merger
            .merge(
                "recipe 'extra'",
                parse("tools = [\"t\"]\n[aliases]\nll = \"ls\"\n[dotfiles.x]\nsource = \"y\"\n"),
            )
            .unwrap_err();
        match err {
            ConfigError::Conflict {
                kind,
                key,
                fragment,
                existing,
            } => {
                assert_eq!(kind, "dotfile");
                assert_eq!(key, "x");
                assert_eq!(fragment, "recipe 'extra'");
                assert_eq!(existing, "dotctl.toml");
            }
            other => panic!("unexpected error: {other}"),
        }
        let merged = merger.into_collections();
        assert_eq!(merged.dotfiles["x"].source, "x");
        assert!(merged.aliases.is_empty());
        assert!(merged.tools.is_empty());
    }

    #[test]
    fn same_key_in_different_collections_is_not_a_conflict() {
        let mut merger = Merger::new();
        merger.merge("a", parse("[aliases]\nvim = \"nvim\"\n")).unwrap();
        merger
            .merge("b", parse("[builds.vim]\ncommands = [\"make\"]\n"))
            .unwrap();
        let merged = merger.into_collections();
        assert_eq!(merged.aliases.len(), 1);
        assert_eq!(merged.builds.len(), 1);
    }
}
