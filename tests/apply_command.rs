#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `apply` task list against a sandboxed home.

mod common;

use std::collections::HashSet;

use common::{SandboxBuilder, status_of};
use dotctl::logging::EntryStatus;
use dotctl::resources::managed_block::{BEGIN_MARKER, END_MARKER};
use dotctl::tasks;

const BASE: &str = r#"
[settings]
shell_files = ["~/.zshrc"]

[dotfiles.zshrc]
source = "zsh/zshrc"
target = "~/.zshrc.local"

[dotfiles.gitconfig]
source = "gitconfig"

[directories.projects]
path = "~/projects"

[aliases]
ll = "ls -la"

[env]
EDITOR = "nvim"
"#;

fn sandbox() -> common::Sandbox {
    SandboxBuilder::new()
        .config(BASE)
        .file("zsh/zshrc", "# zsh")
        .file("gitconfig", "[user]\n")
        .build()
}

#[test]
fn apply_task_names_are_unique() {
    let all = tasks::all_apply_tasks();
    let names: HashSet<&str> = all.iter().map(|t| t.name()).collect();
    assert_eq!(names.len(), all.len());
}

#[cfg(unix)]
#[test]
fn existing_file_is_backed_up_then_linked() {
    let sb = SandboxBuilder::new()
        .config("[dotfiles.gitconfig]\nsource = \"gitconfig\"\n")
        .file("gitconfig", "managed")
        .home_file(".gitconfig", "mine")
        .build();

    let entries = sb.apply(false);

    assert_eq!(status_of(&entries, "gitconfig"), Some(EntryStatus::Applied));
    assert_eq!(sb.read_home(".gitconfig.bak"), "mine");
    assert_eq!(
        std::fs::read_link(sb.home().join(".gitconfig")).unwrap(),
        sb.root().join("gitconfig")
    );
}

#[test]
fn managed_block_is_appended_after_existing_content() {
    let sb = SandboxBuilder::new()
        .config("[settings]\nshell_files = [\"~/.zshrc\"]\n[aliases]\nll = \"ls -la\"\n")
        .home_file(".zshrc", "export PATH=$HOME/bin:$PATH\n\n\n")
        .build();

    sb.apply(false);

    let content = sb.read_home(".zshrc");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "export PATH=$HOME/bin:$PATH");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], BEGIN_MARKER);
    assert!(lines.contains(&"alias ll='ls -la'"));
    assert_eq!(lines.last(), Some(&END_MARKER));
}

#[test]
fn second_apply_changes_nothing() {
    let sb = sandbox();
    let first = sb.apply(false);
    assert!(first.iter().any(|(_, s)| *s == EntryStatus::Applied));
    assert!(first.iter().all(|(_, s)| *s != EntryStatus::Failed));
    let zshrc = sb.read_home(".zshrc");

    let second = sb.apply(false);
    assert!(
        second.iter().all(|(_, s)| *s == EntryStatus::AlreadyOk),
        "{second:?}"
    );
    assert_eq!(sb.read_home(".zshrc"), zshrc);
}

#[test]
fn dry_run_leaves_home_untouched() {
    let sb = sandbox();
    let entries = sb.apply(true);

    assert!(entries.iter().all(|(_, s)| *s == EntryStatus::DryRun), "{entries:?}");
    let left: Vec<_> = std::fs::read_dir(sb.home()).unwrap().collect();
    assert!(left.is_empty());
    assert!(!sb.state().exists());
}

#[test]
fn one_failing_entry_does_not_stop_the_rest() {
    let sb = SandboxBuilder::new()
        .config("[dotfiles.a]\nsource = \"missing\"\n[dotfiles.b]\nsource = \"present\"\n")
        .file("present", "x")
        .build();

    let entries = sb.apply(false);

    assert_eq!(status_of(&entries, "a"), Some(EntryStatus::Failed));
    assert_eq!(status_of(&entries, "b"), Some(EntryStatus::Applied));
    assert_eq!(sb.read_home(".present"), "x");
}
