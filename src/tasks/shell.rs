//! Managed shell block: rendering and patching.
use std::collections::BTreeMap;

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, record_failure};
use crate::logging::EntryStatus;
use crate::resources::managed_block::ShellBlockResource;

const HEADER: &str = "# Generated by dotctl from env, aliases and functions; edits here are overwritten.";

/// Render the managed block body: env exports, aliases, then functions.
///
/// No blank lines are emitted.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use dotctl::tasks::shell::render_block;
///
/// let env = BTreeMap::from([("EDITOR".to_string(), "nvim".to_string())]);
/// let aliases = BTreeMap::from([("ll".to_string(), "ls -la".to_string())]);
/// let lines = render_block(&env, &aliases, &BTreeMap::new());
/// assert_eq!(lines[1], "export EDITOR=\"nvim\"");
/// assert_eq!(lines[2], "alias ll='ls -la'");
/// ```
#[must_use]
pub fn render_block(
    env: &BTreeMap<String, String>,
    aliases: &BTreeMap<String, String>,
    functions: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut lines = vec![HEADER.to_string()];
    for (key, value) in env {
        lines.push(format!("export {key}=\"{}\"", escape_double(value)));
    }
    for (name, value) in aliases {
        lines.push(format!("alias {name}='{}'", value.replace('\'', r"'\''")));
    }
    for (name, body) in functions {
        lines.push(format!("{name}() {{"));
        lines.extend(
            body.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| format!("  {l}")),
        );
        lines.push("}".to_string());
    }
    lines
}

fn escape_double(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Keep the managed block in each shell startup file up to date.
///
/// With no env, aliases or functions configured, only files that already
/// carry a block are patched, which empties a block left by an earlier
/// configuration.
#[derive(Debug)]
pub struct PatchShellFiles;

impl Task for PatchShellFiles {
    fn name(&self) -> &'static str {
        "Patch shell files"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.shell_files(&ctx.platform).is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let e = &ctx.config.entries;
        let nothing_to_emit = e.env.is_empty() && e.aliases.is_empty() && e.functions.is_empty();
        let desired = render_block(&e.env, &e.aliases, &e.functions);
        let mut stats = TaskStats::default();
        for file in ctx.config.shell_files(&ctx.platform) {
            let path = match ctx.expand(&file) {
                Ok(path) => path,
                Err(err) => {
                    record_failure(ctx, &mut stats, self.name(), &file, &err);
                    continue;
                }
            };
            let resource =
                ShellBlockResource::new(path, desired.clone()).existing_only(nothing_to_emit);
            match resource.apply(ctx.dry_run) {
                Ok(false) => {
                    ctx.log.debug(&format!("{file}: managed block up to date"));
                    ctx.log
                        .record(self.name(), Some(&file), EntryStatus::AlreadyOk, None);
                    stats.count(EntryStatus::AlreadyOk);
                }
                Ok(true) if ctx.dry_run => {
                    let msg = format!("would update managed block in {file}");
                    ctx.log.dry_run(&msg);
                    ctx.log
                        .record(self.name(), Some(&file), EntryStatus::DryRun, Some(&msg));
                    stats.count(EntryStatus::DryRun);
                }
                Ok(true) => {
                    let msg = format!("updated managed block in {file}");
                    ctx.log.info(&msg);
                    ctx.log
                        .record(self.name(), Some(&file), EntryStatus::Applied, Some(&msg));
                    stats.count(EntryStatus::Applied);
                }
                Err(err) => record_failure(ctx, &mut stats, self.name(), &file, &err),
            }
        }
        Ok(stats.finish(ctx))
    }
}
