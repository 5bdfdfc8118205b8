//! Pre- and post-link hooks.
use std::collections::BTreeMap;

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, record_failure, record_gated};
use crate::config::collections::Hook;
use crate::config::filter::Filtered as _;
use crate::logging::EntryStatus;

/// Which side of linking a hook set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before dotfiles are linked.
    PreLink,
    /// After dotfiles are linked.
    PostLink,
}

/// Run keyed hook commands and hook scripts for one phase.
#[derive(Debug)]
pub struct RunHooks {
    phase: Phase,
}

impl RunHooks {
    /// Hooks that run before linking.
    #[must_use]
    pub const fn pre_link() -> Self {
        Self {
            phase: Phase::PreLink,
        }
    }

    /// Hooks that run after linking.
    #[must_use]
    pub const fn post_link() -> Self {
        Self {
            phase: Phase::PostLink,
        }
    }

    fn keyed<'a>(&self, ctx: &'a Context) -> &'a BTreeMap<String, Hook> {
        match self.phase {
            Phase::PreLink => &ctx.config.entries.pre_link,
            Phase::PostLink => &ctx.config.entries.post_link,
        }
    }

    fn scripts<'a>(&self, ctx: &'a Context) -> &'a [String] {
        match self.phase {
            Phase::PreLink => &ctx.config.entries.hooks.pre_link,
            Phase::PostLink => &ctx.config.entries.hooks.post_link,
        }
    }

    /// Run one shell invocation in the root, recording its outcome.
    fn invoke(&self, ctx: &Context, stats: &mut TaskStats, item: &str, args: &[&str]) {
        if ctx.dry_run {
            let msg = format!("would run sh {}", args.join(" "));
            ctx.log.dry_run(&msg);
            ctx.log
                .record(self.name(), Some(item), EntryStatus::DryRun, Some(&msg));
            stats.count(EntryStatus::DryRun);
            return;
        }
        ctx.log.debug(&format!("{item}: sh {}", args.join(" ")));
        match ctx.executor.run_in(ctx.root(), "sh", args) {
            Ok(_) => {
                ctx.log.info(&format!("{item}: done"));
                ctx.log.record(self.name(), Some(item), EntryStatus::Applied, None);
                stats.count(EntryStatus::Applied);
            }
            Err(e) => record_failure(ctx, stats, self.name(), item, &format!("{e:#}")),
        }
    }
}

impl Task for RunHooks {
    fn name(&self) -> &'static str {
        match self.phase {
            Phase::PreLink => "Run pre-link hooks",
            Phase::PostLink => "Run post-link hooks",
        }
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !self.keyed(ctx).is_empty() || !self.scripts(ctx).is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        for (name, hook) in self.keyed(ctx) {
            if let Err(reason) = hook.gate(ctx.host()) {
                record_gated(ctx, &mut stats, self.name(), name, &reason);
                continue;
            }
            self.invoke(ctx, &mut stats, name, &["-c", hook.command.as_str()]);
        }
        for script in self.scripts(ctx) {
            let path = ctx.root().join(script);
            if !ctx.dry_run && !path.is_file() {
                record_failure(ctx, &mut stats, self.name(), script, &"hook script not found");
                continue;
            }
            let path = path.to_string_lossy();
            self.invoke(ctx, &mut stats, script, &[path.as_ref()]);
        }
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context, sandbox_context};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn hook(command: &str) -> Hook {
        Hook {
            command: command.to_string(),
            ..Hook::default()
        }
    }

    #[test]
    fn names_follow_phase() {
        assert_eq!(RunHooks::pre_link().name(), "Run pre-link hooks");
        assert_eq!(RunHooks::post_link().name(), "Run post-link hooks");
    }

    #[test]
    fn nothing_configured_is_not_applicable() {
        let ctx = make_context(empty_config(PathBuf::from("/dotfiles")));
        assert!(!RunHooks::pre_link().should_run(&ctx));
    }

    #[test]
    fn keyed_hooks_run_in_order_and_failures_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = empty_config(dir.path().to_path_buf());
        config.entries.post_link.insert("a".into(), hook("echo a"));
        config.entries.post_link.insert("b".into(), hook("false"));
        config.entries.post_link.insert(
            "c".into(),
            Hook {
                hosts: vec!["workbox".into()],
                ..hook("echo c")
            },
        );
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, String::new()),
            (false, String::new()),
        ]));
        let (ctx, log) = sandbox_context(config, dir.path(), dir.path(), executor.clone());

        RunHooks::post_link().run(&ctx).unwrap();

        assert_eq!(executor.calls(), vec!["sh -c echo a", "sh -c false"]);
        let statuses: Vec<_> = log.entries().into_iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                EntryStatus::Applied,
                EntryStatus::Failed,
                EntryStatus::NotApplicable
            ]
        );
    }

    #[test]
    fn scripts_run_with_sh_and_missing_script_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("setup.sh"), "true\n").unwrap();
        let mut config = empty_config(dir.path().to_path_buf());
        config.entries.hooks.pre_link = vec!["setup.sh".into(), "gone.sh".into()];
        let executor = Arc::new(MockExecutor::with_responses(vec![(true, String::new())]));
        let (ctx, log) = sandbox_context(config, dir.path(), dir.path(), executor.clone());

        RunHooks::pre_link().run(&ctx).unwrap();

        assert_eq!(executor.call_count(), 1);
        assert!(executor.calls()[0].ends_with("setup.sh"));
        let entries = log.entries();
        assert_eq!(entries[0].status, EntryStatus::Applied);
        assert_eq!(entries[1].status, EntryStatus::Failed);
        assert_eq!(entries[1].item.as_deref(), Some("gone.sh"));
    }

    #[test]
    fn dry_run_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = empty_config(dir.path().to_path_buf());
        config.entries.pre_link.insert("x".into(), hook("rm -rf /tmp/x"));
        let executor = Arc::new(MockExecutor::with_responses(vec![]));
        let (mut ctx, log) = sandbox_context(config, dir.path(), dir.path(), executor.clone());
        ctx.dry_run = true;

        RunHooks::pre_link().run(&ctx).unwrap();

        assert_eq!(executor.call_count(), 0);
        assert_eq!(log.entries()[0].status, EntryStatus::DryRun);
    }
}
