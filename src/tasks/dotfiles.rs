//! Link, copy and template dotfiles.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, record_failure, record_gated, record_reconciled};
use crate::config::dotfiles::Dotfile;
use crate::config::filter::Filtered as _;
use crate::error::{DotctlError, ResourceError};
use crate::resources::helpers::fs::write_atomic;
use crate::resources::link::LinkResource;
use crate::resources::reconcile::reconcile;
use crate::template;

/// Place dotfiles at their targets.
#[derive(Debug)]
pub struct LinkDotfiles;

impl Task for LinkDotfiles {
    fn name(&self) -> &'static str {
        "Link dotfiles"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.entries.dotfiles.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::default();
        for (name, dotfile) in &ctx.config.entries.dotfiles {
            if let Err(reason) = dotfile.gate(ctx.host()) {
                record_gated(ctx, &mut stats, self.name(), name, &reason);
                continue;
            }
            match link_one(ctx, name, dotfile) {
                Ok(outcome) => record_reconciled(ctx, &mut stats, self.name(), name, &outcome),
                Err(e) => record_failure(ctx, &mut stats, self.name(), name, &e),
            }
        }
        Ok(stats.finish(ctx))
    }
}

fn link_one(
    ctx: &Context,
    name: &str,
    dotfile: &Dotfile,
) -> Result<crate::resources::reconcile::Reconciled, DotctlError> {
    let target = ctx.expand(&dotfile.target_or_default())?;
    let source = if dotfile.template {
        render_template(ctx, name, dotfile)?
    } else {
        ctx.resolve_source(&dotfile.source)?
    };
    let resource = LinkResource::new(source, target, dotfile.action).generated(dotfile.template);
    Ok(reconcile(&resource, ctx.conflict, ctx.dry_run)?)
}

/// Render a template dotfile into the state directory and return the
/// rendered path. In dry-run mode the output is rendered but not written.
fn render_template(ctx: &Context, name: &str, dotfile: &Dotfile) -> Result<PathBuf, DotctlError> {
    let raw = ctx.resolve_source(&dotfile.source)?;
    let text = std::fs::read_to_string(&raw).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ResourceError::SourceMissing(raw.clone())
        } else {
            ResourceError::io("read template", &raw, e)
        }
    })?;
    let vars = template::variables(&ctx.config.entries.vars, ctx.host(), &ctx.home);
    let rendered = template::render(&text, &vars)?;
    let out = ctx.rendered_dir().join(name);
    if ctx.dry_run {
        return Ok(out);
    }
    let current = std::fs::read_to_string(&out).ok();
    if current.as_deref() != Some(rendered.as_str()) {
        ctx.log.debug(&format!("rendering {} to {}", raw.display(), out.display()));
        write_atomic(&out, rendered.as_bytes())
            .map_err(|e| ResourceError::io("write rendered template", &out, e))?;
    }
    Ok(out)
}
