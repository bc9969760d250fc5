//! Subcommand implementations and the plumbing they share.
pub mod apply;
pub mod detect;
pub mod set;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{DiffChoice, GlobalOpts};
use crate::diff::{BuiltinDiff, DiffReporter, ExternalDiff};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, TaskStatus};
use crate::resources::{Resource, ResourceChange};
use crate::session::Context;

/// Pick the diff renderer requested on the command line.
///
/// # Errors
///
/// Returns an error if `--diff external` is requested and no `diff` program
/// is on `PATH`.
pub fn diff_reporter(
    choice: DiffChoice,
    executor: Arc<dyn Executor>,
) -> Result<Arc<dyn DiffReporter>> {
    let available = executor.which("diff") || executor.which("colordiff");
    match choice {
        DiffChoice::Internal => Ok(Arc::new(BuiltinDiff)),
        DiffChoice::Auto if !available => Ok(Arc::new(BuiltinDiff)),
        DiffChoice::Auto => Ok(Arc::new(ExternalDiff::new(executor))),
        DiffChoice::External if available => Ok(Arc::new(ExternalDiff::new(executor))),
        DiffChoice::External => anyhow::bail!("--diff external: neither diff nor colordiff is on PATH"),
    }
}

/// Build the session context for a command from the global options.
///
/// # Errors
///
/// Propagates errors from [`diff_reporter`].
pub fn build_context(global: &GlobalOpts, log: Arc<dyn Log>) -> Result<Context> {
    let diff = diff_reporter(global.diff, Arc::new(SystemExecutor))?;
    let ctx = Context::new(log).with_diff(diff);
    ctx.log
        .debug(&format!("backup date: {}", ctx.clock.today()));
    Ok(ctx)
}

/// Apply `resources` in order, recording each result.
///
/// Stops at the first failure: the failing resource is recorded as failed
/// and its error returned, later resources are not attempted.
///
/// # Errors
///
/// Returns the first resource error.
pub fn run_resources(resources: &[Box<dyn Resource>], ctx: &Context) -> Result<()> {
    for resource in resources {
        let name = resource.description();
        ctx.log.debug(&format!("applying {name}"));
        match resource.apply(ctx) {
            Ok(ResourceChange::Applied) => {
                ctx.log.record_task(&name, TaskStatus::Changed, None);
            }
            Ok(ResourceChange::AlreadyCorrect) => {
                ctx.log.debug(&format!("ok: {name}"));
                ctx.log.record_task(&name, TaskStatus::Unchanged, None);
            }
            Err(e) => {
                ctx.log.error(&format!("{name}: {e}"));
                ctx.log
                    .record_task(&name, TaskStatus::Failed, Some(&e.to_string()));
                return Err(anyhow::Error::new(e).context(name));
            }
        }
    }
    Ok(())
}
