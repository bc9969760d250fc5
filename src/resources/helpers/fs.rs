//! File-system resource helpers.
use std::path::Path;

use crate::backup;
use crate::error::{Error, Result};
use crate::session::Context;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory cannot be created.
pub fn ensure_parent_dir(ctx: &Context, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !ctx.fs.is_dir(parent)
    {
        ctx.fs
            .create_dir_all(parent)
            .map_err(|e| Error::io(parent, e))?;
        ctx.log
            .debug(&format!("created parent directory {}", parent.display()));
    }
    Ok(())
}

/// Replace the lines of `path` with `after`.
///
/// Snapshots the current file first, writes, marks the session changed, and
/// logs the diff between the snapshot and the new file under an
/// `Updating <path>:` heading.  Callers must only invoke this once they know
/// the file differs from `after`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the snapshot, its read-back or the write fails,
/// or [`Error::Diff`] if the diff cannot be rendered after a successful
/// write.
pub fn commit_lines(ctx: &Context, path: &Path, after: &[String]) -> Result<()> {
    let backup = backup::snapshot(ctx, path)?;
    let original = match &backup {
        Some(snapshot) => ctx
            .fs
            .read_lines(snapshot)
            .map_err(|e| Error::io(snapshot, e))?,
        None => Vec::new(),
    };
    ctx.fs
        .write_lines(path, after)
        .map_err(|e| Error::io(path, e))?;
    ctx.changes.mark();

    let diff = ctx.diff.render(backup.as_deref(), path, &original, after)?;
    ctx.log.info(&format!("Updating {}:", path.display()));
    for line in diff.lines() {
        ctx.log.diff(line);
    }
    Ok(())
}
