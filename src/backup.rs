//! Date-stamped, same-day idempotent file snapshots.
//!
//! A snapshot lives next to the original as `<path>.<YYYY-MM-DD>`.  An
//! existing snapshot for today is never overwritten, so repeated runs on the
//! same calendar day keep only the state from before the first mutation of
//! that day.  Intermediate states within one day are not preserved.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::session::Context;

/// Return the snapshot path for `path` on `date`.
///
/// # Examples
///
/// ```
/// use converge::backup::backup_path;
/// use std::path::Path;
///
/// assert_eq!(
///     backup_path(Path::new("/etc/default/app"), "2024-03-01"),
///     Path::new("/etc/default/app.2024-03-01"),
/// );
/// ```
#[must_use]
pub fn backup_path(path: &Path, date: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(date);
    PathBuf::from(name)
}

/// Snapshot the current bytes of `path` before it is mutated.
///
/// Returns `None` when `path` does not exist (nothing to preserve), otherwise
/// the snapshot path, which may be a snapshot taken earlier today.
///
/// # Errors
///
/// Returns [`Error::Io`] if the copy fails.
pub fn snapshot(ctx: &Context, path: &Path) -> Result<Option<PathBuf>> {
    if !ctx.fs.exists(path) {
        return Ok(None);
    }

    let date = ctx.clock.today();
    let backup = backup_path(path, &date);
    if ctx.fs.exists(&backup) {
        ctx.log
            .debug(&format!("keeping earlier backup {}", backup.display()));
        return Ok(Some(backup));
    }

    ctx.fs
        .copy(path, &backup)
        .map_err(|e| Error::io(&backup, e))?;
    ctx.log
        .info(&format!("Backed up {} to *.{date}", path.display()));
    Ok(Some(backup))
}
