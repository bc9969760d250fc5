//! Files installed from a source tree that mirrors the target layout.
//!
//! The source root holds a partial copy of the filesystem: installing
//! `/etc/nginx` from `files/` copies `files/etc/nginx` and, for a directory,
//! everything below it, dotfiles included.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::helpers::fs::ensure_parent_dir;
use super::{Resource, ResourceChange, ResourceState};
use crate::backup;
use crate::error::{Error, Result};
use crate::session::Context;

/// One node of the source tree and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Dir(PathBuf),
    File { source: PathBuf, dest: PathBuf },
}

/// A file or directory tree copied from `source_root` to `target`.
///
/// A copied file is left alone when the target already holds identical
/// bytes; otherwise the target is snapshotted (unless backups are off) and
/// overwritten.  Missing directories are created.  Nothing is ever removed
/// from the target.
#[derive(Debug, Clone)]
pub struct InstalledFileResource {
    /// Root of the mirrored source tree.
    pub source_root: PathBuf,
    /// Absolute target path; its source is `source_root` joined with it.
    pub target: PathBuf,
    /// Snapshot targets before overwriting them.
    pub backup: bool,
    /// Write each file to `<target>.tmp` instead of the target itself.
    pub temporary: bool,
}

impl InstalledFileResource {
    /// Install `target` from the tree under `source_root`, with backups.
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            target: target.into(),
            backup: true,
            temporary: false,
        }
    }

    /// Turn target snapshots on or off.
    #[must_use]
    pub const fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Install files next to their target with a `.tmp` suffix.
    #[must_use]
    pub const fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    fn dest(&self, path: &Path) -> PathBuf {
        if self.temporary {
            let mut name = OsString::from(path.as_os_str());
            name.push(".tmp");
            PathBuf::from(name)
        } else {
            path.to_path_buf()
        }
    }

    /// Walk the source tree, parents before children.
    fn entries(&self, ctx: &Context) -> Result<Vec<Entry>> {
        let relative = self
            .target
            .strip_prefix("/")
            .map_err(|_| Error::Install {
                path: self.target.clone(),
                reason: "target must be an absolute path".to_string(),
            })?;
        let mut out = Vec::new();
        self.collect(ctx, &self.source_root.join(relative), &self.target, &mut out)?;
        Ok(out)
    }

    fn collect(&self, ctx: &Context, source: &Path, target: &Path, out: &mut Vec<Entry>) -> Result<()> {
        if ctx.fs.is_file(source) {
            out.push(Entry::File {
                source: source.to_path_buf(),
                dest: self.dest(target),
            });
            return Ok(());
        }
        if !ctx.fs.is_dir(source) {
            if ctx.fs.exists(source) {
                return Err(Error::Install {
                    path: source.to_path_buf(),
                    reason: "only files and directories can be installed".to_string(),
                });
            }
            return Err(Error::NotFound {
                path: source.to_path_buf(),
            });
        }
        out.push(Entry::Dir(target.to_path_buf()));
        let children = ctx.fs.read_dir(source).map_err(|e| Error::io(source, e))?;
        for child in children {
            if let Some(name) = child.file_name() {
                self.collect(ctx, &child, &target.join(name), out)?;
            }
        }
        Ok(())
    }

    fn is_pending(ctx: &Context, entry: &Entry) -> Result<bool> {
        match entry {
            Entry::Dir(dir) => Ok(!ctx.fs.is_dir(dir)),
            Entry::File { source, dest } => {
                if !ctx.fs.exists(dest) {
                    return Ok(true);
                }
                let wanted = ctx.fs.read(source).map_err(|e| Error::io(source, e))?;
                let current = ctx.fs.read(dest).map_err(|e| Error::io(dest, e))?;
                Ok(wanted != current)
            }
        }
    }

    fn install(&self, ctx: &Context, entry: &Entry) -> Result<()> {
        match entry {
            Entry::Dir(dir) => {
                ctx.fs.create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
                ctx.log.info(&format!("Creating {}", dir.display()));
            }
            Entry::File { source, dest } => {
                let verb = if ctx.fs.exists(dest) { "Updating" } else { "Creating" };
                ensure_parent_dir(ctx, dest)?;
                ctx.log.info(&format!("{verb} {}", dest.display()));
                if self.backup {
                    backup::snapshot(ctx, dest)?;
                }
                ctx.fs.copy(source, dest).map_err(|e| Error::io(dest, e))?;
            }
        }
        ctx.changes.mark();
        Ok(())
    }
}

impl Resource for InstalledFileResource {
    fn description(&self) -> String {
        format!(
            "install {} from {}",
            self.target.display(),
            self.source_root.display()
        )
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        let entries = self.entries(ctx)?;
        let mut pending = 0;
        for entry in &entries {
            if Self::is_pending(ctx, entry)? {
                pending += 1;
            }
        }
        let root_exists = entries.first().is_some_and(|entry| match entry {
            Entry::Dir(dir) => ctx.fs.exists(dir),
            Entry::File { dest, .. } => ctx.fs.exists(dest),
        });
        Ok(match (pending, root_exists) {
            (0, _) => ResourceState::Correct,
            (_, false) => ResourceState::Missing,
            (n, true) => ResourceState::Incorrect {
                current: format!("{n} file(s) to install"),
            },
        })
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        let mut change = ResourceChange::AlreadyCorrect;
        for entry in self.entries(ctx)? {
            if Self::is_pending(ctx, &entry)? {
                self.install(ctx, &entry)?;
                change = ResourceChange::Applied;
            }
        }
        Ok(change)
    }
}
