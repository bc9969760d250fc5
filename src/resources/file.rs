//! Whole-file resources: exact contents and absence.
use std::path::PathBuf;

use super::helpers::fs::{commit_lines, ensure_parent_dir};
use super::{Resource, ResourceChange, ResourceState};
use crate::error::{Error, Result};
use crate::session::Context;

/// A file whose contents must be exactly `lines`.
#[derive(Debug, Clone)]
pub struct FileContentsResource {
    /// Target file.
    pub path: PathBuf,
    /// Desired lines, each written newline-terminated.
    pub lines: Vec<String>,
}

impl FileContentsResource {
    /// Create a file contents resource.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, lines: Vec<String>) -> Self {
        Self {
            path: path.into(),
            lines,
        }
    }
}

impl Resource for FileContentsResource {
    fn description(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        if !ctx.fs.exists(&self.path) {
            return Ok(ResourceState::Missing);
        }
        let current = ctx
            .fs
            .read_lines(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        if current == self.lines {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("{} line(s)", current.len()),
            })
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        match self.current_state(ctx)? {
            ResourceState::Correct => return Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Missing => ensure_parent_dir(ctx, &self.path)?,
            ResourceState::Incorrect { .. } => {}
        }
        commit_lines(ctx, &self.path, &self.lines)?;
        Ok(ResourceChange::Applied)
    }
}

/// Files that must not exist.
#[derive(Debug, Clone)]
pub struct FileAbsentResource {
    /// Files to remove.
    pub paths: Vec<PathBuf>,
}

impl FileAbsentResource {
    /// Create a file absence resource.
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Resource for FileAbsentResource {
    fn description(&self) -> String {
        let paths: Vec<_> = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        format!("absent {}", paths.join(", "))
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        let present: Vec<_> = self.paths.iter().filter(|p| ctx.fs.exists(p)).collect();
        if present.is_empty() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("{} file(s) present", present.len()),
            })
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        let mut change = ResourceChange::AlreadyCorrect;
        for path in &self.paths {
            if !ctx.fs.exists(path) {
                continue;
            }
            ctx.fs.remove(path).map_err(|e| Error::io(path, e))?;
            ctx.changes.mark();
            ctx.log.info(&format!("Removed {}", path.display()));
            change = ResourceChange::Applied;
        }
        Ok(change)
    }
}
