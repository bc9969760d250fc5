//! Directory presence resource.
use std::path::PathBuf;

use super::{Resource, ResourceChange, ResourceState};
use crate::error::{Error, Result};
use crate::session::Context;

/// A directory that must exist, created with its parents when missing.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Directory path.
    pub path: PathBuf,
}

impl DirectoryResource {
    /// Create a directory resource.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Resource for DirectoryResource {
    fn description(&self) -> String {
        format!("directory {}", self.path.display())
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        if ctx.fs.is_dir(&self.path) {
            Ok(ResourceState::Correct)
        } else if ctx.fs.exists(&self.path) {
            Ok(ResourceState::Incorrect {
                current: "not a directory".to_string(),
            })
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        if ctx.fs.is_dir(&self.path) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        ctx.fs
            .create_dir_all(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        ctx.changes.mark();
        ctx.log
            .info(&format!("Created directory {}", self.path.display()));
        Ok(ResourceChange::Applied)
    }
}
