//! Zero-context unified diffs for operator review of every write.
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::exec::Executor;
use crate::operations::join_lines;

/// Stand-in for the "before" side when a file did not exist.
const DEV_NULL: &str = "/dev/null";

/// Renders the change just written to `path`.
pub trait DiffReporter: Send + Sync + std::fmt::Debug {
    /// Render a zero-context unified diff.
    ///
    /// `backup` is the snapshot of `path` (`None` when the file was created)
    /// and `original` its lines; `after` is what was just written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Diff`] if the diff cannot be produced.
    fn render(
        &self,
        backup: Option<&Path>,
        path: &Path,
        original: &[String],
        after: &[String],
    ) -> Result<String>;
}

/// In-process diff built with the `similar` crate.
///
/// Compares the snapshot with the new lines.  After an earlier write the
/// same day that snapshot predates both writes, so the diff shows the
/// change accumulated since the first write of the day.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinDiff;

impl DiffReporter for BuiltinDiff {
    fn render(
        &self,
        backup: Option<&Path>,
        path: &Path,
        original: &[String],
        after: &[String],
    ) -> Result<String> {
        let old = join_lines(original);
        let new = join_lines(after);
        let from = backup.map_or_else(|| DEV_NULL.to_string(), |p| p.display().to_string());
        let to = path.display().to_string();

        let diff = similar::TextDiff::from_lines(old.as_str(), new.as_str());
        Ok(diff
            .unified_diff()
            .context_radius(0)
            .header(&from, &to)
            .to_string())
    }
}

/// Runs a `diff`-compatible utility between the snapshot and the new file.
///
/// Prefers `colordiff` when it is on `PATH`.  Exit status 0 (identical) and
/// 1 (different) both count as success.
#[derive(Debug, Clone)]
pub struct ExternalDiff {
    executor: Arc<dyn Executor>,
    program: String,
}

impl ExternalDiff {
    /// Pick `colordiff` if available, otherwise `diff`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        let program = if executor.which("colordiff") {
            "colordiff"
        } else {
            "diff"
        };
        Self::with_program(executor, program)
    }

    /// Use an explicit diff program.
    #[must_use]
    pub fn with_program(executor: Arc<dyn Executor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    /// The program this reporter invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl DiffReporter for ExternalDiff {
    fn render(
        &self,
        backup: Option<&Path>,
        path: &Path,
        _original: &[String],
        _after: &[String],
    ) -> Result<String> {
        let from = backup.map_or_else(|| DEV_NULL.into(), Path::to_string_lossy);
        let to = path.to_string_lossy();

        let result = self
            .executor
            .run(&self.program, &["--unified=0", &from, &to])
            .map_err(|e| Error::Diff {
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            })?;

        match result.code {
            Some(0 | 1) => Ok(result.stdout),
            code => Err(Error::Diff {
                path: path.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program,
                    code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    result.stderr.trim()
                ),
            }),
        }
    }
}
