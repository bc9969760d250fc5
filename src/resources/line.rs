//! Single-line resources inside existing files.
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::helpers::fs::commit_lines;
use super::{Resource, ResourceChange, ResourceState};
use crate::error::{Error, Result};
use crate::session::Context;

/// How lines of a file are recognised.
#[derive(Debug, Clone)]
pub enum LineMatch {
    /// The line contains this text anywhere.
    Contains(String),
    /// The line matches this regular expression.
    Pattern(Regex),
}

impl LineMatch {
    /// Compile `pattern` into a [`LineMatch::Pattern`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `pattern` does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Whether `line` is recognised.
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Contains(text) => line.contains(text.as_str()),
            Self::Pattern(re) => re.is_match(line),
        }
    }
}

impl fmt::Display for LineMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(text) => write!(f, "containing '{text}'"),
            Self::Pattern(re) => write!(f, "matching /{re}/"),
        }
    }
}

fn read_existing(ctx: &Context, path: &Path) -> Result<Vec<String>> {
    if !ctx.fs.exists(path) {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }
    ctx.fs.read_lines(path).map_err(|e| Error::io(path, e))
}

/// A line that must appear somewhere in an existing file.
///
/// By default the line counts as present when some line of the file contains
/// it, so `127.0.1.1 web1 # primary` satisfies `127.0.1.1 web1`.  When
/// nothing matches, the line is appended at the end.
#[derive(Debug, Clone)]
pub struct LinePresentResource {
    /// File to edit.  It must already exist.
    pub path: PathBuf,
    /// The line appended when missing.
    pub line: String,
    /// Presence test.
    pub matcher: LineMatch,
}

impl LinePresentResource {
    /// Create a line presence resource.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        let line = line.into();
        Self {
            path: path.into(),
            matcher: LineMatch::Contains(line.clone()),
            line,
        }
    }

    /// Count the line as present when any line matches `pattern` instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `pattern` does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.matcher = LineMatch::pattern(pattern)?;
        Ok(self)
    }

    fn is_present(&self, lines: &[String]) -> bool {
        lines.iter().any(|l| self.matcher.is_match(l))
    }
}

impl Resource for LinePresentResource {
    fn description(&self) -> String {
        format!("line in {}: {}", self.path.display(), self.line)
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        if !ctx.fs.exists(&self.path) {
            return Ok(ResourceState::Missing);
        }
        if self.is_present(&read_existing(ctx, &self.path)?) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: "line absent".to_string(),
            })
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        let mut lines = read_existing(ctx, &self.path)?;
        if self.is_present(&lines) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        ctx.log
            .debug(&format!("adding to {}: {}", self.path.display(), self.line));
        lines.push(self.line.clone());
        commit_lines(ctx, &self.path, &lines)?;
        Ok(ResourceChange::Applied)
    }
}

/// Lines that must not appear in an existing file.
#[derive(Debug, Clone)]
pub struct LineAbsentResource {
    /// File to edit.  It must already exist.
    pub path: PathBuf,
    /// Lines recognised by this are deleted.
    pub matcher: LineMatch,
}

impl LineAbsentResource {
    /// Delete every line matching the regular expression `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `pattern` does not compile.
    pub fn new(path: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        Ok(Self::with_matcher(path, LineMatch::pattern(pattern)?))
    }

    /// Delete every line recognised by `matcher`.
    #[must_use]
    pub fn with_matcher(path: impl Into<PathBuf>, matcher: LineMatch) -> Self {
        Self {
            path: path.into(),
            matcher,
        }
    }

    fn partition(&self, lines: &[String]) -> (Vec<String>, Vec<String>) {
        lines
            .iter()
            .cloned()
            .partition(|line| !self.matcher.is_match(line))
    }
}

impl Resource for LineAbsentResource {
    fn description(&self) -> String {
        format!("no line in {} {}", self.path.display(), self.matcher)
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        if !ctx.fs.exists(&self.path) {
            return Ok(ResourceState::Missing);
        }
        let (_, matched) = self.partition(&read_existing(ctx, &self.path)?);
        if matched.is_empty() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("{} matching line(s)", matched.len()),
            })
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        let (kept, removed) = self.partition(&read_existing(ctx, &self.path)?);
        if removed.is_empty() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        for line in &removed {
            ctx.log
                .debug(&format!("deleting from {}: {line}", self.path.display()));
        }
        commit_lines(ctx, &self.path, &kept)?;
        Ok(ResourceChange::Applied)
    }
}
