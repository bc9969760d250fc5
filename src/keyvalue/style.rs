//! Assignment style of a key/value file and its detection.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use super::grammar::{self, Spacing};
use crate::error::{Error, Result};

/// Interpreters whose presence in a shebang marks a shell script.
const SHELL_INTERPRETERS: &[&str] = &["bash", "zsh", "sh", "dash", "csh", "ash"];

/// How assignments are written in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// `export KEY=VALUE`
    Shell,
    /// `KEY = VALUE`
    Plain,
}

impl Style {
    /// Render the canonical assignment line for `key` and `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use converge::keyvalue::Style;
    ///
    /// assert_eq!(Style::Shell.render("RAILS_ENV", "production"), "export RAILS_ENV=production");
    /// assert_eq!(Style::Plain.render("vm-swappiness", "10"), "vm-swappiness = 10");
    /// ```
    #[must_use]
    pub fn render(self, key: &str, value: &str) -> String {
        match self {
            Self::Shell => format!("export {key}={value}"),
            Self::Plain => format!("{key} = {value}"),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shell => "shell",
            Self::Plain => "plain",
        })
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shell" => Ok(Self::Shell),
            "plain" => Ok(Self::Plain),
            other => Err(format!("unknown style '{other}' (expected shell or plain)")),
        }
    }
}

/// Infers a file's [`Style`].
///
/// Rules, first match wins:
///
/// 1. a `#!` first line decides: a known shell interpreter means
///    [`Style::Shell`], anything else [`Style::Plain`];
/// 2. a registered path override;
/// 3. evidence from the assignment lines: `export KEY=value` with nothing
///    around `=` counts for shell, `KEY = value` counts for plain.  Exactly
///    one kind of evidence must be present, otherwise detection fails with
///    [`Error::AmbiguousFormat`].
#[derive(Debug, Clone)]
pub struct FormatDetector {
    overrides: Vec<(PathBuf, Style)>,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self {
            overrides: vec![(PathBuf::from("/etc/sysctl.conf"), Style::Plain)],
        }
    }
}

impl FormatDetector {
    /// A detector with the built-in path overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a path whose style is fixed.
    #[must_use]
    pub fn with_override(mut self, path: impl Into<PathBuf>, style: Style) -> Self {
        let path = path.into();
        self.overrides.retain(|(p, _)| *p != path);
        self.overrides.push((path, style));
        self
    }

    /// Detect the style of the file at `path` whose content is `lines`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousFormat`] when neither the shebang, an
    /// override, nor the line evidence settles the style.
    pub fn detect(&self, path: &Path, lines: &[String]) -> Result<Style> {
        if let Some(first) = lines.first()
            && let Some(interpreter) = first.strip_prefix("#!")
        {
            return Ok(shebang_style(interpreter));
        }

        if let Some((_, style)) = self.overrides.iter().find(|(p, _)| p == path) {
            return Ok(*style);
        }

        let (mut shell, mut plain) = (0, 0);
        for assignment in lines.iter().filter_map(|l| grammar::parse(l)) {
            match assignment.spacing {
                Spacing::Tight if assignment.export => shell += 1,
                Spacing::Spaced => plain += 1,
                _ => {}
            }
        }

        match (shell, plain) {
            (1.., 0) => Ok(Style::Shell),
            (0, 1..) => Ok(Style::Plain),
            _ => Err(Error::AmbiguousFormat {
                path: path.to_path_buf(),
                shell,
                plain,
            }),
        }
    }
}

fn shebang_style(interpreter: &str) -> Style {
    let is_shell = interpreter
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| SHELL_INTERPRETERS.contains(&word));
    if is_shell { Style::Shell } else { Style::Plain }
}
