//! Domain-specific error types for the provisioning engine.
//!
//! Library code returns the typed [`Error`]; command handlers at the CLI
//! boundary convert it to [`anyhow::Error`] via the standard `?` operator and
//! decide whether the run stops.
//!
//! # Error kinds
//!
//! ```text
//! Error
//! ├── NotFound         target file must already exist
//! ├── AmbiguousFormat  no style could be inferred for a config file
//! ├── InvalidSetting   a key or value that could never round-trip
//! ├── InvalidPattern   a line-removal pattern that is not a valid regex
//! ├── Install          an installed-file source that is not a file or directory
//! ├── Manifest         the run manifest could not be read or is invalid
//! ├── Diff             the diff collaborator failed
//! └── Io               read, snapshot, or write failure
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced by resource checks and apply operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The target file does not exist; this engine never creates config files
    /// from nothing.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// Style detection found both or neither kind of evidence.
    #[error(
        "cannot infer assignment style of {}: {shell} shell-style assignment(s), \
         {plain} plain assignment(s) and no shebang",
        path.display()
    )]
    AmbiguousFormat {
        /// File whose style could not be inferred.
        path: PathBuf,
        /// Number of `export KEY=VALUE` lines seen.
        shell: usize,
        /// Number of `KEY = VALUE` lines seen.
        plain: usize,
    },

    /// A desired setting cannot be represented as a single config line.
    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Offending key.
        key: String,
        /// Why the setting was rejected.
        reason: String,
    },

    /// A line-removal pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// An installed-file resource cannot be carried out.
    #[error("cannot install {}: {reason}", path.display())]
    Install {
        /// Source or target path concerned.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The manifest file is unreadable or describes an invalid run.
    #[error("invalid manifest {}: {message}", path.display())]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Human-readable description of the problem.
        message: String,
    },

    /// The diff collaborator could not render a diff.
    #[error("diff failed for {}: {reason}", path.display())]
    Diff {
        /// File that was being diffed.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },

    /// An I/O operation on `path` failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the path it concerns.
    ///
    /// A `NotFound` I/O error becomes [`Error::NotFound`] so that a file
    /// vanishing between the existence check and the read is reported the
    /// same way as a file that was never there.
    #[must_use]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;
