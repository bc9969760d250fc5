//! Command: print the detected assignment style of a file.
use std::io::{self, Write as _};

use anyhow::{Context as _, Result};

use crate::cli::DetectOpts;
use crate::keyvalue::{FormatDetector, Style};
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Detect the style of `opts.path` with the default detector.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its style is ambiguous.
pub fn detect(opts: &DetectOpts, fs: &dyn FileSystemOps) -> Result<Style> {
    let lines = fs
        .read_lines(&opts.path)
        .map_err(|e| crate::error::Error::io(&opts.path, e))?;
    let style = FormatDetector::new()
        .detect(&opts.path, &lines)
        .with_context(|| format!("detecting style of {}", opts.path.display()))?;
    Ok(style)
}

/// Print the style of `opts.path` to stdout.
///
/// # Errors
///
/// Propagates errors from [`detect`].
pub fn run(opts: &DetectOpts) -> Result<()> {
    let style = detect(opts, &SystemFileSystemOps)?;
    writeln!(io::stdout().lock(), "{style}").context("writing to stdout")?;
    Ok(())
}
