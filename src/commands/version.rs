//! Command: print version information.
use std::io::{self, Write as _};

/// Version stamped by the build script, falling back to the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("CONVERGE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the converge version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> io::Result<()> {
    writeln!(io::stdout().lock(), "converge {}", version())
}
