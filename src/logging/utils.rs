//! Log file location, timestamps and escape stripping.
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// CSI escape sequences, as emitted by `colordiff` and the console formatter.
static CSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").ok());

/// Remove terminal escape sequences so log files stay greppable.
pub(super) fn strip_ansi(s: &str) -> Cow<'_, str> {
    CSI_ESCAPE
        .as_ref()
        .map_or(Cow::Borrowed(s), |re| re.replace_all(s, ""))
}

/// `$XDG_STATE_HOME/converge`, falling back to `$HOME/.local/state/converge`.
fn log_dir_from(state_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = state_home
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| PathBuf::from(h).join(".local").join("state")))?;
    Some(base.join("converge"))
}

/// Where the log of `command` is appended to, if a state directory is known.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = log_dir_from(
        std::env::var_os("XDG_STATE_HOME"),
        std::env::var_os("HOME"),
    )?;
    Some(dir.join(format!("{command}.log")))
}

/// Current local time with offset, e.g. `2024-03-01T09:30:00+01:00`.
pub(super) fn timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}
