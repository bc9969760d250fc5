//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::{self, IsTerminal as _, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::utils::{log_file_path, strip_ansi, timestamp};

/// Target of stage headers.
pub(super) const STAGE_TARGET: &str = "converge::stage";
/// Target of diff lines.
pub(super) const DIFF_TARGET: &str = "converge::diff";

/// What a tracing event stands for in converge output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    Diff,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(metadata: &tracing::Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (tracing::Level::ERROR, _) => Self::Error,
            (tracing::Level::WARN, _) => Self::Warn,
            (tracing::Level::INFO, STAGE_TARGET) => Self::Stage,
            (tracing::Level::INFO, DIFF_TARGET) => Self::Diff,
            (tracing::Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Stage => "STAGE",
            Self::Diff => "DIFF",
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

/// Collects the `message` field of an event.
#[derive(Debug, Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

fn message(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

fn paint(code: &str, text: &str) -> String {
    format!("\x1b[{code}m{text}\x1b[0m")
}

/// SGR code for a unified diff line, by its leading marker.
fn diff_color(line: &str) -> Option<&'static str> {
    if line.starts_with("+++") || line.starts_with("---") {
        Some("1")
    } else if line.starts_with("@@") {
        Some("36")
    } else if line.starts_with('+') {
        Some("32")
    } else if line.starts_with('-') {
        Some("31")
    } else {
        None
    }
}

/// Console text for one message.
///
/// Diff lines that already carry escapes (from `colordiff`) are passed
/// through when colour is on.
fn console_line(kind: Kind, msg: &str, color: bool) -> String {
    if !color {
        let msg = strip_ansi(msg);
        return match kind {
            Kind::Stage => format!(":: {msg}"),
            Kind::Error => format!("error: {msg}"),
            Kind::Warn => format!("warning: {msg}"),
            Kind::Diff | Kind::Info | Kind::Debug => msg.into_owned(),
        };
    }
    match kind {
        Kind::Stage => paint("1", &format!(":: {msg}")),
        Kind::Error => format!("{} {msg}", paint("1;31", "error:")),
        Kind::Warn => format!("{} {msg}", paint("1;33", "warning:")),
        Kind::Diff if msg.contains('\x1b') => msg.to_string(),
        Kind::Diff => diff_color(msg).map_or_else(|| msg.to_string(), |code| paint(code, msg)),
        Kind::Info => msg.to_string(),
        Kind::Debug => paint("2", msg),
    }
}

/// Log file text for one message.
fn file_line(ts: &str, kind: Kind, msg: &str) -> String {
    format!("{ts} {:<5} {}", kind.tag(), strip_ansi(msg))
}

/// A [`tracing_subscriber::Layer`] appending every event to a log file.
///
/// Each run starts with a `RUN` line, so one file holds the history of a
/// command across runs.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open `path` for appending, creating it and its directory.
    pub(super) fn open(path: &Path, command: &str) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(
            file,
            "{} RUN   converge {} {command}",
            timestamp(),
            crate::commands::version::version()
        )?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let line = file_line(&timestamp(), Kind::of(event.metadata()), &message(event));
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Formats console events with [`console_line`].
#[derive(Debug)]
struct ConsoleFormatter {
    color: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let kind = Kind::of(event.metadata());
        writeln!(writer, "{}", console_line(kind, &message(event), self.color))
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Errors and warnings go to stderr, everything else to stdout.  `RUST_LOG`
/// overrides the console level when set; colour is used only on a terminal
/// and never when `NO_COLOR` is set.  Every event, including `debug`, is
/// appended to the log file of `command`, whose path is returned when it
/// could be opened.  Must be called once at program startup.
#[must_use]
pub fn init_subscriber(verbose: bool, command: &str) -> Option<PathBuf> {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();
    let color = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();

    let make_writer = io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter { color })
        .with_writer(make_writer)
        .with_filter(console_filter);

    let log_file = log_file_path(command);
    let file_layer = log_file
        .as_deref()
        .and_then(|path| FileLayer::open(path, command).ok())
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));
    let opened = file_layer.is_some();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    log_file.filter(|_| opened)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn plain_console_lines() {
        assert_eq!(console_line(Kind::Stage, "Applying", false), ":: Applying");
        assert_eq!(console_line(Kind::Error, "boom", false), "error: boom");
        assert_eq!(console_line(Kind::Diff, "\x1b[31m-A = 1\x1b[0m", false), "-A = 1");
        assert_eq!(console_line(Kind::Info, "Updating /etc/a:", false), "Updating /etc/a:");
    }

    #[test]
    fn colored_diff_lines_by_marker() {
        assert_eq!(console_line(Kind::Diff, "+A = 2", true), "\x1b[32m+A = 2\x1b[0m");
        assert_eq!(console_line(Kind::Diff, "-A = 1", true), "\x1b[31m-A = 1\x1b[0m");
        assert_eq!(console_line(Kind::Diff, "@@ -1 +1 @@", true), "\x1b[36m@@ -1 +1 @@\x1b[0m");
        assert_eq!(
            console_line(Kind::Diff, "--- /etc/a.2024-03-01", true),
            "\x1b[1m--- /etc/a.2024-03-01\x1b[0m"
        );
    }

    #[test]
    fn colordiff_output_passes_through() {
        let line = "\x1b[0;32m+A = 2\x1b[0;0m";
        assert_eq!(console_line(Kind::Diff, line, true), line);
    }

    #[test]
    fn file_lines_are_tagged_and_stripped() {
        assert_eq!(
            file_line("T", Kind::Diff, "\x1b[0;32m+A = 2\x1b[0;0m"),
            "T DIFF  +A = 2"
        );
        assert_eq!(file_line("T", Kind::Stage, "Applying"), "T STAGE Applying");
    }

    #[test]
    fn file_layer_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/converge/apply.log");
        drop(FileLayer::open(&path, "apply").unwrap());
        drop(FileLayer::open(&path, "apply").unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(" RUN   converge ").count(), 2, "{content}");
    }
}
