//! Console and log-file output.
//!
//! Resources talk to a [`Log`]; [`Logger`] turns those calls into `tracing`
//! events that [`init_subscriber`] renders on the console and appends to
//! `$XDG_STATE_HOME/converge/<command>.log`.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::{Logger, RunSummary};
pub use subscriber::init_subscriber;
pub use types::{Log, TaskEntry, TaskStatus};

/// A [`Logger`] whose events reach a [`FileLayer`](subscriber::FileLayer)
/// writing into a fresh temporary directory.
///
/// Keep the returned guard alive for the duration of the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let path = tmp.path().join("converge").join("test.log");
    let file_layer = subscriber::FileLayer::open(&path, "test").expect("failed to open log file");
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (Logger::new(Some(path)), tmp, guard)
}

/// In-memory [`Log`] that records every message with a level prefix.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryLog {
    lines: std::sync::Mutex<Vec<String>>,
    tasks: std::sync::Mutex<Vec<TaskEntry>>,
}

#[cfg(test)]
impl MemoryLog {
    /// All messages logged so far, e.g. `INF Updating /etc/a:`.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Whether any logged message contains `needle`.
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    /// Recorded task entries.
    pub(crate) fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    fn push(&self, level: &str, msg: &str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(format!("{level} {msg}"));
        }
    }
}

#[cfg(test)]
impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("STG", msg);
    }
    fn info(&self, msg: &str) {
        self.push("INF", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("DBG", msg);
    }
    fn error(&self, msg: &str) {
        self.push("ERR", msg);
    }
    fn diff(&self, line: &str) {
        self.push("DIF", line);
    }
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.tasks.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
