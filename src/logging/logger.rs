//! [`Log`] implementation over `tracing`, with the end-of-run summary.
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DIFF_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};

/// Resource counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Resources that were changed.
    pub changed: usize,
    /// Resources that were already correct.
    pub unchanged: usize,
    /// Resources that failed.
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} changed, {} unchanged, {} failed",
            self.changed, self.unchanged, self.failed
        )
    }
}

/// Logger that emits `tracing` events and remembers resource results.
///
/// Every event also reaches the log file installed by
/// [`init_subscriber`](super::subscriber::init_subscriber).
#[derive(Debug, Default)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger; `log_file` is only mentioned in the summary.
    #[must_use]
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            log_file,
        }
    }

    fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Counts of the recorded results.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.tasks()
            .iter()
            .fold(RunSummary::default(), |mut sum, task| {
                match task.status {
                    TaskStatus::Changed => sum.changed += 1,
                    TaskStatus::Unchanged => sum.unchanged += 1,
                    TaskStatus::Failed => sum.failed += 1,
                }
                sum
            })
    }

    /// Log the resources that changed or failed, then the counts.
    ///
    /// Resources that were already correct only appear in the counts.
    pub fn print_summary(&self) {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return;
        }
        self.stage("Summary");
        for task in tasks.iter().filter(|t| t.status != TaskStatus::Unchanged) {
            self.info(&format!("{:<8}{}", task.status.label(), task.name));
        }
        self.info(&self.summary().to_string());
        if let Some(path) = &self.log_file {
            self.debug(&format!("log: {}", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn diff(&self, line: &str) {
        tracing::info!(target: DIFF_TARGET, "{line}");
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
