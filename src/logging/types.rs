//! Core logging types: task entries, status, and the [`Log`] trait.

/// Resource result for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Human-readable resource description.
    pub name: String,
    /// Final status of the resource.
    pub status: TaskStatus,
    /// Optional detail message (e.g., an error description).
    pub message: Option<String>,
}

/// Status of a completed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The resource was brought into the desired state.
    Changed,
    /// The resource was already in the desired state.
    Unchanged,
    /// The resource could not be applied; the run stopped here.
    Failed,
}

impl TaskStatus {
    /// Short label used in the run summary.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Unchanged => "ok",
            Self::Failed => "failed",
        }
    }
}

/// Display sink for progress, diffs and resource results.
///
/// [`Logger`](super::logger::Logger) routes messages through `tracing`;
/// tests substitute an in-memory sink so output can be asserted.
pub trait Log: Send + Sync {
    /// Log a stage header.
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (hidden on the console unless verbose).
    fn debug(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log one line of a rendered diff.
    fn diff(&self, line: &str);
    /// Record a resource result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
