//! Idempotent resource primitives (check + apply pattern).
pub mod config_file;
pub mod directory;
pub mod file;
pub mod helpers;
pub mod install;
pub mod line;

use crate::error::Result;
use crate::session::Context;

/// State of a resource on disk.
///
/// # Examples
///
/// ```
/// use converge::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "2 keys to update".into() };
///
/// assert_ne!(missing, correct);
/// assert_ne!(wrong, correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// Short description of what differs.
        current: String,
    },
}

/// Result of applying a resource.
///
/// # Examples
///
/// ```
/// use converge::resources::ResourceChange;
///
/// assert!(ResourceChange::Applied.changed());
/// assert!(!ResourceChange::AlreadyCorrect.changed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct; nothing was touched.
    AlreadyCorrect,
}

impl ResourceChange {
    /// Whether this result modified anything.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Unified interface for resources that can be checked and applied.
///
/// `apply` must be idempotent: once it has returned
/// [`ResourceChange::Applied`], an immediate second call returns
/// [`ResourceChange::AlreadyCorrect`] without writing.  Every implementation
/// marks [`Context::changes`] when, and only when, it changes something.
pub trait Resource: std::fmt::Debug {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Check the current state without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self, ctx: &Context) -> Result<ResourceState>;

    /// Bring the resource into the desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be applied; the caller is
    /// expected to stop the run.
    fn apply(&self, ctx: &Context) -> Result<ResourceChange>;
}

/// Shared test helpers for resource unit tests.
#[cfg(test)]
pub mod test_helpers {
    use crate::clock::FixedClock;
    use crate::diff::BuiltinDiff;
    use crate::exec::{ExecResult, Executor};
    use crate::logging::MemoryLog;
    use crate::operations::MockFileSystemOps;
    use crate::session::Context;
    use std::collections::VecDeque;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// Date every mock context reports as today.
    pub const TODAY: &str = "2024-03-01";

    /// Build a [`Context`] over `fs` with a [`MemoryLog`], a fixed date of
    /// [`TODAY`] and the built-in diff.
    pub fn mock_context(fs: MockFileSystemOps) -> (Context, Arc<MockFileSystemOps>, Arc<MemoryLog>) {
        let fs = Arc::new(fs);
        let log = Arc::new(MemoryLog::default());
        let ctx = Context::new(log.clone())
            .with_fs(fs.clone())
            .with_clock(Arc::new(FixedClock::new(TODAY)))
            .with_diff(Arc::new(BuiltinDiff));
        (ctx, fs, log)
    }

    /// A configurable mock executor.
    ///
    /// Maintains a queue of `(exit code, stdout)` responses consumed in FIFO
    /// order.  When the queue is empty any call fails with exit code 127 and
    /// stdout `"unexpected call"`.
    #[derive(Debug)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(i32, String)>>,
        which_result: bool,
        call_count: AtomicUsize,
    }

    impl MockExecutor {
        /// Create a mock with a single successful response.
        #[must_use]
        pub fn ok(stdout: &str) -> Self {
            Self::with_codes(vec![(0, stdout.to_string())])
        }

        /// Create a mock with a single failed response (empty stdout).
        #[must_use]
        pub fn fail() -> Self {
            Self::with_codes(vec![(1, String::new())])
        }

        /// Create a mock from an ordered list of `(exit code, stdout)` pairs.
        #[must_use]
        pub fn with_codes(responses: Vec<(i32, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                which_result: false,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Set the value returned by every [`Executor::which`] call.
        #[must_use]
        pub fn with_which(mut self, result: bool) -> Self {
            self.which_result = result;
            self
        }

        /// Total number of executor calls made so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn next(&self) -> ExecResult {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let (code, stdout) = self.responses.lock().map_or_else(
                |_| (127, "mutex poisoned".to_string()),
                |mut guard| {
                    guard
                        .pop_front()
                        .unwrap_or_else(|| (127, "unexpected call".to_string()))
                },
            );
            ExecResult {
                stdout,
                stderr: String::new(),
                success: code == 0,
                code: Some(code),
            }
        }
    }

    impl Executor for MockExecutor {
        fn run(&self, _: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
            Ok(self.next())
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }
}
