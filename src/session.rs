//! Session state shared by every resource during one provisioning run.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::{Clock, FixedClock};
use crate::diff::{BuiltinDiff, DiffReporter};
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Records whether any operation changed state since the last reset.
///
/// Every mutating operation calls [`mark`](Self::mark).  The flag is
/// monotonic: a later no-op never clears it, only [`reset`](Self::reset)
/// does.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    changed: AtomicBool,
}

impl ChangeTracker {
    /// Create a tracker with nothing changed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changed: AtomicBool::new(false),
        }
    }

    /// Note that something changed.
    pub fn mark(&self) {
        self.changed.store(true, Ordering::SeqCst);
    }

    /// Forget previously recorded changes.
    pub fn reset(&self) {
        self.changed.store(false, Ordering::SeqCst);
    }

    /// Whether anything changed since creation or the last reset.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }
}

/// Shared context for resource execution.
///
/// Owned by the orchestrator and passed by reference to every resource, so
/// tests can build a fresh context per case instead of resetting global
/// state.
pub struct Context {
    /// Filesystem operation abstraction.
    pub fs: Arc<dyn FileSystemOps>,
    /// Date source for backup names.
    pub clock: Arc<dyn Clock>,
    /// Renders before/after diffs for review.
    pub diff: Arc<dyn DiffReporter>,
    /// Display sink for progress and diff text.
    pub log: Arc<dyn Log>,
    /// Session-wide change flag.
    pub changes: ChangeTracker,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("fs", &self.fs)
            .field("clock", &self.clock)
            .field("diff", &self.diff)
            .field("log", &"<dyn Log>")
            .field("changes", &self.changes)
            .finish()
    }
}

impl Context {
    /// Create a context that talks to the real filesystem, pins today's
    /// local date, and renders diffs in-process.
    #[must_use]
    pub fn new(log: Arc<dyn Log>) -> Self {
        Self {
            fs: Arc::new(SystemFileSystemOps),
            clock: Arc::new(FixedClock::local_today()),
            diff: Arc::new(BuiltinDiff),
            log,
            changes: ChangeTracker::new(),
        }
    }

    /// Replace the filesystem implementation.
    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FileSystemOps>) -> Self {
        self.fs = fs;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the diff reporter.
    #[must_use]
    pub fn with_diff(mut self, diff: Arc<dyn DiffReporter>) -> Self {
        self.diff = diff;
        self
    }
}
