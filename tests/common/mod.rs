// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed site root and a recording log sink so
// each integration test can run resources against the real filesystem
// without repeating boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use converge::clock::FixedClock;
use converge::diff::BuiltinDiff;
use converge::logging::{Log, TaskEntry, TaskStatus};
use converge::session::Context;

/// Date pinned for every test context.
pub const TODAY: &str = "2024-03-01";

/// A [`Log`] that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<TaskEntry>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log poisoned").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    pub fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().expect("log poisoned").clone()
    }

    fn push(&self, msg: &str) {
        self.lines.lock().expect("log poisoned").push(msg.to_string());
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push(msg);
    }
    fn info(&self, msg: &str) {
        self.push(msg);
    }
    fn debug(&self, msg: &str) {
        self.push(msg);
    }
    fn error(&self, msg: &str) {
        self.push(msg);
    }
    fn diff(&self, line: &str) {
        self.push(line);
    }
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.tasks.lock().expect("log poisoned").push(TaskEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// An isolated site root backed by a [`tempfile::TempDir`].
pub struct TestSite {
    pub root: tempfile::TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Absolute path of `rel` inside the site.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Write `content` verbatim to `rel`, creating parents.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Read `rel` as a string.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read file")
    }

    /// Backup path of `rel` for [`TODAY`].
    pub fn backup(&self, rel: &str) -> PathBuf {
        self.path(&format!("{rel}.{TODAY}"))
    }

    /// Every file in the site root whose name starts with `<name>.`.
    pub fn backups_of(&self, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{name}.");
        let mut found: Vec<PathBuf> = std::fs::read_dir(self.root.path())
            .expect("read site root")
            .map(|e| e.expect("dir entry").path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        found.sort();
        found
    }

    /// A context on the real filesystem with a pinned date and the built-in
    /// diff.
    pub fn context(&self) -> (Context, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::default());
        let ctx = Context::new(log.clone())
            .with_clock(Arc::new(FixedClock::new(TODAY)))
            .with_diff(Arc::new(BuiltinDiff));
        (ctx, log)
    }
}
