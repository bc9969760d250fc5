//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that resources can be unit-tested
//! without touching the real filesystem.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MockFileSystemOps`.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem calls made by resources.
///
/// Files are handled as ordered line sequences: reading strips each line
/// terminator (`\n` or `\r\n`), writing terminates every line with the
/// dominant terminator of the file being replaced (`\n` for new files).
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists (following symlinks).
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Read every line of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Read the raw bytes of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Entries directly inside the directory `path`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be listed.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Replace the contents of `path` with `lines`, each terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write_lines(&self, path: &Path, lines: &[String]) -> io::Result<()>;

    /// Copy the bytes of `from` to `to`, overwriting `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if either path cannot be accessed.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove the file or symlink at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Create `path` and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Line terminator written back to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The terminator used by most lines of `content`.
    ///
    /// Ties and content without any terminator count as [`LineEnding::Lf`].
    ///
    /// # Examples
    ///
    /// ```
    /// use converge::operations::LineEnding;
    ///
    /// assert_eq!(LineEnding::detect("A = 1\r\nB = 2\r\n"), LineEnding::CrLf);
    /// assert_eq!(LineEnding::detect("A = 1\nB = 2\r\nC = 3\n"), LineEnding::Lf);
    /// assert_eq!(LineEnding::detect("no terminator"), LineEnding::Lf);
    /// ```
    #[must_use]
    pub fn detect(content: &str) -> Self {
        let crlf = content.matches("\r\n").count();
        let lf = content.matches('\n').count() - crlf;
        if crlf > lf { Self::CrLf } else { Self::Lf }
    }

    /// The terminator itself.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Join `lines`, terminating each with this ending.
    #[must_use]
    pub fn join(self, lines: &[String]) -> String {
        lines.iter().fold(String::new(), |mut out, line| {
            let _ = write!(out, "{line}{}", self.as_str());
            out
        })
    }
}

/// Join `lines` into file content, terminating each with `\n`.
#[must_use]
pub fn join_lines(lines: &[String]) -> String {
    LineEnding::Lf.join(lines)
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let content = std::fs::read_to_string(path)?;
        Ok(content.lines().map(String::from).collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn write_lines(&self, path: &Path, lines: &[String]) -> io::Result<()> {
        let ending = std::fs::read_to_string(path)
            .map_or(LineEnding::Lf, |current| LineEnding::detect(&current));
        std::fs::write(path, ending.join(lines))
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// In-memory [`FileSystemOps`] for unit tests.
///
/// Files are stored as line vectors.  Every mutating call is counted so tests
/// can assert that a no-op run performed no writes.
///
/// ```ignore
/// let fs = MockFileSystemOps::new().with_file("/etc/app.conf", &["A = 1"]);
/// assert!(fs.exists(Path::new("/etc/app.conf")));
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    files: std::sync::Mutex<std::collections::BTreeMap<PathBuf, Vec<String>>>,
    dirs: std::sync::Mutex<std::collections::BTreeSet<PathBuf>>,
    writes: std::sync::atomic::AtomicUsize,
    fail_writes: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MockFileSystemOps {
    /// Create an empty mock filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with the given lines.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, lines: &[&str]) -> Self {
        self.files
            .lock()
            .expect("mock files poisoned")
            .insert(path.into(), lines.iter().map(|l| (*l).to_string()).collect());
        self
    }

    /// Seed an existing directory.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.dirs
            .lock()
            .expect("mock dirs poisoned")
            .insert(path.into());
        self
    }

    /// Make every write, copy, and removal fail with `PermissionDenied`.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Current lines of `path`, if it exists.
    #[must_use]
    pub fn lines(&self, path: &str) -> Option<Vec<String>> {
        self.files
            .lock()
            .expect("mock files poisoned")
            .get(Path::new(path))
            .cloned()
    }

    /// Number of mutating calls performed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn mutate(&self) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .expect("mock files poisoned")
            .contains_key(path)
            || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.lock().expect("mock dirs poisoned").contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .expect("mock files poisoned")
            .contains_key(path)
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        self.files
            .lock()
            .expect("mock files poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.read_lines(path).map(|lines| join_lines(&lines).into_bytes())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        let files = self.files.lock().expect("mock files poisoned");
        let dirs = self.dirs.lock().expect("mock dirs poisoned");
        let mut entries: Vec<PathBuf> = files
            .keys()
            .chain(dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }

    fn write_lines(&self, path: &Path, lines: &[String]) -> io::Result<()> {
        self.mutate()?;
        self.files
            .lock()
            .expect("mock files poisoned")
            .insert(path.to_path_buf(), lines.to_vec());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let lines = self.read_lines(from)?;
        self.write_lines(to, &lines)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.mutate()?;
        self.files
            .lock()
            .expect("mock files poisoned")
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.mutate()?;
        let mut dirs = self.dirs.lock().expect("mock dirs poisoned");
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }
}
