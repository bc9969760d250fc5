//! TOML manifest describing one provisioning run.
//!
//! ```toml
//! [[dir]]
//! path = "/var/log/app"
//!
//! [[config]]
//! path = "/etc/default/app"
//! style = "shell"
//! settings = [{ key = "RAILS_ENV", value = "production" }]
//!
//! [[install]]
//! source = "files"
//! path = "/etc/nginx"
//! ```
//!
//! Resources are built in a fixed order: directories, files, installs,
//! configs, lines, line removals, absences.  `[[file]]`, `[[install]]` and
//! `[[line]]` take `present = false` to require absence instead.
mod validation;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::keyvalue::{Settings, Style};
use crate::resources::Resource;
use crate::resources::config_file::ConfigFileResource;
use crate::resources::directory::DirectoryResource;
use crate::resources::file::{FileAbsentResource, FileContentsResource};
use crate::resources::install::InstalledFileResource;
use crate::resources::line::{LineAbsentResource, LineMatch, LinePresentResource};

const fn yes() -> bool {
    true
}

/// A `[[config]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigEntry {
    /// File to reconcile.
    pub path: String,
    /// Optional fixed style.
    #[serde(default)]
    pub style: Option<Style>,
    /// Desired settings, in append order.
    #[serde(default)]
    pub settings: Vec<SettingEntry>,
}

/// One `{ key = ..., value = ... }` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingEntry {
    /// Setting key.
    pub key: String,
    /// String, integer, float or boolean value.
    pub value: toml::Value,
}

/// A `[[file]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Target file.
    pub path: String,
    /// Exact lines of the file.
    #[serde(default)]
    pub contents: Vec<String>,
    /// When false the file must not exist.
    #[serde(default = "yes")]
    pub present: bool,
}

/// A `[[line]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineEntry {
    /// File that must contain the line.
    pub path: String,
    /// Line appended when no line of the file contains it.
    pub line: String,
    /// Regular expression recognising the line instead of containment.
    #[serde(default)]
    pub pattern: Option<String>,
    /// When false every recognised line is deleted instead.
    #[serde(default = "yes")]
    pub present: bool,
}

/// An `[[install]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallEntry {
    /// Root of the mirrored source tree, relative to the manifest's directory
    /// unless absolute.
    pub source: String,
    /// Absolute target file or directory.
    pub path: String,
    /// Overwrite targets without snapshotting them.
    #[serde(default)]
    pub no_backup: bool,
    /// Install files as `<path>.tmp`.
    #[serde(default)]
    pub temporary: bool,
    /// When false the target file must not exist.
    #[serde(default = "yes")]
    pub present: bool,
}

/// A `[[remove_line]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveLineEntry {
    /// File to clean.
    pub path: String,
    /// Regular expression of lines to delete.
    pub pattern: String,
}

/// An `[[absent]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbsentEntry {
    /// Files that must not exist.
    pub paths: Vec<String>,
}

/// A `[[dir]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirEntry {
    /// Directory that must exist.
    pub path: String,
}

/// Parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Where the manifest was read from, for error messages.
    #[serde(skip)]
    pub source: PathBuf,
    /// `[[dir]]` entries.
    #[serde(default, rename = "dir")]
    pub dirs: Vec<DirEntry>,
    /// `[[file]]` entries.
    #[serde(default, rename = "file")]
    pub files: Vec<FileEntry>,
    /// `[[install]]` entries.
    #[serde(default, rename = "install")]
    pub installs: Vec<InstallEntry>,
    /// `[[config]]` entries.
    #[serde(default, rename = "config")]
    pub configs: Vec<ConfigEntry>,
    /// `[[line]]` entries.
    #[serde(default, rename = "line")]
    pub lines: Vec<LineEntry>,
    /// `[[remove_line]]` entries.
    #[serde(default, rename = "remove_line")]
    pub remove_lines: Vec<RemoveLineEntry>,
    /// `[[absent]]` entries.
    #[serde(default, rename = "absent")]
    pub absents: Vec<AbsentEntry>,
}

/// Read and parse the manifest at `path`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file does not exist, [`Error::Io`] if
/// it cannot be read, and [`Error::Manifest`] if it is not a valid manifest.
pub fn load(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(path, &content)
}

/// Parse manifest text; `source` is only used in error messages.
///
/// # Errors
///
/// Returns [`Error::Manifest`] if `content` is not a valid manifest.
pub fn parse(source: &Path, content: &str) -> Result<Manifest> {
    let mut manifest: Manifest = toml::from_str(content).map_err(|e| Error::Manifest {
        path: source.to_path_buf(),
        message: e.to_string().trim_end().to_string(),
    })?;
    manifest.source = source.to_path_buf();
    Ok(manifest)
}

impl Manifest {
    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dirs.len()
            + self.files.len()
            + self.installs.len()
            + self.configs.len()
            + self.lines.len()
            + self.remove_lines.len()
            + self.absents.len()
    }

    /// Whether the manifest declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every entry and build the resources in execution order.
    ///
    /// `home` is substituted for a leading `~`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] for a relative path, an unusable `~`, a
    /// bad or duplicated key, or an unsupported value, and
    /// [`Error::InvalidPattern`] for a regex that does not compile.
    pub fn resources(&self, home: Option<&Path>) -> Result<Vec<Box<dyn Resource>>> {
        let fail = |entry: String, message: String| Error::Manifest {
            path: self.source.clone(),
            message: format!("{entry}: {message}"),
        };
        let resolve = |entry: &str, index: usize, raw: &str| {
            validation::resolve_path(raw, home)
                .map_err(|m| fail(format!("[[{entry}]] #{}", index + 1), m))
        };

        let mut out: Vec<Box<dyn Resource>> = Vec::with_capacity(self.len());

        for (i, d) in self.dirs.iter().enumerate() {
            out.push(Box::new(DirectoryResource::new(resolve("dir", i, d.path.as_str())?)));
        }

        for (i, f) in self.files.iter().enumerate() {
            let path = resolve("file", i, f.path.as_str())?;
            if f.present {
                out.push(Box::new(FileContentsResource::new(path, f.contents.clone())));
            } else {
                out.push(Box::new(FileAbsentResource::new(vec![path])));
            }
        }

        let base = self.source.parent().map(Path::to_path_buf).unwrap_or_default();
        for (i, e) in self.installs.iter().enumerate() {
            let path = resolve("install", i, e.path.as_str())?;
            if !e.present {
                out.push(Box::new(FileAbsentResource::new(vec![path])));
                continue;
            }
            let source = validation::resolve_source(e.source.as_str(), &base, home)
                .map_err(|m| fail(format!("[[install]] #{}", i + 1), m))?;
            out.push(Box::new(
                InstalledFileResource::new(source, path)
                    .with_backup(!e.no_backup)
                    .with_temporary(e.temporary),
            ));
        }

        for (i, c) in self.configs.iter().enumerate() {
            let path = resolve("config", i, c.path.as_str())?;
            let settings = validation::settings(&c.settings)
                .map_err(|m| fail(format!("[[config]] {}", path.display()), m))?;
            out.push(Box::new(
                ConfigFileResource::new(path, settings).with_style(c.style),
            ));
        }

        for (i, l) in self.lines.iter().enumerate() {
            let path = resolve("line", i, l.path.as_str())?;
            if l.present {
                let resource = LinePresentResource::new(path, l.line.clone());
                out.push(Box::new(match &l.pattern {
                    Some(pattern) => resource.with_pattern(pattern)?,
                    None => resource,
                }));
            } else {
                let matcher = match &l.pattern {
                    Some(pattern) => LineMatch::pattern(pattern)?,
                    None => LineMatch::Contains(l.line.clone()),
                };
                out.push(Box::new(LineAbsentResource::with_matcher(path, matcher)));
            }
        }

        for (i, r) in self.remove_lines.iter().enumerate() {
            out.push(Box::new(LineAbsentResource::new(
                resolve("remove_line", i, r.path.as_str())?,
                &r.pattern,
            )?));
        }

        for (i, a) in self.absents.iter().enumerate() {
            let paths = a
                .paths
                .iter()
                .map(|p| resolve("absent", i, p.as_str()))
                .collect::<Result<Vec<_>>>()?;
            out.push(Box::new(FileAbsentResource::new(paths)));
        }

        Ok(out)
    }
}

/// Settings of one `[[config]]` entry.
///
/// # Errors
///
/// Returns a message naming the first invalid, duplicated or unsupported
/// setting.
pub fn config_settings(entry: &ConfigEntry) -> std::result::Result<Settings, String> {
    validation::settings(&entry.settings)
}
