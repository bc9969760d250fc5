//! Merge desired settings into an existing key/value file.
use std::path::Path;

use super::Settings;
use super::grammar;
use super::style::{FormatDetector, Style};
use crate::error::{Error, Result};
use crate::resources::ResourceChange;
use crate::resources::helpers::fs::commit_lines;
use crate::session::Context;

/// Compute the reconciled line sequence for `lines`.
///
/// The first assignment of each desired key is replaced by its canonical
/// line in `style`; later assignments of an already consumed key are left
/// alone.  Keys that never matched are appended in settings order.  Every
/// other line is kept verbatim and in place.
///
/// Comments trailing a replaced assignment are not carried over.
///
/// # Examples
///
/// ```
/// use converge::keyvalue::{Settings, Style, plan};
///
/// let lines: Vec<String> = ["FOO=1", "# comment", "BAR = 2"].map(String::from).into();
/// let settings = Settings::from([("FOO", "3"), ("BAZ", "4")]);
///
/// assert_eq!(
///     plan(&lines, &settings, Style::Plain),
///     ["FOO = 3", "# comment", "BAR = 2", "BAZ = 4"],
/// );
/// ```
#[must_use]
pub fn plan(lines: &[String], settings: &Settings, style: Style) -> Vec<String> {
    let mut remaining = settings.clone();
    let mut out: Vec<String> = lines
        .iter()
        .map(|line| {
            if let Some(assignment) = grammar::parse(line)
                && let Some(value) = remaining.remove(assignment.key)
            {
                style.render(assignment.key, &value)
            } else {
                line.clone()
            }
        })
        .collect();
    out.extend(remaining.iter().map(|(key, value)| style.render(key, value)));
    out
}

/// Reject settings that could never be matched on a later run.
///
/// # Errors
///
/// Returns [`Error::InvalidSetting`] for a key outside `[A-Za-z0-9_-]+` or a
/// value containing a line break.
pub fn validate(settings: &Settings) -> Result<()> {
    for (key, value) in settings.iter() {
        if !grammar::is_valid_key(key) {
            return Err(Error::InvalidSetting {
                key: key.to_string(),
                reason: "keys may only contain ASCII letters, digits, '_' and '-'".to_string(),
            });
        }
        if value.contains(['\n', '\r']) {
            return Err(Error::InvalidSetting {
                key: key.to_string(),
                reason: "values must fit on one line".to_string(),
            });
        }
    }
    Ok(())
}

/// Reject values that would not read back unchanged once written in `style`.
///
/// A value with leading or trailing whitespace, or a `#` after whitespace,
/// would be trimmed or cut into a comment on the next parse, so the key
/// could never be seen as up to date.
fn check_readback(settings: &Settings, style: Style) -> Result<()> {
    for (key, value) in settings.iter() {
        let line = style.render(key, value);
        let read = grammar::parse(&line).map(|a| (a.key, a.value));
        if read != Some((key, value)) {
            return Err(Error::InvalidSetting {
                key: key.to_string(),
                reason: format!("value {value:?} would not read back from `{line}`"),
            });
        }
    }
    Ok(())
}

/// Line sequences before and after reconciling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Style the new lines are written in.
    pub style: Style,
    /// Current file content.
    pub before: Vec<String>,
    /// Content after merging the settings.
    pub after: Vec<String>,
}

impl Reconciliation {
    /// Whether applying would change the file.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.before != self.after
    }

    /// Number of lines that differ or are appended.
    #[must_use]
    pub fn pending(&self) -> usize {
        let replaced = self
            .before
            .iter()
            .zip(&self.after)
            .filter(|(a, b)| a != b)
            .count();
        replaced + self.after.len().saturating_sub(self.before.len())
    }
}

/// Applies desired [`Settings`] to key/value files.
#[derive(Debug, Clone, Default)]
pub struct ConfigReconciler {
    detector: FormatDetector,
}

impl ConfigReconciler {
    /// A reconciler using the default [`FormatDetector`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom detector, e.g. one with extra path overrides.
    #[must_use]
    pub const fn with_detector(detector: FormatDetector) -> Self {
        Self { detector }
    }

    /// Read `path` and compute what applying `settings` would produce.
    ///
    /// `style` overrides detection when given.  Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`], [`Error::NotFound`],
    /// [`Error::AmbiguousFormat`] or [`Error::Io`].  Values are checked
    /// against the resolved style, so a value that cannot be written
    /// faithfully fails with [`Error::InvalidSetting`] after detection.
    pub fn reconcile(
        &self,
        ctx: &Context,
        path: &Path,
        settings: &Settings,
        style: Option<Style>,
    ) -> Result<Reconciliation> {
        validate(settings)?;
        if !ctx.fs.exists(path) {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        let before = ctx.fs.read_lines(path).map_err(|e| Error::io(path, e))?;
        let style = match style {
            Some(style) => style,
            None => self.detector.detect(path, &before)?,
        };
        check_readback(settings, style)?;
        ctx.log
            .debug(&format!("{}: {style} style", path.display()));

        let after = plan(&before, settings, style);
        Ok(Reconciliation {
            style,
            before,
            after,
        })
    }

    /// Make `path` carry every key of `settings` with its desired value.
    ///
    /// When the merged lines equal the current ones nothing is touched and
    /// [`ResourceChange::AlreadyCorrect`] is returned.  Otherwise the file is
    /// backed up, rewritten, its diff logged and the session marked changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] or [`Error::NotFound`] before
    /// anything is read, [`Error::AmbiguousFormat`] when the style cannot be
    /// inferred, and [`Error::Io`] or [`Error::Diff`] from the write path.
    pub fn apply(
        &self,
        ctx: &Context,
        path: &Path,
        settings: &Settings,
        style: Option<Style>,
    ) -> Result<ResourceChange> {
        let rec = self.reconcile(ctx, path, settings, style)?;
        if !rec.is_change() {
            ctx.log
                .debug(&format!("{} already up to date", path.display()));
            return Ok(ResourceChange::AlreadyCorrect);
        }

        commit_lines(ctx, path, &rec.after)?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::MockFileSystemOps;
    use crate::resources::test_helpers::mock_context;

    const APP: &str = "/etc/app.conf";
    const BACKUP: &str = "/etc/app.conf.2024-03-01";

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    fn apply(ctx: &Context, settings: &Settings) -> Result<ResourceChange> {
        ConfigReconciler::new().apply(ctx, Path::new(APP), settings, None)
    }

    // ------------------------------------------------------------------
    // plan
    // ------------------------------------------------------------------

    #[test]
    fn plan_replaces_in_place_and_appends_in_order() {
        let lines = owned(&["B = 0", "# keep", "A = 0"]);
        let settings = Settings::from([("C", "3"), ("A", "1"), ("D", "4"), ("B", "2")]);
        assert_eq!(
            plan(&lines, &settings, Style::Plain),
            ["B = 2", "# keep", "A = 1", "C = 3", "D = 4"]
        );
    }

    #[test]
    fn plan_leaves_later_duplicates_untouched() {
        let lines = owned(&["export A=1", "export A=2"]);
        let settings = Settings::from([("A", "9")]);
        assert_eq!(
            plan(&lines, &settings, Style::Shell),
            ["export A=9", "export A=2"]
        );
    }

    #[test]
    fn plan_ignores_commented_out_assignments() {
        let lines = owned(&["# A = 1"]);
        let settings = Settings::from([("A", "2")]);
        assert_eq!(plan(&lines, &settings, Style::Plain), ["# A = 1", "A = 2"]);
    }

    #[test]
    fn plan_normalises_matched_line_to_style() {
        let lines = owned(&["A=1", "  B = 2   "]);
        let settings = Settings::from([("A", "1"), ("B", "2")]);
        assert_eq!(plan(&lines, &settings, Style::Shell), ["export A=1", "export B=2"]);
    }

    #[test]
    fn plan_drops_comment_on_replaced_line() {
        // Characterized behaviour: a trailing comment on an overwritten
        // assignment does not survive, even when the value is unchanged.
        let lines = owned(&["FOO = 1 # tuned for prod", "BAR = 2 # untouched"]);
        let settings = Settings::from([("FOO", "1")]);
        assert_eq!(
            plan(&lines, &settings, Style::Plain),
            ["FOO = 1", "BAR = 2 # untouched"]
        );
    }

    #[test]
    fn plan_with_no_settings_is_identity() {
        let lines = owned(&["anything", "A = 1"]);
        assert_eq!(plan(&lines, &Settings::new(), Style::Plain), lines);
    }

    // ------------------------------------------------------------------
    // scenarios
    // ------------------------------------------------------------------

    #[test]
    fn scenario_a_plain_file_is_updated_and_backed_up() {
        let (ctx, fs, log) =
            mock_context(MockFileSystemOps::new().with_file(APP, &["FOO=1", "# comment", "BAR = 2"]));

        let change = apply(&ctx, &Settings::from([("FOO", "3"), ("BAZ", "4")])).unwrap();

        assert_eq!(change, ResourceChange::Applied);
        assert_eq!(
            fs.lines(APP).unwrap(),
            ["FOO = 3", "# comment", "BAR = 2", "BAZ = 4"]
        );
        assert_eq!(fs.lines(BACKUP).unwrap(), ["FOO=1", "# comment", "BAR = 2"]);
        assert!(ctx.changes.changed());
        assert!(log.contains("Updating /etc/app.conf:"));
        assert!(log.contains("+BAZ = 4"));
    }

    #[test]
    fn scenario_b_reapplying_is_a_no_op() {
        let (ctx, fs, _log) =
            mock_context(MockFileSystemOps::new().with_file(APP, &["FOO=1", "# comment", "BAR = 2"]));
        let settings = Settings::from([("FOO", "3"), ("BAZ", "4")]);
        apply(&ctx, &settings).unwrap();
        let after_first = fs.lines(APP).unwrap();
        let writes = fs.write_count();
        ctx.changes.reset();

        assert_eq!(apply(&ctx, &settings).unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(fs.lines(APP).unwrap(), after_first);
        assert_eq!(fs.write_count(), writes);
        assert!(!ctx.changes.changed());
    }

    #[test]
    fn scenario_c_shebang_selects_shell_style() {
        let (ctx, fs, _log) = mock_context(
            MockFileSystemOps::new().with_file(APP, &["#!/bin/bash", "A = 1", "export KEY=old"]),
        );
        apply(&ctx, &Settings::from([("KEY", "v")])).unwrap();
        assert_eq!(
            fs.lines(APP).unwrap(),
            ["#!/bin/bash", "A = 1", "export KEY=v"]
        );
    }

    #[test]
    fn scenario_d_ambiguous_file_is_not_touched() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["export X=1", "Y = 2"]));
        let err = apply(&ctx, &Settings::from([("X", "2")])).unwrap_err();
        assert!(matches!(err, Error::AmbiguousFormat { .. }), "{err}");
        assert_eq!(fs.write_count(), 0);
        assert!(fs.lines(BACKUP).is_none());
        assert!(!ctx.changes.changed());
    }

    #[test]
    fn scenario_e_missing_file_is_not_found() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new());
        let err = apply(&ctx, &Settings::from([("X", "2")])).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref path } if path == Path::new(APP)));
        assert_eq!(fs.write_count(), 0);
    }

    // ------------------------------------------------------------------
    // properties
    // ------------------------------------------------------------------

    #[test]
    fn no_op_takes_no_backup() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["A = 1", "B = 2"]));
        assert_eq!(
            apply(&ctx, &Settings::from([("B", "2")])).unwrap(),
            ResourceChange::AlreadyCorrect
        );
        assert_eq!(fs.write_count(), 0);
        assert!(fs.lines(BACKUP).is_none());
        assert!(!ctx.changes.changed());
    }

    #[test]
    fn same_day_backup_keeps_state_before_first_write() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["A = 1"]));
        apply(&ctx, &Settings::from([("A", "2")])).unwrap();
        apply(&ctx, &Settings::from([("A", "3")])).unwrap();

        assert_eq!(fs.lines(APP).unwrap(), ["A = 3"]);
        assert_eq!(fs.lines(BACKUP).unwrap(), ["A = 1"]);
    }

    #[test]
    fn untouched_lines_survive_verbatim() {
        let original = [
            "  # header  ",
            "",
            "OTHER =   spaced out   # note",
            "FOO = 1",
            "[not an assignment]",
        ];
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &original));
        apply(&ctx, &Settings::from([("FOO", "2"), ("NEW", "x")])).unwrap();

        let lines = fs.lines(APP).unwrap();
        assert_eq!(lines.len(), original.len() + 1);
        for (i, line) in original.iter().enumerate() {
            if *line != "FOO = 1" {
                assert_eq!(lines[i], *line);
            }
        }
        assert_eq!(lines[3], "FOO = 2");
        assert_eq!(lines[5], "NEW = x");
    }

    #[test]
    fn every_key_lands_with_its_value() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["export A=0", "# B=1"]));
        let settings = Settings::from([("A", "1"), ("B", "two words"), ("C", "x=y")]);
        apply(&ctx, &settings).unwrap();

        let lines = fs.lines(APP).unwrap();
        for (key, value) in settings.iter() {
            let hits: Vec<_> = lines
                .iter()
                .filter_map(|l| grammar::parse(l))
                .filter(|a| a.key == key)
                .collect();
            assert_eq!(hits.len(), 1, "{key} in {lines:?}");
            assert_eq!(hits[0].value, value);
        }
    }

    #[test]
    fn explicit_style_beats_detection() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &[]));
        ConfigReconciler::new()
            .apply(&ctx, Path::new(APP), &Settings::from([("A", "1")]), Some(Style::Shell))
            .unwrap();
        assert_eq!(fs.lines(APP).unwrap(), ["export A=1"]);
    }

    #[test]
    fn empty_file_without_override_is_ambiguous() {
        let (ctx, _fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &[]));
        let err = apply(&ctx, &Settings::from([("A", "1")])).unwrap_err();
        assert!(matches!(err, Error::AmbiguousFormat { .. }));
    }

    #[test]
    fn invalid_settings_are_rejected_before_reading() {
        let (ctx, _fs, _log) = mock_context(MockFileSystemOps::new());
        let err = apply(&ctx, &Settings::from([("net.core", "1")])).unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { ref key, .. } if key == "net.core"));

        let err = apply(&ctx, &Settings::from([("A", "1\nB = 2")])).unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { .. }));
    }

    #[test]
    fn values_that_would_not_read_back_are_rejected() {
        for value in ["a # b", "padded  ", "  lead", "#x"] {
            let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["K = 0"]));
            let err = apply(&ctx, &Settings::from([("K", value)])).unwrap_err();
            assert!(
                matches!(err, Error::InvalidSetting { ref key, .. } if key == "K"),
                "{value:?}: {err}"
            );
            assert_eq!(fs.write_count(), 0, "{value:?}");
            assert_eq!(fs.lines(APP).unwrap(), ["K = 0"]);
        }
    }

    #[test]
    fn hash_without_preceding_space_is_kept() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["export URL=x"]));
        let settings = Settings::from([("URL", "http://h/#frag"), ("Q", "\"a # b\"")]);
        apply(&ctx, &settings).unwrap();

        let lines = fs.lines(APP).unwrap();
        assert_eq!(lines, ["export URL=http://h/#frag", "export Q=\"a # b\""]);
        for (line, (key, value)) in lines.iter().zip(settings.iter()) {
            let parsed = grammar::parse(line).unwrap();
            assert_eq!((parsed.key, parsed.value), (key, value));
        }
        ctx.changes.reset();
        assert_eq!(apply(&ctx, &settings).unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn empty_value_is_written_and_reread() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["A = 1"]));
        apply(&ctx, &Settings::from([("A", "")])).unwrap();
        assert_eq!(fs.lines(APP).unwrap(), ["A = "]);
        assert_eq!(apply(&ctx, &Settings::from([("A", "")])).unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn write_failure_propagates() {
        let (ctx, _fs, _log) =
            mock_context(MockFileSystemOps::new().with_file(APP, &["A = 1"]).failing_writes());
        let err = apply(&ctx, &Settings::from([("A", "2")])).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!ctx.changes.changed());
    }

    #[test]
    fn reconcile_reports_pending_lines() {
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file(APP, &["A = 1", "B = 2"]));
        let rec = ConfigReconciler::new()
            .reconcile(&ctx, Path::new(APP), &Settings::from([("A", "5"), ("C", "3")]), None)
            .unwrap();
        assert_eq!(rec.style, Style::Plain);
        assert!(rec.is_change());
        assert_eq!(rec.pending(), 2);
        assert_eq!(fs.write_count(), 0);
    }
}
