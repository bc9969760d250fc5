//! Key/value configuration file resource.
use std::path::PathBuf;

use super::{Resource, ResourceChange, ResourceState};
use crate::error::Result;
use crate::keyvalue::{ConfigReconciler, Settings, Style};
use crate::session::Context;

/// A key/value file that must carry a set of [`Settings`].
#[derive(Debug, Clone)]
pub struct ConfigFileResource {
    /// File to reconcile.  It must already exist.
    pub path: PathBuf,
    /// Desired keys and values.
    pub settings: Settings,
    /// Fixed style, bypassing detection.
    pub style: Option<Style>,
    reconciler: ConfigReconciler,
}

impl ConfigFileResource {
    /// Create a config file resource with style detection.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            settings,
            style: None,
            reconciler: ConfigReconciler::new(),
        }
    }

    /// Force `style` instead of detecting it.
    #[must_use]
    pub const fn with_style(mut self, style: Option<Style>) -> Self {
        self.style = style;
        self
    }

    /// Use a specific reconciler (e.g. with extra detector overrides).
    #[must_use]
    pub fn with_reconciler(mut self, reconciler: ConfigReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }
}

impl Resource for ConfigFileResource {
    fn description(&self) -> String {
        let keys: Vec<_> = self.settings.iter().map(|(k, _)| k).collect();
        format!("config {} [{}]", self.path.display(), keys.join(", "))
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        if !ctx.fs.exists(&self.path) {
            return Ok(ResourceState::Missing);
        }
        let rec = self
            .reconciler
            .reconcile(ctx, &self.path, &self.settings, self.style)?;
        if rec.is_change() {
            Ok(ResourceState::Incorrect {
                current: format!("{} line(s) to update", rec.pending()),
            })
        } else {
            Ok(ResourceState::Correct)
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        self.reconciler
            .apply(ctx, &self.path, &self.settings, self.style)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::operations::MockFileSystemOps;
    use crate::resources::test_helpers::mock_context;

    fn resource() -> ConfigFileResource {
        ConfigFileResource::new(
            "/etc/default/app",
            Settings::from([("RAILS_ENV", "production"), ("PORT", "8080")]),
        )
    }

    #[test]
    fn description_lists_keys() {
        assert_eq!(
            resource().description(),
            "config /etc/default/app [RAILS_ENV, PORT]"
        );
    }

    #[test]
    fn state_of_missing_file() {
        let (ctx, _fs, _log) = mock_context(MockFileSystemOps::new());
        assert_eq!(resource().current_state(&ctx).unwrap(), ResourceState::Missing);
    }

    #[test]
    fn state_counts_pending_lines_without_writing() {
        let (ctx, fs, _log) = mock_context(
            MockFileSystemOps::new().with_file("/etc/default/app", &["export RAILS_ENV=dev"]),
        );
        let state = resource().current_state(&ctx).unwrap();
        assert_eq!(
            state,
            ResourceState::Incorrect {
                current: "2 line(s) to update".to_string()
            }
        );
        assert_eq!(fs.write_count(), 0);
    }

    #[test]
    fn apply_then_state_is_correct() {
        let (ctx, fs, _log) = mock_context(
            MockFileSystemOps::new().with_file("/etc/default/app", &["export RAILS_ENV=dev"]),
        );
        let r = resource();
        assert_eq!(r.apply(&ctx).unwrap(), ResourceChange::Applied);
        assert_eq!(
            fs.lines("/etc/default/app").unwrap(),
            ["export RAILS_ENV=production", "export PORT=8080"]
        );
        assert_eq!(r.current_state(&ctx).unwrap(), ResourceState::Correct);
        assert_eq!(r.apply(&ctx).unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn apply_to_missing_file_fails() {
        let (ctx, _fs, _log) = mock_context(MockFileSystemOps::new());
        assert!(matches!(resource().apply(&ctx), Err(Error::NotFound { .. })));
    }

    #[test]
    fn custom_detector_override() {
        use crate::keyvalue::FormatDetector;
        let (ctx, fs, _log) = mock_context(MockFileSystemOps::new().with_file("/etc/environment", &[]));
        let r = ConfigFileResource::new("/etc/environment", Settings::from([("LANG", "C.UTF-8")]))
            .with_reconciler(ConfigReconciler::with_detector(
                FormatDetector::new().with_override("/etc/environment", Style::Plain),
            ));
        r.apply(&ctx).unwrap();
        assert_eq!(fs.lines("/etc/environment").unwrap(), ["LANG = C.UTF-8"]);
    }
}
