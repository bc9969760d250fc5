//! Command: set keys in one file.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, SetOpts};
use crate::keyvalue::Settings;
use crate::logging::{Log as _, Logger};
use crate::resources::config_file::ConfigFileResource;
use crate::resources::{Resource, ResourceChange};

/// Reconcile `opts.path` with the given settings.
///
/// Returns whether the file changed.
///
/// # Errors
///
/// Returns an error if the file is missing, its style is ambiguous, or it
/// cannot be written.
pub fn run(global: &GlobalOpts, opts: &SetOpts, log: &Arc<Logger>) -> Result<bool> {
    let settings: Settings = opts.settings.iter().cloned().collect();
    let resource = ConfigFileResource::new(&opts.path, settings).with_style(opts.style);
    let ctx = super::build_context(global, log.clone())?;

    match resource.apply(&ctx)? {
        ResourceChange::Applied => Ok(true),
        ResourceChange::AlreadyCorrect => {
            log.info(&format!("{} already up to date", opts.path.display()));
            Ok(false)
        }
    }
}
