//! Command: apply a manifest.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::{ApplyOpts, GlobalOpts};
use crate::logging::{Log as _, Logger};
use crate::manifest;

/// Load the manifest, apply every resource, and print the summary.
///
/// Returns whether anything changed.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or a resource fails.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Arc<Logger>) -> Result<bool> {
    log.stage("Loading manifest");
    let manifest = manifest::load(&opts.manifest)
        .with_context(|| format!("loading manifest {}", opts.manifest.display()))?;
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let resources = manifest.resources(home.as_deref())?;
    log.info(&format!(
        "{} resource(s) from {}",
        resources.len(),
        opts.manifest.display()
    ));

    let ctx = super::build_context(global, log.clone())?;

    log.stage("Applying");
    let result = super::run_resources(&resources, &ctx);
    log.print_summary();
    result?;

    Ok(ctx.changes.changed())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cli::DiffChoice;
    use crate::logging::isolated_logger;
    use std::fs;

    const fn global() -> GlobalOpts {
        GlobalOpts {
            diff: DiffChoice::Internal,
        }
    }

    fn write_manifest(dir: &std::path::Path, body: &str) -> ApplyOpts {
        let manifest = dir.join("site.toml");
        fs::write(&manifest, body).unwrap();
        ApplyOpts {
            manifest,
            detailed_exitcode: false,
        }
    }

    #[test]
    fn reports_change_then_no_change() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().display();
        let opts = write_manifest(
            tmp.path(),
            &format!("[[dir]]\npath = '{root}/log'\n\n[[file]]\npath = '{root}/motd'\ncontents = [\"hi\"]\n"),
        );

        assert!(run(&global(), &opts, &Arc::new(Logger::new(None))).unwrap());
        assert!(tmp.path().join("log").is_dir());
        assert_eq!(fs::read_to_string(tmp.path().join("motd")).unwrap(), "hi\n");

        assert!(!run(&global(), &opts, &Arc::new(Logger::new(None))).unwrap());
    }

    #[test]
    fn summary_is_logged_even_when_a_resource_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().display();
        let opts = write_manifest(
            tmp.path(),
            &format!(
                "[[dir]]\npath = '{root}/log'\n\n[[config]]\npath = '{root}/missing.conf'\nsettings = [{{ key = \"A\", value = \"1\" }}]\n"
            ),
        );
        let (log, log_dir, _guard) = isolated_logger();

        let err = run(&global(), &opts, &Arc::new(log)).unwrap_err();
        assert!(format!("{err:#}").contains("file not found"), "{err:#}");

        let text = fs::read_to_string(log_dir.path().join("converge").join("test.log")).unwrap();
        assert!(text.contains("STAGE Summary"), "{text}");
        assert!(text.contains("1 changed, 0 unchanged, 1 failed"), "{text}");
    }

    #[test]
    fn invalid_manifest_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let opts = write_manifest(tmp.path(), "[[symlink]]\npath = \"/x\"\n");
        let err = run(&global(), &opts, &Arc::new(Logger::new(None))).unwrap_err();
        assert!(err.to_string().contains("loading manifest"), "{err}");
        assert!(err.to_string().contains("site.toml"), "{err}");
    }
}
