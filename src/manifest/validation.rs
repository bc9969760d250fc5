//! Checks applied while turning manifest entries into resources.
use std::path::{Path, PathBuf};

use super::SettingEntry;
use crate::keyvalue::Settings;
use crate::keyvalue::grammar::is_valid_key;

/// Expand a leading `~` and require an absolute result.
pub(super) fn resolve_path(raw: &str, home: Option<&Path>) -> Result<PathBuf, String> {
    let path = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = home.ok_or_else(|| format!("cannot expand '{raw}': HOME is not set"))?;
            home.join(rest.trim_start_matches('/'))
        }
        Some(_) => return Err(format!("'{raw}': only '~/' is supported, not '~user/'")),
        None => PathBuf::from(raw),
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(format!("'{raw}' is not an absolute path"))
    }
}

/// Expand a leading `~` and anchor a relative result at `base`.
pub(super) fn resolve_source(raw: &str, base: &Path, home: Option<&Path>) -> Result<PathBuf, String> {
    if raw.starts_with('~') {
        return resolve_path(raw, home);
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base.join(path))
    }
}

fn value_to_string(key: &str, value: &toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(format!(
            "value of '{key}' must be a string, number or boolean, not {}",
            other.type_str()
        )),
    }
}

/// Collect entries into [`Settings`], rejecting invalid and repeated keys.
pub(super) fn settings(entries: &[SettingEntry]) -> Result<Settings, String> {
    let mut out = Settings::new();
    for entry in entries {
        if !is_valid_key(&entry.key) {
            return Err(format!(
                "invalid key '{}' (allowed: ASCII letters, digits, '_' and '-')",
                entry.key
            ));
        }
        if out.contains_key(&entry.key) {
            return Err(format!("duplicate key '{}'", entry.key));
        }
        let value = value_to_string(&entry.key, &entry.value)?;
        if value.contains(['\n', '\r']) {
            return Err(format!("value of '{}' must fit on one line", entry.key));
        }
        out.insert(entry.key.clone(), value);
    }
    Ok(out)
}
