//! Reconciliation of `KEY = value` / `export KEY=value` configuration files.
//!
//! [`grammar`] tokenizes single lines, [`style`] decides how a file writes
//! its assignments, and [`reconcile`] merges desired [`Settings`] into a file
//! without disturbing anything it was not asked to change.
pub mod grammar;
pub mod reconcile;
pub mod style;

pub use grammar::{Assignment, Spacing};
pub use reconcile::{ConfigReconciler, plan};
pub use style::{FormatDetector, Style};

/// Desired key/value pairs, in insertion order.
///
/// Order only matters for keys that have to be appended to a file.
/// Inserting a key that is already present replaces its value in place.
///
/// # Examples
///
/// ```
/// use converge::keyvalue::Settings;
///
/// let mut settings = Settings::from([("FOO", "1"), ("BAR", "2")]);
/// settings.insert("FOO", "3");
///
/// assert_eq!(settings.get("FOO"), Some("3"));
/// let keys: Vec<_> = settings.iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["FOO", "BAR"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: Vec<(String, String)>,
}

impl Settings {
    /// Create an empty set of settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `key` to `value`, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Desired value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Self::new();
        for (k, v) in iter {
            settings.insert(k, v);
        }
        settings
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Settings {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut s = Settings::new();
        s.insert("A", "1");
        s.insert("B", "2");
        s.insert("A", "3");
        assert_eq!(s.iter().collect::<Vec<_>>(), [("A", "3"), ("B", "2")]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn remove_preserves_order_of_rest() {
        let mut s = Settings::from([("A", "1"), ("B", "2"), ("C", "3")]);
        assert_eq!(s.remove("B").as_deref(), Some("2"));
        assert_eq!(s.remove("B"), None);
        assert_eq!(s.iter().collect::<Vec<_>>(), [("A", "1"), ("C", "3")]);
        assert!(s.contains_key("C"));
        assert!(!s.contains_key("B"));
    }

    #[test]
    fn collect_from_owned_pairs() {
        let s: Settings = vec![("X".to_string(), "1".to_string())]
            .into_iter()
            .collect();
        assert_eq!(s.get("X"), Some("1"));
        assert!(!s.is_empty());
        assert!(Settings::default().is_empty());
    }
}
