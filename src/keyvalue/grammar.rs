//! Tokenizer for one `KEY = value` / `export KEY=value` line.
//!
//! The accepted shape is
//!
//! ```text
//! ^\s*(export\s+)?KEY\s*=\s*VALUE\s*(#COMMENT)?$      KEY = [A-Za-z0-9_-]+
//! ```
//!
//! Lines that do not match are unstructured and are passed through untouched
//! by the reconciler; that is never an error.

/// How whitespace sits around the `=` of an assignment.
///
/// Used as evidence by format detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    /// Non-whitespace directly on both sides: `KEY=value`.
    Tight,
    /// Whitespace on both sides: `KEY = value`.
    Spaced,
    /// Anything else: `KEY =value`, `KEY= value`, `KEY=`.
    Uneven,
}

/// Parsed view of an assignment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    /// Whether the line starts with the `export` keyword.
    pub export: bool,
    /// The key, made of word characters and hyphens.
    pub key: &'a str,
    /// The value with surrounding whitespace and any trailing comment removed.
    pub value: &'a str,
    /// Trailing comment including its leading `#`, if present.
    pub comment: Option<&'a str>,
    /// Whitespace around the `=` separator.
    pub spacing: Spacing,
}

/// Whether `c` may appear in a key.
#[must_use]
pub const fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Whether `key` is non-empty and made only of key characters.
///
/// # Examples
///
/// ```
/// use converge::keyvalue::grammar::is_valid_key;
///
/// assert!(is_valid_key("RAILS_ENV"));
/// assert!(is_valid_key("net-core"));
/// assert!(!is_valid_key("net.core.somaxconn"));
/// assert!(!is_valid_key(""));
/// ```
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_key_char)
}

/// Parse `line` as an assignment, or return `None` for unstructured lines.
///
/// # Examples
///
/// ```
/// use converge::keyvalue::grammar::parse;
///
/// let a = parse("export PATH=/usr/local/bin # custom").unwrap();
/// assert!(a.export);
/// assert_eq!(a.key, "PATH");
/// assert_eq!(a.value, "/usr/local/bin");
/// assert_eq!(a.comment, Some("# custom"));
///
/// assert!(parse("# KEY = value").is_none());
/// ```
#[must_use]
pub fn parse(line: &str) -> Option<Assignment<'_>> {
    let body = line.trim_start();
    if let Some(rest) = body.strip_prefix("export") {
        let after = rest.trim_start();
        // `export` is only the keyword when whitespace follows and the rest
        // parses; otherwise it may be the key itself (`export=1`).
        if after.len() < rest.len()
            && let Some(assignment) = parse_body(after, true)
        {
            return Some(assignment);
        }
    }
    parse_body(body, false)
}

fn parse_body(s: &str, export: bool) -> Option<Assignment<'_>> {
    let key_len = s.find(|c: char| !is_key_char(c)).unwrap_or(s.len());
    if key_len == 0 {
        return None;
    }
    let (key, rest) = s.split_at(key_len);

    let before_eq = rest.trim_start();
    let spaced_before = before_eq.len() < rest.len();
    let after_eq = before_eq.strip_prefix('=')?;

    let spacing = match after_eq.chars().next() {
        Some(c) if c.is_whitespace() && spaced_before => Spacing::Spaced,
        Some(c) if !c.is_whitespace() && !spaced_before => Spacing::Tight,
        _ => Spacing::Uneven,
    };

    let (value, comment) = split_comment(after_eq.trim_start());
    Some(Assignment {
        export,
        key,
        value: value.trim_end(),
        comment,
        spacing,
    })
}

/// Split a raw value into the value proper and a trailing `# comment`.
///
/// A `#` opens a comment only outside quotes and only at the start of the
/// value or after whitespace, so `URL=http://host/#frag` keeps its fragment
/// and `A="x # y"` keeps its quoted hash.
fn split_comment(raw: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let mut prev_is_space = true;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '#' if prev_is_space => {
                    let (value, comment) = raw.split_at(i);
                    return (value, Some(comment.trim_end()));
                }
                _ => {}
            },
        }
        prev_is_space = c.is_whitespace();
    }
    (raw, None)
}
