//! URL scheme validation for protocol-checked attributes and CSS `url()`s.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Protocol;

/// Matches a value that a browser could treat as having a scheme prefix.
///
/// Any run of characters other than `/` and `#` followed by a colon counts,
/// even when the colon is written as a (possibly unterminated, zero-padded)
/// numeric character reference.
static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A\s*([^/#]*?)(?::|&#0*58|&#x0*3a)").expect("scheme pattern is valid")
});

/// Returns the scheme prefix of `value`, or `None` for a relative URL.
///
/// The returned scheme is taken verbatim (not trimmed or lower-cased), so
/// padded forms such as `"javascript    :"` never collapse onto an allowed
/// scheme.
pub fn scheme(value: &str) -> Option<&str> {
    SCHEME
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Decide whether `value` may be kept given the `allowed` protocol set.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use html_sanitize::{protocol, Protocol};
///
/// let allowed: HashSet<Protocol> = [Protocol::from("https"), Protocol::Relative].into();
/// assert!(protocol::is_allowed("https://example.com/", &allowed));
/// assert!(protocol::is_allowed("/wiki/Special:Random", &allowed));
/// assert!(!protocol::is_allowed("javascript&#x3A;alert(1)", &allowed));
/// ```
pub fn is_allowed(value: &str, allowed: &HashSet<Protocol>) -> bool {
    match scheme(value) {
        Some(scheme) => allowed.contains(&Protocol::Scheme(scheme.to_ascii_lowercase())),
        None => allowed.contains(&Protocol::Relative),
    }
}
