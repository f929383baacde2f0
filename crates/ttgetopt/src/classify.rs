//! Shape checks for a trailing DSN or connection string argument.

use regex::Regex;
use std::sync::LazyLock;

// Identifier characters: anything except []{}(),;?*=!@\ and '/' (paths).
static RE_DSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\[\]{}(),;?*=!@\\/]*$").unwrap());

// name=value pairs separated by ';', one optional leading and trailing ';'.
static RE_CONNSTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^;?(?:[^\[\]{}(),;?*=!@\\/]*=[^;]*;)*[^\[\]{}(),;?*=!@\\/]*=[^;]*;?$").unwrap()
});

/// A DSN is made of identifier characters with at least one non-blank.
pub fn looks_like_dsn(s: &str) -> bool {
    RE_DSN.is_match(s) && s.chars().any(|c| !c.is_whitespace())
}

/// A connection string is `name=value;name=value...`; values may be empty.
pub fn looks_like_connstr(s: &str) -> bool {
    RE_CONNSTR.is_match(s)
}
