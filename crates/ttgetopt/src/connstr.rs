//! Connection-string attribute access and password redaction.

use crate::classify::looks_like_connstr;

/// Attributes whose values are secrets.
pub const SECRET_ATTRIBUTES: &[&str] = &["PWD", "OraclePWD", "PWDCrypt"];

const MASK: &str = "*****";

/// `name=value` pairs of a connection string, in order.
///
/// Segments without `=` are skipped; surrounding blanks of names are
/// trimmed, values are kept as written.
pub fn attributes(connstr: &str) -> Vec<(String, String)> {
    connstr
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// Value of attribute `name`, compared ignoring case. The last occurrence
/// wins.
pub fn attribute(connstr: &str, name: &str) -> Option<String> {
    attributes(connstr)
        .into_iter()
        .rev()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

/// Whether the connection string carries a non-empty `PWD`.
pub fn has_password(connstr: &str) -> bool {
    attribute(connstr, "PWD").is_some_and(|v| !v.is_empty())
}

/// Copy of `args` with secrets masked: the token after any option listed
/// in `secret_options` (compared without leading dashes, ignoring case),
/// the value of such an option given as `-name=value`, and secret
/// attribute values inside connection-string tokens.
pub fn redact_args<S: AsRef<str>>(args: &[S], secret_options: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        let arg = arg.as_ref();
        if mask_next {
            out.push(MASK.to_string());
            mask_next = false;
            continue;
        }
        if let Some(body) = arg.strip_prefix('-') {
            let body = body.strip_prefix('-').unwrap_or(body);
            let is_secret =
                |name: &str| secret_options.iter().any(|o| o.eq_ignore_ascii_case(name));
            match body.split_once('=') {
                Some((name, _)) if is_secret(name) => {
                    let dashes = &arg[..arg.len() - body.len()];
                    out.push(format!("{}{}={}", dashes, name, MASK));
                    continue;
                }
                None if is_secret(body) => {
                    mask_next = true;
                    out.push(arg.to_string());
                    continue;
                }
                _ => {}
            }
        }
        out.push(redact_connstr(arg));
    }
    out
}

/// Mask secret attribute values in `token` if it is a connection string.
pub fn redact_connstr(token: &str) -> String {
    if !looks_like_connstr(token) {
        return token.to_string();
    }
    token
        .split(';')
        .map(|segment| match segment.split_once('=') {
            Some((name, value))
                if !value.is_empty()
                    && SECRET_ATTRIBUTES
                        .iter()
                        .any(|s| s.eq_ignore_ascii_case(name.trim())) =>
            {
                format!("{}={}", name, MASK)
            }
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
