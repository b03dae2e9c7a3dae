const MASK: &str = "***";
const SENSITIVE_KEYS: &[&str] = &["password", "pass", "pwd", "token", "api_key", "apikey", "secret"];

/// Mask the password of a URL-style connection string and any sensitive query parameters.
///
/// Strings without a scheme (plain paths) are returned unchanged.
pub fn redact_connection_string(conn: &str) -> String {
    let Some(scheme_end) = conn.find("://") else {
        return conn.to_string();
    };
    let (scheme, rest) = conn.split_at(scheme_end + 3);

    let (userinfo, location) = match userinfo_end(rest) {
        Some(at) => (Some(&rest[..at]), &rest[at + 1..]),
        None => (None, rest),
    };
    let userinfo = match userinfo {
        Some(userinfo) => match userinfo.split_once(':') {
            Some((user, _password)) => format!("{user}:{MASK}@"),
            None => format!("{userinfo}@"),
        },
        None => String::new(),
    };

    let (location, query) = match location.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (location, None),
    };

    let mut redacted = format!("{scheme}{userinfo}{location}");
    if let Some(query) = query {
        let params: Vec<String> = query.split('&').map(redact_param).collect();
        redacted.push('?');
        redacted.push_str(&params.join("&"));
    }
    redacted
}

/// Index of the `@` closing the userinfo part of `rest`.
///
/// Passwords may contain `/`, `?` or `@`, so the userinfo runs up to the last `@`
/// before the first `/` or `?` that follows the first `@`.
fn userinfo_end(rest: &str) -> Option<usize> {
    let first = rest.find('@')?;
    let host_end = rest[first..]
        .find(['/', '?'])
        .map_or(rest.len(), |offset| first + offset);
    rest[..host_end].rfind('@')
}

fn redact_param(pair: &str) -> String {
    match pair.split_once('=') {
        Some((key, _)) if SENSITIVE_KEYS.contains(&key.to_ascii_lowercase().as_str()) => {
            format!("{key}={MASK}")
        }
        _ => pair.to_string(),
    }
}
