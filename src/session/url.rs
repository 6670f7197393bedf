// URL helpers

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCHEME_RE: Regex = Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").unwrap();
}

/// Give `target` the scheme of `current` when it has none.
///
/// - `//host/path` → `<scheme>://host/path`
/// - `host/path` → `<scheme>://host/path`
/// - URLs with a scheme are returned unchanged
pub fn update_scheme(current: &str, target: &str) -> String {
    if has_scheme(target) {
        return target.to_string();
    }

    let scheme = SCHEME_RE
        .captures(current)
        .and_then(|caps| caps.get(1))
        .map_or("https", |m| m.as_str());

    match target.strip_prefix("//") {
        Some(rest) => format!("{}://{}", scheme, rest),
        None => format!("{}://{}", scheme, target),
    }
}

fn has_scheme(url: &str) -> bool {
    // "host:port/path" is not a scheme, a real scheme is followed by "//"
    // or has no port-like digits after the colon
    match SCHEME_RE.find(url) {
        Some(m) => {
            let rest = &url[m.end()..];
            rest.starts_with("//") || !rest.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}
