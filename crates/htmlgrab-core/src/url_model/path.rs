//! Relative file path derivation from a URL string.

use super::sanitize::sanitize_segment;
use super::PathStyle;

/// Schemes stripped before splitting. Matching is case-sensitive.
const SCHEMES: [&str; 2] = ["http://", "https://"];

/// File name that stands in for a URL ending in `/`.
pub const INDEX_FILE: &str = "index.html";

/// Suffix appended to the joined path of a URL not ending in `/`.
pub const HTML_SUFFIX: &str = ".html";

fn strip_scheme(url: &str) -> &str {
    if SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        url.split_once("://").map_or(url, |(_, rest)| rest)
    } else {
        url
    }
}

/// Returns the authority segment of `url`: what follows the scheme and
/// precedes the first `/`.
///
/// `domain_for("https://en.wikipedia.org/wiki/Abbasiya")` → `"en.wikipedia.org"`
pub fn domain_for(url: &str) -> &str {
    let rest = strip_scheme(url);
    rest.split_once('/').map_or(rest, |(domain, _)| domain)
}

pub(super) fn map_path(url: &str, style: PathStyle) -> String {
    let mut parts = strip_scheme(url).split('/');
    // The authority never appears in the output.
    parts.next();
    let segments: Vec<&str> = parts.collect();

    let segments: Vec<String> = match style {
        PathStyle::Verbatim => segments.iter().map(|s| s.to_string()).collect(),
        PathStyle::Portable => {
            let last = segments.len().saturating_sub(1);
            segments
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    // The trailing empty segment is replaced below, not sanitized.
                    if i == last && s.is_empty() {
                        String::new()
                    } else {
                        sanitize_segment(s)
                    }
                })
                .collect()
        }
    };

    match segments.split_last() {
        None => String::new(),
        Some((last, dirs)) if last.is_empty() => {
            let mut out = dirs.join("/");
            if !dirs.is_empty() {
                out.push('/');
            }
            out.push_str(INDEX_FILE);
            out
        }
        Some(_) => {
            let mut out = segments.join("/");
            out.push_str(HTML_SUFFIX);
            out
        }
    }
}

/// Converts `url` into a relative file path, keeping every path segment as is.
///
/// - `"https://en.wikipedia.org/wiki/Abbasiya"` → `"wiki/Abbasiya.html"`
/// - `"https://en.wikipedia.org/wiki/"` → `"wiki/index.html"`
/// - `"https://en.wikipedia.org"` → `""` (nothing to write)
///
/// Never fails. Characters that some filesystems reject (`:`, `*`, `?`)
/// are passed through; see [`PathStyle::Portable`] for the sanitizing variant.
pub fn path_for(url: &str) -> String {
    map_path(url, PathStyle::Verbatim)
}
