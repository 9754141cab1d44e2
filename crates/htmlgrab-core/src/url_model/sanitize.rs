//! Portable path segment sanitization.

use super::path::HTML_SUFFIX;

/// Longest file name most filesystems accept, in bytes (Linux NAME_MAX).
const NAME_MAX: usize = 255;

const RESERVED_DEVICE_NAMES: [&str; 4] = ["CON", "PRN", "AUX", "NUL"];

fn is_reserved_device_name(segment: &str) -> bool {
    let stem = segment.split('.').next().unwrap_or(segment).to_ascii_uppercase();
    if RESERVED_DEVICE_NAMES.contains(&stem.as_str()) {
        return true;
    }
    match stem.as_bytes() {
        [b'C', b'O', b'M', d] | [b'L', b'P', b'T', d] => (b'1'..=b'9').contains(d),
        _ => false,
    }
}

/// Sanitizes one path segment so it is a valid file or directory name on
/// Linux, macOS and Windows.
///
/// - Replaces `< > : " \ | ? *` and control characters with `_`
/// - Replaces `.` and `..` with `_`
/// - Trims trailing dots and spaces
/// - Prefixes Windows device names (`CON`, `COM1`, ...) with `_`
/// - Truncates so that the segment plus `.html` fits in 255 bytes
///
/// Empty segments stay empty.
pub fn sanitize_segment(segment: &str) -> String {
    if segment.is_empty() {
        return String::new();
    }
    if segment == "." || segment == ".." {
        return "_".to_string();
    }

    let mut replaced: String = segment
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let limit = NAME_MAX - HTML_SUFFIX.len();
    if replaced.len() > limit {
        let mut take = limit;
        while take > 0 && !replaced.is_char_boundary(take) {
            take -= 1;
        }
        replaced.truncate(take);
    }

    // Trim after truncating: the cut can expose a new trailing dot or space.
    let trimmed = replaced.trim_end_matches(|c: char| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "_".to_string()
    } else if is_reserved_device_name(trimmed) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}
