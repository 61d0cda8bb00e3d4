//! URL path helpers
//!
//! Lexical path cleaning, percent-coding and extension extraction.

use std::borrow::Cow;

/// Canonical form of a rooted URL path
///
/// Collapses duplicate slashes, drops `.` segments and resolves `..`
/// without ever climbing above `/`. A trailing slash on the input is kept
/// (unless the result is `/` itself).
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() {
        return "/".to_string();
    }
    if path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..") {
        cleaned.push('/');
    }
    cleaned
}

/// Percent-decode a URL path; `None` when the result is not UTF-8
pub fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(raw).ok()
}

/// Percent-encode each segment of a decoded path, keeping the `/` separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether any `/`- or `\\`-separated segment is exactly `..`
pub fn contains_dot_dot(path: &str) -> bool {
    path.contains("..") && path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Extension of the final path segment including the dot, or `""`
///
/// `/a/b.MPD` gives `.MPD`, `/a.b/c` gives `""`.
pub fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rfind('.').map_or("", |i| &name[i..])
}
