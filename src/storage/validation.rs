//! Path validation
//!
//! Turns request URLs into absolute, normalized filesystem paths. Every path
//! handed to the access guard comes out of [`resolve_path`], so `.` and `..`
//! segments are already collapsed and traversal sequences cannot slip past the
//! allow-list comparison.

use std::path::Path;

use path_absolutize::Absolutize;

/// Strip the query string and fragment from a URL.
pub fn clean_url(url: &str) -> &str {
    split_query(url).0
}

/// Split a URL into its path and its `?query#hash` suffix.
pub fn split_query(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

/// Collapse any run of leading slashes (`//host/x`, `///etc`) to a single one.
pub fn collapse_leading_slashes(url: &str) -> String {
    let trimmed = url.trim_start_matches('/');
    if trimmed.len() + 1 < url.len() {
        format!("/{trimmed}")
    } else {
        url.to_string()
    }
}

/// Percent-decode a URL path. `None` when the result is not valid UTF-8.
pub fn decode_url_path(path: &str) -> Option<String> {
    urlencoding::decode(path).ok().map(|decoded| decoded.into_owned())
}

/// Percent-encode a path segment by segment, keeping the `/` separators.
pub fn encode_url_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert platform separators to forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Prefix a `/` unless the path is already absolute on this platform.
pub fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Collapse `.` and `..` segments of an absolute path without touching the
/// disk. A trailing `/` is kept.
pub fn collapse_dot_segments(path: &str) -> String {
    let mut file = Path::new(path)
        .absolutize()
        .map(|p| normalize_path(&p.to_string_lossy()))
        .unwrap_or_else(|_| path.to_string());
    if path.len() > 1 && path.ends_with('/') && !file.ends_with('/') {
        file.push('/');
    }
    file
}

/// Whether `file` is `dir` itself or lies underneath it.
///
/// Matching is on whole segments: `/srv/app2` is not inside `/srv/app`.
/// `dir` is expected without a trailing slash; the filesystem root is `""`.
pub fn is_within(file: &str, dir: &str) -> bool {
    if file == dir {
        return true;
    }
    file.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Normalize a directory for [`is_within`] comparisons.
pub fn normalize_dir(dir: &Path) -> String {
    let absolute = dir
        .absolutize()
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| dir.to_path_buf());
    normalize_path(&absolute.to_string_lossy())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve an already decoded URL path against `root`.
///
/// One leading `/` is dropped before joining, so `/src/main.ts` lands inside
/// the root while a path that is still absolute afterwards (`//etc/passwd`)
/// replaces it. A trailing `/` on the URL is kept on the result so callers can
/// tell directory requests from file requests.
pub fn resolve_path(decoded: &str, root: &Path) -> String {
    let relative = decoded.strip_prefix('/').unwrap_or(decoded);
    let joined = root.join(relative);
    let resolved = joined
        .absolutize_from(root)
        .map(|p| p.into_owned())
        .unwrap_or(joined);

    let mut file = normalize_path(&resolved.to_string_lossy());
    while file.len() > 1 && file.ends_with('/') {
        file.pop();
    }
    if decoded.ends_with('/') && !file.ends_with('/') {
        file.push('/');
    }
    file
}

/// Decode a raw URL path and resolve it against `root`.
pub fn resolve_url(url: &str, root: &Path) -> Option<String> {
    let decoded = decode_url_path(clean_url(url))?;
    Some(resolve_path(&decoded, root))
}
