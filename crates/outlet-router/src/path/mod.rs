/// Path utilities for segment splitting and decoding
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

/// Trims leading and trailing slashes
///
/// Zero-copy: returns a slice of the input.
///
/// # Examples
///
/// ```
/// use outlet_router::path::trim_slashes;
///
/// assert_eq!(trim_slashes("/a/b/"), "a/b");
/// assert_eq!(trim_slashes("/"), "");
/// assert_eq!(trim_slashes("a"), "a");
/// ```
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// Splits a path into `/`-delimited segments after trimming slashes
///
/// An empty path (or a lone `/`) yields a single empty segment, so callers
/// can always index the first segment.
///
/// # Examples
///
/// ```
/// use outlet_router::path::split_segments;
///
/// assert_eq!(split_segments("/a/b/c"), vec!["a", "b", "c"]);
/// assert_eq!(split_segments("/"), vec![""]);
/// assert_eq!(split_segments(""), vec![""]);
/// ```
pub fn split_segments(path: &str) -> Vec<&str> {
    trim_slashes(path).split('/').collect()
}

/// Percent-decodes one segment
///
/// Returns `None` when the decoded bytes are not valid UTF-8.
///
/// # Examples
///
/// ```
/// use outlet_router::path::decode_segment;
///
/// assert_eq!(decode_segment("hello%20world").as_deref(), Some("hello world"));
/// assert_eq!(decode_segment("%FF"), None);
/// ```
pub fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(segment).ok()
}

/// Decodes every segment and joins them with `/`
///
/// Fails as a whole if any segment fails to decode.
pub fn decode_joined(segments: &[&str]) -> Option<String> {
    segments
        .iter()
        .map(|s| decode_segment(s))
        .collect::<Option<Vec<_>>>()
        .map(|decoded| decoded.join("/"))
}

/// Joins a base path and a suffix with exactly one `/`
///
/// Empty parts are skipped.
///
/// # Examples
///
/// ```
/// use outlet_router::path::join_path;
///
/// assert_eq!(join_path("/a", "b"), "/a/b");
/// assert_eq!(join_path("/a/", "/b"), "/a/b");
/// assert_eq!(join_path("a", ""), "a");
/// assert_eq!(join_path("", "b"), "b");
/// ```
pub fn join_path(base: &str, suffix: &str) -> String {
    match (base.is_empty(), suffix.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => suffix.to_string(),
        (false, false) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            suffix.trim_start_matches('/')
        ),
    }
}
