/// Segment-by-segment path matching
///
/// Walks the pattern and the URL side by side. A URL that runs past the
/// end of the pattern yields a partial match whose remainder is handed to
/// nested routers.
use indexmap::IndexMap;

use super::pattern::{classify_segment, PatternSegment};
use super::Match;
use crate::path::{decode_joined, decode_segment, split_segments};

/// Matches `url` against `pattern` (pure function)
///
/// Returns `None` on no-match. Guard notification, redirects and cache
/// decisions are layered on top by [`RouteNode::match_url`].
///
/// [`RouteNode::match_url`]: super::RouteNode::match_url
///
/// # Examples
///
/// ```
/// use outlet_router::route::matcher::match_path;
///
/// let m = match_path("/a/b/:t?", "/a/b/1", false).unwrap();
/// assert_eq!(m.url, "/a/b/1");
/// assert_eq!(m.data["t"], "1");
///
/// let m = match_path("/a/:id", "/a/7/rest/of/it", false).unwrap();
/// assert_eq!(m.url, "a/7");
/// assert_eq!(m.remainder, "rest/of/it");
///
/// assert!(match_path("/a/:id", "/a/7/rest", true).is_none());
/// ```
pub fn match_path(pattern: &str, url: &str, fullmatch: bool) -> Option<Match> {
    if pattern == "*" || pattern == url {
        return Some(Match::full(url, IndexMap::new()));
    }

    let pattern_segments = split_segments(pattern);
    let url_segments = split_segments(url);
    let max = pattern_segments.len().max(url_segments.len());
    let mut data = IndexMap::new();

    for i in 0..max {
        let url_segment = url_segments.get(i).copied().filter(|s| !s.is_empty());

        match pattern_segments.get(i).map(|s| classify_segment(s)) {
            Some(PatternSegment::Param(spec)) => match url_segment {
                None if spec.allows_missing() => {
                    data.insert(spec.name.clone(), spec.default_value());
                }
                None => return None,
                Some(_) if spec.is_greedy() => {
                    let value = decode_joined(&url_segments[i..])?;
                    data.insert(spec.name, value);
                    break;
                }
                Some(segment) => {
                    let value = decode_segment(segment)?;
                    data.insert(spec.name, value.into_owned());
                }
            },
            literal => {
                let literal = match literal {
                    Some(PatternSegment::Static(text)) => Some(text),
                    _ => None,
                };
                if literal != url_segments.get(i).copied() {
                    let pattern_exhausted = i >= pattern_segments.len();
                    if pattern_exhausted && i > 0 && !fullmatch {
                        return Some(Match::partial(
                            url_segments[..i].join("/"),
                            url_segments[i..].join("/"),
                            data,
                        ));
                    }
                    return None;
                }
            }
        }
    }

    Some(Match::full(url, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wildcard_and_identity() {
        let m = match_path("*", "anything/at/all", true).unwrap();
        assert_eq!(m.url, "anything/at/all");
        assert!(m.data.is_empty());

        let m = match_path("exact", "exact", true).unwrap();
        assert_eq!(m.remainder, "");
    }

    #[test]
    fn test_literal_mismatch_on_first_segment() {
        assert!(match_path("a/b", "x/b", false).is_none());
    }

    #[test]
    fn test_inner_literal_mismatch_fails() {
        assert!(match_path("a/b/c", "a/x/c", false).is_none());
    }

    #[test]
    fn test_url_shorter_than_literal_pattern() {
        assert!(match_path("a/b/c", "a/b", false).is_none());
    }

    #[test]
    fn test_required_param_missing() {
        assert!(match_path("a/:id", "a", false).is_none());
        assert!(match_path("a/:id", "a/", false).is_none());
    }

    #[test]
    fn test_param_is_percent_decoded() {
        let m = match_path("user/:name", "user/ada%20lovelace", false).unwrap();
        assert_eq!(m.data["name"], "ada lovelace");
    }

    #[test]
    fn test_undecodable_segment_is_no_match() {
        assert!(match_path("user/:name", "user/%FF", false).is_none());
        assert!(match_path("files/:path+", "files/ok/%FF", false).is_none());
    }

    #[test]
    fn test_star_param_may_be_empty() {
        let m = match_path("files/:path*", "files", false).unwrap();
        assert_eq!(m.data["path"], "");
    }

    #[test]
    fn test_greedy_param_ends_matching() {
        let m = match_path("files/:path*/edit", "files/a/b", false).unwrap();
        assert_eq!(m.data["path"], "a/b");
        assert_eq!(m.remainder, "");
    }

    #[test]
    fn test_optional_default() {
        let m = match_path("a/b/:t?foobar", "a/b", false).unwrap();
        assert_eq!(m.data["t"], "foobar");
    }

    #[test]
    fn test_data_order_follows_pattern() {
        let m = match_path(":z/:a/:m", "1/2/3", false).unwrap();
        let keys: Vec<&str> = m.data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_empty_pattern_and_url() {
        assert!(match_path("", "", false).is_some());
        assert!(match_path("/", "", false).is_some());
        assert!(match_path("", "a", false).is_none());
    }

    #[test]
    fn test_partial_invariant_reconstructs_url() {
        let m = match_path("docs/:section", "/docs/intro/chapter/2", false).unwrap();
        assert_eq!(format!("{}/{}", m.url, m.remainder), "docs/intro/chapter/2");
    }
}
