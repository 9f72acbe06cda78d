//! Integration tests for path matching and the URL grammar
//!
//! Tests are organized by feature area and cover:
//! - Optional, one-or-more and zero-or-more parameters
//! - Partial matches and fullmatch
//! - Route caching and redirects
//! - Sibling fragments and grouping
//! - Named assignments and named-outlet payloads

use outlet_router::grammar::{
    escape_periods, group_fragments, parse_named_assignment, unescape_periods,
};
use outlet_router::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn data(pairs: &[(&str, &str)]) -> MatchData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Matcher
// ============================================================================

#[rstest]
#[case("/a/b", &[("t", "")])]
#[case("/a/b/1", &[("t", "1")])]
fn test_optional_param(#[case] url: &str, #[case] expected: &[(&str, &str)]) {
    let m = match_path("/a/b/:t?", url, false).unwrap();
    assert_eq!(m.url, url);
    assert_eq!(m.data, data(expected));
    assert!(!m.is_partial());
}

#[test]
fn test_optional_param_literal_mismatch() {
    assert!(match_path("/a/b/:t?", "/a/c", false).is_none());
}

#[test]
fn test_optional_param_default() {
    let m = match_path("/a/:t?foobar", "/a", false).unwrap();
    assert_eq!(m.data, data(&[("t", "foobar")]));

    let m = match_path("/a/:t?foobar", "/a/given", false).unwrap();
    assert_eq!(m.data, data(&[("t", "given")]));
}

#[test]
fn test_one_or_more_requires_value() {
    assert!(match_path("/a/b/:t+", "/a/b", false).is_none());
}

#[test]
fn test_one_or_more_takes_tail() {
    let m = match_path("/a/b/:t+", "/a/b/1/2/3", false).unwrap();
    assert_eq!(m.data, data(&[("t", "1/2/3")]));
    assert_eq!(m.remainder, "");
}

#[rstest]
#[case("/files", "")]
#[case("/files/x", "x")]
#[case("/files/x/y%20z", "x/y z")]
fn test_zero_or_more(#[case] url: &str, #[case] expected: &str) {
    let m = match_path("/files/:path*", url, false).unwrap();
    assert_eq!(m.data["path"], expected);
}

#[rstest]
#[case("/a/b/3/c/4", &[("t", "3"), ("v", "4")])]
#[case("/a/b/3/c", &[("t", "3"), ("v", "")])]
fn test_two_optional_params(#[case] url: &str, #[case] expected: &[(&str, &str)]) {
    let m = match_path("/a/b/:t?/c/:v?", url, false).unwrap();
    assert_eq!(m.data, data(expected));
}

#[test]
fn test_partial_match_leaves_remainder() {
    let m = match_path("/a/b/:t?/c/:v?", "/a/b/3/c/4/d/5", false).unwrap();
    assert_eq!(m.url, "a/b/3/c/4");
    assert_eq!(m.remainder, "d/5");
    assert_eq!(m.full_url(), "a/b/3/c/4/d/5");
}

#[test]
fn test_fullmatch_rejects_remainder() {
    assert!(match_path("/a/b/:t?/c/:v?", "/a/b/3/c/4/d/5", true).is_none());
}

#[rstest]
#[case("*", "/anything/at/all")]
#[case("*", "")]
#[case("/exact", "/exact")]
#[case("", "")]
fn test_full_match_without_data(#[case] pattern: &str, #[case] url: &str) {
    let m = match_path(pattern, url, false).unwrap();
    assert_eq!(m.url, url);
    assert!(m.data.is_empty());
}

#[test]
fn test_undecodable_segment_is_no_match() {
    assert!(match_path("/a/:id", "/a/%FF", false).is_none());
}

#[test]
fn test_decoded_param() {
    let m = match_path("/search/:q", "/search/hello%20world", false).unwrap();
    assert_eq!(m.data["q"], "hello world");
}

#[test]
fn test_empty_url_segment_counts_as_missing() {
    assert!(match_path("/a/:id", "/a//", false).is_none());
}

#[test]
fn test_no_partial_match_on_first_segment() {
    assert!(match_path("", "/x", false).is_none());
}

// ============================================================================
// RouteNode caching and redirects
// ============================================================================

#[test]
fn test_same_url_twice_uses_cache() {
    let mut route = RouteNode::new("/a/:id");
    assert!(!route.match_url("/a/1", &AllowAll).unwrap().use_cache);
    assert!(route.match_url("/a/1", &AllowAll).unwrap().use_cache);
    assert!(!route.match_url("/a/2", &AllowAll).unwrap().use_cache);
}

#[test]
fn test_disable_cache_forces_fresh_match() {
    let mut route = RouteNode::new("/a/:id").with_disable_cache();
    route.match_url("/a/1", &AllowAll);
    assert!(!route.match_url("/a/1", &AllowAll).unwrap().use_cache);
}

#[test]
fn test_no_match_clears_cache_slot() {
    let mut route = RouteNode::new("/a");
    route.match_url("/a", &AllowAll);
    assert!(route.match_url("/b", &AllowAll).is_none());
    assert!(!route.match_url("/a", &AllowAll).unwrap().use_cache);
}

#[test]
fn test_redirect_substitutes_params() {
    let mut route = RouteNode::new("/old/:id").with_redirect("/new/:id");
    let m = route.match_url("/old/9", &AllowAll).unwrap();
    assert_eq!(m.redirect.as_deref(), Some("/new/9"));
}

#[test]
fn test_generate_url_from_match() {
    let mut route = RouteNode::new("/users/:id/:tab?");
    let m = route.match_url("/users/5/posts", &AllowAll).unwrap();
    assert_eq!(route.generate_url(&m.data).as_deref(), Some("/users/5/posts"));
}

// ============================================================================
// Sibling fragments
// ============================================================================

#[rstest]
#[case("/a::b", vec!["a", "b"])]
#[case("a/(b::c)::d", vec!["a/(b::c)", "d"])]
#[case("(a::b)", vec!["a", "b"])]
#[case("/(x:1)::list", vec!["x:1", "list"])]
#[case("/", vec!["/"])]
#[case("single", vec!["single"])]
fn test_split_sibling_fragments(#[case] url: &str, #[case] expected: Vec<&str>) {
    assert_eq!(split_sibling_fragments(url), expected);
}

#[test]
fn test_compose_skips_empty() {
    assert_eq!(compose_sibling_fragments(["", "a", "", "b"]), "a::b");
}

#[test]
fn test_group_rewrite_rule() {
    assert_eq!(group_fragments(Vec::<&str>::new()), "");
    assert_eq!(group_fragments(["only"]), "only");
    assert_eq!(group_fragments(["a", "b/c"]), "(a::b/c)");
}

proptest! {
    #[test]
    fn prop_split_inverts_compose(
        fragments in prop::collection::vec("[a-z0-9]{1,6}(/[a-z0-9]{1,6}){0,2}", 1..5)
    ) {
        let composed = compose_sibling_fragments(&fragments);
        prop_assert_eq!(split_sibling_fragments(&composed), fragments);
    }

    #[test]
    fn prop_grouped_remainder_splits_back(
        fragments in prop::collection::vec("[a-z0-9]{1,6}", 2..5)
    ) {
        let grouped = group_fragments(&fragments);
        prop_assert_eq!(split_sibling_fragments(&grouped), fragments);
    }

    #[test]
    fn prop_escape_round_trip(payload in "[a-z./-]{0,12}") {
        prop_assert_eq!(unescape_periods(&escape_periods(&payload)), payload);
    }
}

// ============================================================================
// Named assignments
// ============================================================================

#[test]
fn test_parse_and_serialize_assignment() {
    let parsed = parse_named_assignment("(side:menu-panel(menus/main_dot_js):.open=true)").unwrap();
    assert_eq!(parsed.name, "side");
    assert_eq!(parsed.url, "menu-panel(menus/main.js):.open=true");
    assert_eq!(parsed.url_escaped, "menu-panel(menus/main_dot_js):.open=true");
    assert_eq!(
        serialize_assignment(&parsed.assignment()),
        "(side:menu-panel(menus/main_dot_js):.open=true)"
    );

    let outlet = parsed.named_outlet.unwrap();
    assert_eq!(outlet.element_tag, "menu-panel");
    assert_eq!(outlet.import.path.as_deref(), Some("menus/main.js"));
    assert_eq!(outlet.data[".open"], "true");
}

#[rstest]
#[case("users/42")]
#[case("")]
#[case("(no-payload:)")]
fn test_not_an_assignment(#[case] fragment: &str) {
    assert!(parse_named_assignment(fragment).is_none());
}

#[test]
fn test_assignment_name_allows_dash_and_underscore() {
    let parsed = parse_named_assignment("side_bar-2:x").unwrap();
    assert_eq!(parsed.name, "side_bar-2");
}

// ============================================================================
// Named-outlet payloads
// ============================================================================

#[test]
fn test_outlet_payload_with_attributes_and_properties() {
    let payload = parse_named_outlet_payload("user-card:id=7&.expanded=yes&title=a%20b").unwrap();
    assert_eq!(payload.element_tag, "user-card");
    assert_eq!(payload.import.path, None);

    let attributes: Vec<_> = payload.attributes().collect();
    assert_eq!(attributes, vec![("id", "7"), ("title", "a b")]);
    let properties: Vec<_> = payload.properties().collect();
    assert_eq!(properties, vec![("expanded", "yes")]);
}

#[test]
fn test_outlet_payload_camel_case_infers_import() {
    let payload = parse_named_outlet_payload("userCard").unwrap();
    assert_eq!(payload.element_tag, "user-card");
    assert_eq!(payload.import.path.as_deref(), Some("user/card.js"));
    assert!(payload.import.inferred);
}

#[test]
fn test_outlet_payload_from_file_path() {
    let payload = parse_named_outlet_payload("widgets/dateRange.js").unwrap();
    assert_eq!(payload.element_tag, "date-range");
    assert_eq!(payload.import.path.as_deref(), Some("widgets/dateRange.js"));
}

#[rstest]
#[case("plain")]
#[case("")]
#[case("Plain")]
fn test_outlet_payload_rejects_invalid_tags(#[case] payload: &str) {
    assert!(parse_named_outlet_payload(payload).is_none());
}
