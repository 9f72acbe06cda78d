/// URL grammar for composite outlet URLs
///
/// A composite URL carries several independent fragments at once:
///
/// | Syntax | Meaning |
/// |--------|---------|
/// | `a::b` | sibling fragments, one per router at the same level |
/// | `(a::b)` | grouping, keeps nested siblings together inside a remainder |
/// | `name:payload` | assignment of `payload` to the named item `name` |
/// | `_dot_` | escaped `.` inside an assignment payload |
///
/// All functions are **pure**: same input → same output, no side effects.
/// Registration of parsed assignments is done by the dispatch runtime.

pub mod outlet;

use once_cell::sync::Lazy;
use regex::Regex;

pub use outlet::{parse_named_outlet_payload, ImportOptions, NamedOutletPayload};

/// Separator between sibling fragments
pub const SIBLING_SEPARATOR: &str = "::";

/// Escape token for `.` inside assignment payloads
pub const DOT_ESCAPE: &str = "_dot_";

static NAMED_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w-]+):(.+)$").expect("named assignment pattern is valid"));

// ============================================================================
// Sibling fragments
// ============================================================================

/// Splits a composite URL into its sibling fragments
///
/// Splits on `::` outside of parentheses. A group wrapping the whole URL is
/// opened first, so a grouped remainder splits into its members. Each
/// fragment then loses one leading `/` and one layer of wrapping
/// parentheses. A lone `/` is returned as is.
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::split_sibling_fragments;
///
/// assert_eq!(split_sibling_fragments("/a/b::c"), vec!["a/b", "c"]);
/// assert_eq!(split_sibling_fragments("x::(y::z)"), vec!["x", "y::z"]);
/// assert_eq!(split_sibling_fragments("(list/3::detail/4)"), vec!["list/3", "detail/4"]);
/// assert_eq!(split_sibling_fragments("p/(q::r)"), vec!["p/(q::r)"]);
/// assert_eq!(split_sibling_fragments("/"), vec!["/"]);
/// ```
pub fn split_sibling_fragments(url: &str) -> Vec<String> {
    if url == "/" {
        return vec![url.to_string()];
    }
    let url = strip_group(url.strip_prefix('/').unwrap_or(url));

    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let bytes = url.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                fragments.push(&url[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    fragments.push(&url[start..]);

    fragments
        .into_iter()
        .map(|fragment| {
            let fragment = fragment.strip_prefix('/').unwrap_or(fragment);
            strip_group(fragment).to_string()
        })
        .collect()
}

/// Joins non-empty fragments with `::`
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::compose_sibling_fragments;
///
/// assert_eq!(compose_sibling_fragments(["a", "", "b/c"]), "a::b/c");
/// assert_eq!(compose_sibling_fragments(Vec::<String>::new()), "");
/// ```
pub fn compose_sibling_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter(|f| !f.as_ref().is_empty())
        .map(|f| f.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(SIBLING_SEPARATOR)
}

/// Composes fragments and wraps the result in grouping syntax when there is
/// more than one of them
///
/// This is the rewrite rule for remainders: nothing stays empty, a single
/// fragment stays bare, several fragments are grouped.
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::group_fragments;
///
/// assert_eq!(group_fragments(Vec::<String>::new()), "");
/// assert_eq!(group_fragments(["a"]), "a");
/// assert_eq!(group_fragments(["a", "b"]), "(a::b)");
/// ```
pub fn group_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = fragments
        .into_iter()
        .filter(|f| !f.as_ref().is_empty())
        .map(|f| f.as_ref().to_string())
        .collect();

    match parts.len() {
        0 => String::new(),
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => format!("({})", parts.join(SIBLING_SEPARATOR)),
    }
}

/// Removes one layer of parentheses when they wrap the whole fragment
///
/// `(a)(b)` is left alone because its first `(` closes before the end.
pub fn strip_group(fragment: &str) -> &str {
    if !(fragment.starts_with('(') && fragment.ends_with(')')) || fragment.len() < 2 {
        return fragment;
    }

    let mut depth = 0usize;
    for (i, b) in fragment.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != fragment.len() - 1 {
                    return fragment;
                }
            }
            _ => {}
        }
    }

    &fragment[1..fragment.len() - 1]
}

// ============================================================================
// Named assignments
// ============================================================================

/// A URL bound to a named item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub url: String,
}

impl Assignment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Result of parsing a `name:payload` fragment
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAssignment {
    /// Name of the targeted item
    pub name: String,
    /// Payload with `_dot_` unescaped
    pub url: String,
    /// Payload exactly as it appeared in the fragment
    pub url_escaped: String,
    /// Set when registering the assignment was vetoed by a guard
    pub cancelled: bool,
    /// The payload read as a named-outlet payload, if it is one
    pub named_outlet: Option<NamedOutletPayload>,
}

impl NamedAssignment {
    pub fn assignment(&self) -> Assignment {
        Assignment::new(self.name.clone(), self.url.clone())
    }
}

/// Escapes `.` as `_dot_` wherever it sits inside a word or path
///
/// A `.` that starts a key (`.open=true`) marks a property assignment and
/// is kept as is.
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::escape_periods;
///
/// assert_eq!(escape_periods("card(cards/card.js):.open=1"), "card(cards/card_dot_js):.open=1");
/// ```
pub fn escape_periods(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    let mut previous: Option<char> = None;

    for c in url.chars() {
        let in_word = previous.is_some_and(|p| p.is_alphanumeric() || matches!(p, '_' | '-'));
        if c == '.' && in_word {
            escaped.push_str(DOT_ESCAPE);
        } else {
            escaped.push(c);
        }
        previous = Some(c);
    }

    escaped
}

/// Turns every `_dot_` back into `.`
pub fn unescape_periods(url: &str) -> String {
    url.replace(DOT_ESCAPE, ".")
}

/// Parses a `name:payload` fragment, optionally wrapped in parentheses
///
/// Returns `None` for anything that is not an assignment; that is the normal
/// case for plain router fragments. The returned value is never cancelled,
/// registration happens in [`RouterRuntime::parse_named_assignment`].
///
/// [`RouterRuntime::parse_named_assignment`]: crate::RouterRuntime::parse_named_assignment
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::parse_named_assignment;
///
/// let parsed = parse_named_assignment("(sidebar:user-card(cards/user_dot_js))").unwrap();
/// assert_eq!(parsed.name, "sidebar");
/// assert_eq!(parsed.url, "user-card(cards/user.js)");
/// assert_eq!(parsed.url_escaped, "user-card(cards/user_dot_js)");
///
/// assert!(parse_named_assignment("users/42").is_none());
/// ```
pub fn parse_named_assignment(fragment: &str) -> Option<NamedAssignment> {
    let fragment = fragment.strip_prefix('/').unwrap_or(fragment);
    let inner = strip_group(fragment);
    let captures = NAMED_ASSIGNMENT.captures(inner)?;

    let name = captures.get(1)?.as_str().to_string();
    let url_escaped = captures.get(2)?.as_str().to_string();
    let url = unescape_periods(&url_escaped);
    let named_outlet = parse_named_outlet_payload(&url);

    Some(NamedAssignment {
        name,
        url,
        url_escaped,
        cancelled: false,
        named_outlet,
    })
}

/// Serializes an assignment as `(name:url)` with in-word periods escaped
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::{serialize_assignment, Assignment};
///
/// let assignment = Assignment::new("side", "file.js");
/// assert_eq!(serialize_assignment(&assignment), "(side:file_dot_js)");
/// ```
pub fn serialize_assignment(assignment: &Assignment) -> String {
    format!("({}:{})", assignment.name, escape_periods(&assignment.url))
}

/// Serializes an assignment without escaping periods
pub fn serialize_assignment_raw(assignment: &Assignment) -> String {
    format!("({}:{})", assignment.name, assignment.url)
}
