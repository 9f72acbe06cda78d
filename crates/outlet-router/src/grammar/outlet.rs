/// Named-outlet payload parsing
///
/// Payload syntax: `tag[(importPath)][:key=value[&key=value...]]`
///
/// - `tag` may be a kebab-case element tag, a camelCase identifier or a file
///   path; the latter two are normalized to kebab-case
/// - keys prefixed with `.` are property assignments, plain keys are
///   attribute assignments; the prefix stays in the key
use heck::ToKebabCase;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static ELEMENT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)+$").expect("element tag pattern is valid")
});

/// Where the element's implementation is loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Module path to import before rendering, if any
    pub path: Option<String>,
    /// Whether `path` was inferred from the tag rather than written out
    pub inferred: bool,
}

/// A parsed named-outlet payload
#[derive(Debug, Clone, PartialEq)]
pub struct NamedOutletPayload {
    /// Normalized kebab-case element tag
    pub element_tag: String,
    /// Attribute (`key`) and property (`.key`) assignments in payload order
    pub data: IndexMap<String, String>,
    pub import: ImportOptions,
}

impl NamedOutletPayload {
    /// Iterates over `.key` property assignments with the prefix removed
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data
            .iter()
            .filter_map(|(k, v)| k.strip_prefix('.').map(|k| (k, v.as_str())))
    }

    /// Iterates over plain attribute assignments
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data
            .iter()
            .filter(|(k, _)| !is_property_key(k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Returns true for keys that denote a property assignment
pub fn is_property_key(key: &str) -> bool {
    key.starts_with('.')
}

/// Parses a named-outlet payload
///
/// Returns `None` when the tag cannot be turned into a valid element tag,
/// i.e. one with at least one `-`.
///
/// # Examples
///
/// ```
/// use outlet_router::grammar::parse_named_outlet_payload;
///
/// let payload = parse_named_outlet_payload("user-card(cards/user.js):name=ada&.admin=true").unwrap();
/// assert_eq!(payload.element_tag, "user-card");
/// assert_eq!(payload.import.path.as_deref(), Some("cards/user.js"));
/// assert_eq!(payload.data.get(".admin").map(String::as_str), Some("true"));
///
/// let payload = parse_named_outlet_payload("userCard").unwrap();
/// assert_eq!(payload.element_tag, "user-card");
/// assert_eq!(payload.import.path.as_deref(), Some("user/card.js"));
///
/// assert!(parse_named_outlet_payload("card").is_none());
/// ```
pub fn parse_named_outlet_payload(payload: &str) -> Option<NamedOutletPayload> {
    let (raw_tag, explicit_import, data_part) = split_payload(payload)?;
    let (element_tag, inferred_import) = normalize_tag(raw_tag)?;

    let import = match (explicit_import, inferred_import) {
        (Some(path), _) => ImportOptions {
            path: Some(path.to_string()),
            inferred: false,
        },
        (None, Some(path)) => ImportOptions {
            path: Some(path),
            inferred: true,
        },
        (None, None) => ImportOptions::default(),
    };

    Some(NamedOutletPayload {
        element_tag,
        data: data_part.map(parse_data).unwrap_or_default(),
        import,
    })
}

/// Splits `tag(import):data` into its three parts
fn split_payload(payload: &str) -> Option<(&str, Option<&str>, Option<&str>)> {
    let tag_end = payload
        .find(|c| c == '(' || c == ':')
        .unwrap_or(payload.len());
    let raw_tag = &payload[..tag_end];
    let rest = &payload[tag_end..];

    let (import, rest) = match rest.strip_prefix('(') {
        Some(after_open) => {
            let close = matching_close(after_open)?;
            (Some(&after_open[..close]), &after_open[close + 1..])
        }
        None => (None, rest),
    };

    let data = match rest {
        "" => None,
        _ => Some(rest.strip_prefix(':')?),
    };

    Some((raw_tag, import, data))
}

/// Index of the `)` closing an already opened group
fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `k=v&k2=v2`; values are percent-decoded when possible
fn parse_data(data: &str) -> IndexMap<String, String> {
    data.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() || key == "." {
                return None;
            }
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((key.to_string(), value))
        })
        .collect()
}

/// Normalizes a raw tag into `(element_tag, inferred_import_path)`
///
/// - file paths (`cards/user-card.js`) import themselves and use the file
///   stem as tag
/// - camelCase identifiers (`userCard`) are kebab-cased and import from
///   the tag with dashes turned into slashes (`user/card.js`)
/// - kebab-case tags are taken as they are and need no import
fn normalize_tag(raw: &str) -> Option<(String, Option<String>)> {
    if raw.is_empty() {
        return None;
    }

    let (tag, import) = if raw.contains('/') || raw.ends_with(".js") {
        let stem = raw.rsplit('/').next().unwrap_or(raw);
        let stem = stem.strip_suffix(".js").unwrap_or(stem);
        let import = if raw.ends_with(".js") {
            raw.to_string()
        } else {
            format!("{}.js", raw)
        };
        (stem.to_kebab_case(), Some(import))
    } else if raw.chars().any(|c| c.is_ascii_uppercase() || c == '_') {
        let tag = raw.to_kebab_case();
        let import = format!("{}.js", tag.replace('-', "/"));
        (tag, Some(import))
    } else {
        (raw.to_string(), None)
    };

    ELEMENT_TAG.is_match(&tag).then_some((tag, import))
}
