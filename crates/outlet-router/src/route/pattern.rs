/// Pattern parsing for route segments
///
/// Pure functional parsing of declared route patterns into typed segments.
/// All functions are **pure**: same input → same output, no side effects.

/// A single `/`-delimited piece of a route pattern
///
/// # Examples
///
/// ```
/// use outlet_router::route::pattern::{classify_segment, PatternSegment};
///
/// assert!(matches!(classify_segment("users"), PatternSegment::Static("users")));
///
/// let PatternSegment::Param(param) = classify_segment(":tab?overview") else { panic!() };
/// assert_eq!(param.name, "tab");
/// assert!(param.optional);
/// assert_eq!(param.default.as_deref(), Some("overview"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment<'a> {
    /// Literal text compared as is
    Static(&'a str),
    /// `:name` with optional modifiers
    Param(ParamSpec),
}

/// A parameter segment: `:name`, `:name?`, `:name?default`, `:name+`, `:name*`
///
/// Modifiers may be combined (`:rest?*`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    /// `?` - may be absent
    pub optional: bool,
    /// `+` - greedy tail, at least one segment
    pub one_or_more: bool,
    /// `*` - greedy tail, possibly empty
    pub zero_or_more: bool,
    /// Literal written after the modifiers of an optional param
    pub default: Option<String>,
}

impl ParamSpec {
    /// Greedy params swallow every remaining URL segment
    pub fn is_greedy(&self) -> bool {
        self.one_or_more || self.zero_or_more
    }

    /// Whether the param may match nothing at all
    pub fn allows_missing(&self) -> bool {
        self.optional || self.zero_or_more
    }

    /// Value used when the URL has nothing for this param
    pub fn default_value(&self) -> String {
        self.default.clone().unwrap_or_default()
    }
}

/// Classifies a pattern segment (pure function)
///
/// # Parsing Rules
///
/// 1. **Param**: starts with `:`; the name runs up to the first modifier
///    (`?`, `+`, `*`), then a run of modifiers, then for `?` params an
///    optional default literal
/// 2. **Static**: anything else
pub fn classify_segment(segment: &str) -> PatternSegment<'_> {
    let Some(body) = segment.strip_prefix(':') else {
        return PatternSegment::Static(segment);
    };

    let is_modifier = |c: char| matches!(c, '?' | '+' | '*');
    let name_end = body.find(is_modifier).unwrap_or(body.len());
    let (name, rest) = body.split_at(name_end);
    let modifiers_end = rest.find(|c: char| !is_modifier(c)).unwrap_or(rest.len());
    let (modifiers, literal) = rest.split_at(modifiers_end);

    let optional = modifiers.contains('?');
    let default = (optional && !literal.is_empty()).then(|| literal.to_string());

    PatternSegment::Param(ParamSpec {
        name: name.to_string(),
        optional,
        one_or_more: modifiers.contains('+'),
        zero_or_more: modifiers.contains('*'),
        default,
    })
}
