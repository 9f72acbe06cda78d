/// Route module: declared patterns and their matching state
///
/// - [`pattern`] classifies pattern segments
/// - [`matcher`] is the pure segment walker
/// - [`RouteNode`] wraps both with guard notification, redirects and the
///   per-route match cache

pub mod matcher;
pub mod pattern;

use indexmap::IndexMap;

use crate::collab::{GuardEvent, GuardNotifier};

pub use matcher::match_path;
pub use pattern::{classify_segment, ParamSpec, PatternSegment};

/// Extracted params in pattern order
pub type MatchData = IndexMap<String, String>;

/// Result of matching a URL fragment against one route
///
/// `url` is the consumed part and `remainder` the rest; joined with a `/`
/// they give back the fragment (without its leading `/`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub url: String,
    pub remainder: String,
    pub data: MatchData,
    /// Redirect target attached by the owning route, params substituted
    pub redirect: Option<String>,
    /// Same consumed URL as the previous match of this route
    pub use_cache: bool,
}

impl Match {
    /// A match that consumed the whole fragment
    pub fn full(url: impl Into<String>, data: MatchData) -> Self {
        Self {
            url: url.into(),
            data,
            ..Self::default()
        }
    }

    /// A match that left `remainder` for nested routers
    pub fn partial(url: impl Into<String>, remainder: impl Into<String>, data: MatchData) -> Self {
        Self {
            url: url.into(),
            remainder: remainder.into(),
            data,
            ..Self::default()
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.remainder.is_empty()
    }

    /// Consumed URL and remainder joined back together
    pub fn full_url(&self) -> String {
        crate::path::join_path(&self.url, &self.remainder)
    }
}

// ============================================================================
// RouteNode
// ============================================================================

/// A declared route inside a router node
///
/// # Examples
///
/// ```
/// use outlet_router::{AllowAll, RouteNode};
///
/// let mut route = RouteNode::new("/users/:id").with_component("user-page");
///
/// let first = route.match_url("/users/7", &AllowAll).unwrap();
/// assert_eq!(first.data["id"], "7");
/// assert!(!first.use_cache);
///
/// let second = route.match_url("/users/7", &AllowAll).unwrap();
/// assert!(second.use_cache);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteNode {
    /// Declared pattern, e.g. `/users/:id`
    pub path: String,
    /// Reject partial matches
    pub fullmatch: bool,
    /// Redirect target; `:name` placeholders are filled from the match
    pub redirect: Option<String>,
    /// Never report `use_cache`
    pub disable_cache: bool,
    /// Element tag rendered for this route
    pub component: Option<String>,
    /// Module that defines `component`
    pub import: Option<String>,
    last_match: Option<Match>,
}

impl RouteNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fullmatch: false,
            redirect: None,
            disable_cache: false,
            component: None,
            import: None,
            last_match: None,
        }
    }

    pub fn with_fullmatch(mut self) -> Self {
        self.fullmatch = true;
        self
    }

    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn with_disable_cache(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    pub fn with_component(mut self, tag: impl Into<String>) -> Self {
        self.component = Some(tag.into());
        self
    }

    pub fn with_import(mut self, path: impl Into<String>) -> Self {
        self.import = Some(path.into());
        self
    }

    /// The cache slot: whatever the last call to [`match_url`](Self::match_url) produced
    pub fn last_match(&self) -> Option<&Match> {
        self.last_match.as_ref()
    }

    /// Invalidates the cache slot
    pub fn clear_last_match(&mut self) {
        self.last_match = None;
    }

    /// Matches a URL fragment and updates the cache slot
    ///
    /// 1. pure segment matching ([`match_path`])
    /// 2. the guard may veto the match (`MatchAccepted`)
    /// 3. the redirect target is attached
    /// 4. `use_cache` is set when the consumed URL equals the previous one
    ///
    /// The result, `None` included, becomes the new cache slot.
    pub fn match_url(&mut self, url: &str, guard: &dyn GuardNotifier) -> Option<Match> {
        let candidate = match_path(&self.path, url, self.fullmatch).filter(|candidate| {
            guard.offer_cancellable(GuardEvent::MatchAccepted {
                pattern: &self.path,
                matched: candidate,
            })
        });

        let result = candidate.map(|mut matched| {
            matched.redirect = self.redirect_target(&matched.data);
            matched.use_cache = !self.disable_cache
                && self
                    .last_match
                    .as_ref()
                    .is_some_and(|previous| previous.url == matched.url);
            matched
        });

        self.last_match = result.clone();
        result
    }

    /// Redirect target with `:name` placeholders substituted from `data`
    ///
    /// # Examples
    ///
    /// ```
    /// use outlet_router::{MatchData, RouteNode};
    ///
    /// let route = RouteNode::new("/blog/:slug").with_redirect("/articles/:slug");
    ///
    /// let mut data = MatchData::new();
    /// data.insert("slug".to_string(), "hello-world".to_string());
    ///
    /// assert_eq!(route.redirect_target(&data).as_deref(), Some("/articles/hello-world"));
    /// ```
    pub fn redirect_target(&self, data: &MatchData) -> Option<String> {
        let target = self.redirect.as_ref()?;

        // Longest names first so `:id` never eats into `:idx`
        let mut params: Vec<(&String, &String)> = data.iter().collect();
        params.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Some(params.into_iter().fold(target.clone(), |acc, (name, value)| {
            acc.replace(&format!(":{}", name), value)
        }))
    }

    /// Generates a URL for this route by substituting parameters
    ///
    /// Optional and `*` params may be missing and are then left out;
    /// any other missing param makes generation fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use outlet_router::{MatchData, RouteNode};
    ///
    /// let route = RouteNode::new("/users/:id/:tab?");
    ///
    /// let mut data = MatchData::new();
    /// data.insert("id".to_string(), "123".to_string());
    ///
    /// assert_eq!(route.generate_url(&data).as_deref(), Some("/users/123"));
    /// assert_eq!(route.generate_url(&MatchData::new()), None);
    /// ```
    pub fn generate_url(&self, data: &MatchData) -> Option<String> {
        let segments: Option<Vec<String>> = self
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| match classify_segment(segment) {
                PatternSegment::Static(text) => Some(text.to_string()),
                PatternSegment::Param(spec) => match data.get(&spec.name) {
                    Some(value) if spec.is_greedy() => Some(value.clone()),
                    Some(value) => Some(urlencoding::encode(value).into_owned()),
                    None if spec.allows_missing() => Some(String::new()),
                    None => None,
                },
            })
            .collect();

        segments.map(|segs| {
            let filtered: Vec<String> = segs.into_iter().filter(|s| !s.is_empty()).collect();
            format!("/{}", filtered.join("/"))
        })
    }
}
