//! Collaborator contracts
//!
//! The engine never renders, imports modules or touches browser history
//! itself. It talks to the outside world through these traits, all of
//! which are called synchronously on the dispatching thread.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::grammar::NamedOutletPayload;
use crate::history::HistoryMode;
use crate::route::{Match, MatchData, RouteNode};

// ============================================================================
// Content
// ============================================================================

/// What an outlet is asked to display
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// An element to create, with attribute/property data
    Element(ElementSpec),
    /// Content produced by a custom [`ContentProvider`]
    Handle(ContentHandle),
    /// Deterministic fallback when no route matched the fragment
    NotFound { url: String, message: String },
    /// The matched route resolved to nothing renderable
    Missing { pattern: String },
}

/// An element to be created by the render target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    /// Keys prefixed with `.` are properties, the rest attributes
    pub data: IndexMap<String, String>,
    pub import: Option<String>,
}

impl From<NamedOutletPayload> for ElementSpec {
    fn from(payload: NamedOutletPayload) -> Self {
        Self {
            tag: payload.element_tag,
            data: payload.data,
            import: payload.import.path,
        }
    }
}

impl ElementSpec {
    /// Makes sure `tag` has an implementation, importing it when needed
    ///
    /// Returns `false` when the element stays undefined; rendering goes
    /// ahead anyway and the host shows whatever an unknown element shows.
    pub fn ensure_defined(&self, loader: &dyn ModuleLoader) -> bool {
        if loader.is_defined(&self.tag) {
            return true;
        }
        let Some(path) = &self.import else {
            warn!(tag = %self.tag, "element is not defined and has no import");
            return false;
        };
        debug!(tag = %self.tag, path = %path, "importing element module");
        let imported = loader.import_module(path, &self.tag);
        if !imported {
            warn!(tag = %self.tag, path = %path, "element module failed to import");
        }
        imported
    }
}

/// Opaque content produced by a provider
///
/// Two handles are equal when they share the same allocation.
#[derive(Clone)]
pub struct ContentHandle(Rc<dyn Any>);

impl ContentHandle {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHandle").finish_non_exhaustive()
    }
}

impl PartialEq for ContentHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// The surface a router node (or a named outlet) renders into
pub trait RenderTarget {
    /// Replaces the displayed content
    fn render(&self, content: Content);

    /// Whether the currently displayed content lets go for `url`
    fn can_leave(&self, _url: &str) -> bool {
        true
    }
}

/// Turns a matched route into content
pub trait ContentProvider {
    /// `None` means the route has nothing to show; the outlet then gets
    /// [`Content::Missing`] and a warning is logged
    fn resolve(&self, route: &RouteNode, data: &MatchData) -> Option<Content>;
}

/// Default provider: renders the route's `component` tag with the match data
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementContentProvider;

impl ContentProvider for ElementContentProvider {
    fn resolve(&self, route: &RouteNode, data: &MatchData) -> Option<Content> {
        route.component.as_ref().map(|tag| {
            Content::Element(ElementSpec {
                tag: tag.clone(),
                data: data.clone(),
                import: route.import.clone(),
            })
        })
    }
}

/// Browser history (or any other URL sink)
pub trait HistoryStore {
    fn write(&self, url: &str, mode: HistoryMode);
}

/// Something the user activated that might be a link
pub trait NavigationSource {
    /// `Some("")` for links that leave the origin, `None` for things that
    /// are not links at all
    fn same_origin_href(&self) -> Option<String>;
}

/// Events offered to the guard; returning `false` cancels them
#[derive(Debug, Clone, Copy)]
pub enum GuardEvent<'a> {
    /// A route is about to accept a match
    MatchAccepted { pattern: &'a str, matched: &'a Match },
    /// An active route is about to be left for `to`
    LeaveRoute {
        pattern: &'a str,
        from: &'a Match,
        to: &'a str,
    },
}

impl GuardEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            GuardEvent::MatchAccepted { .. } => "match-accepted",
            GuardEvent::LeaveRoute { .. } => "leave-route",
        }
    }
}

/// Cancellable notifications plus the cancelled-navigation observer
pub trait GuardNotifier {
    fn offer_cancellable(&self, event: GuardEvent<'_>) -> bool;

    /// Called after a navigation to `url` was cancelled by a leave guard
    fn navigation_cancelled(&self, _url: &str) {}
}

/// Guard that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl GuardNotifier for AllowAll {
    fn offer_cancellable(&self, _event: GuardEvent<'_>) -> bool {
        true
    }
}

/// Lazy loading of element implementations
pub trait ModuleLoader {
    /// Whether `tag` already has an implementation
    fn is_defined(&self, tag: &str) -> bool;

    /// Imports `path`, which should define `tag`; `false` on failure
    fn import_module(&self, path: &str, tag: &str) -> bool;
}

/// Loader for hosts where every element is defined up front
#[derive(Debug, Clone, Copy, Default)]
pub struct PreloadedModules;

impl ModuleLoader for PreloadedModules {
    fn is_defined(&self, _tag: &str) -> bool {
        true
    }

    fn import_module(&self, _path: &str, _tag: &str) -> bool {
        true
    }
}

/// Shared handle to a render target
pub type Outlet = Rc<dyn RenderTarget>;
