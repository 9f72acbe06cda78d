//! Recording collaborators shared by the integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use outlet_router::*;
use tracing_subscriber::EnvFilter;

/// Installs a subscriber once; `RUST_LOG=outlet_router=debug` shows passes
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Render targets
// ============================================================================

#[derive(Default)]
pub struct RecordingOutlet {
    rendered: RefCell<Vec<Content>>,
    refuse_leave: Cell<bool>,
}

impl RecordingOutlet {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn rendered(&self) -> Vec<Content> {
        self.rendered.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.rendered.borrow().len()
    }

    pub fn last(&self) -> Option<Content> {
        self.rendered.borrow().last().cloned()
    }

    /// Tag of the last rendered element, if the last content was one
    pub fn last_tag(&self) -> Option<String> {
        match self.last() {
            Some(Content::Element(spec)) => Some(spec.tag),
            _ => None,
        }
    }

    pub fn last_was_not_found(&self) -> bool {
        matches!(self.last(), Some(Content::NotFound { .. }))
    }

    pub fn refuse_leave(&self, refuse: bool) {
        self.refuse_leave.set(refuse);
    }
}

impl RenderTarget for RecordingOutlet {
    fn render(&self, content: Content) {
        self.rendered.borrow_mut().push(content);
    }

    fn can_leave(&self, _url: &str) -> bool {
        !self.refuse_leave.get()
    }
}

// ============================================================================
// History
// ============================================================================

#[derive(Default)]
pub struct RecordingHistory {
    writes: RefCell<Vec<(String, HistoryMode)>>,
}

impl RecordingHistory {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn writes(&self) -> Vec<(String, HistoryMode)> {
        self.writes.borrow().clone()
    }

    pub fn last_url(&self) -> Option<String> {
        self.writes.borrow().last().map(|(url, _)| url.clone())
    }
}

impl HistoryStore for RecordingHistory {
    fn write(&self, url: &str, mode: HistoryMode) {
        self.writes.borrow_mut().push((url.to_string(), mode));
    }
}

// ============================================================================
// Guard
// ============================================================================

#[derive(Default)]
pub struct ScriptedGuard {
    deny_leave: Cell<bool>,
    deny_match: RefCell<Option<String>>,
    events: RefCell<Vec<&'static str>>,
    cancelled: RefCell<Vec<String>>,
}

impl ScriptedGuard {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn deny_leave(&self, deny: bool) {
        self.deny_leave.set(deny);
    }

    /// Vetoes matches of routes declared with exactly this pattern
    pub fn deny_match(&self, pattern: &str) {
        *self.deny_match.borrow_mut() = Some(pattern.to_string());
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.borrow().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.borrow().clone()
    }
}

impl GuardNotifier for ScriptedGuard {
    fn offer_cancellable(&self, event: GuardEvent<'_>) -> bool {
        self.events.borrow_mut().push(event.name());
        match event {
            GuardEvent::LeaveRoute { .. } => !self.deny_leave.get(),
            GuardEvent::MatchAccepted { pattern, .. } => {
                self.deny_match.borrow().as_deref() != Some(pattern)
            }
        }
    }

    fn navigation_cancelled(&self, url: &str) {
        self.cancelled.borrow_mut().push(url.to_string());
    }
}

// ============================================================================
// Module loader
// ============================================================================

#[derive(Default)]
pub struct FakeLoader {
    defined: RefCell<HashSet<String>>,
    imports: RefCell<Vec<(String, String)>>,
    failing: Cell<bool>,
}

impl FakeLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn define(&self, tag: &str) {
        self.defined.borrow_mut().insert(tag.to_string());
    }

    pub fn fail_imports(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// `(path, tag)` pairs in request order
    pub fn imports(&self) -> Vec<(String, String)> {
        self.imports.borrow().clone()
    }
}

impl ModuleLoader for FakeLoader {
    fn is_defined(&self, tag: &str) -> bool {
        self.defined.borrow().contains(tag)
    }

    fn import_module(&self, path: &str, tag: &str) -> bool {
        self.imports
            .borrow_mut()
            .push((path.to_string(), tag.to_string()));
        if self.failing.get() {
            return false;
        }
        self.define(tag);
        true
    }
}

// ============================================================================
// Links
// ============================================================================

pub struct Link(pub Option<&'static str>);

impl NavigationSource for Link {
    fn same_origin_href(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Runtime with zero dwell time so every write pushes
pub fn runtime_with(
    history: &Rc<RecordingHistory>,
    guard: &Rc<ScriptedGuard>,
) -> RouterRuntime {
    init_tracing();
    let config = RouterConfig {
        dwell_time_ms: 0,
        ..RouterConfig::default()
    };
    RouterRuntime::new(config)
        .with_history(history.clone())
        .with_guard(guard.clone())
}

pub fn router(outlet: &Rc<RecordingOutlet>, patterns: &[&str]) -> RouterNode {
    RouterNode::new(outlet.clone()).with_routes(
        patterns
            .iter()
            .map(|pattern| RouteNode::new(*pattern).with_component(component_for(pattern))),
    )
}

/// `users/:id` renders `users-id-view`
pub fn component_for(pattern: &str) -> String {
    let words: Vec<String> = pattern
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        "root-view".to_string()
    } else {
        format!("{}-view", words.join("-"))
    }
}
