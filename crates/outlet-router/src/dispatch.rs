//! Dispatch coordinator
//!
//! [`RouterRuntime`] owns the router tree, the named registry and the
//! collaborators, and runs navigation passes over them:
//!
//! 1. guard: active routes outside named subtrees may refuse to leave
//! 2. fragments: the URL is split into named assignments and positional
//!    fragments; a refused assignment aborts the pass before anything changes
//! 3. reset: positional routers lose their current match
//! 4. assignments: named items receive their URLs
//! 5. match: routers are matched level by level, remainders recurse into
//!    nested routers and are reconciled back into the parent's remainder;
//!    named assignments found in a remainder go to the registry
//! 6. serialization: the resulting state goes to the history store
//!
//! A redirect ends the pass and starts a new one for the target.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::collab::{
    AllowAll, Content, ContentProvider, ElementContentProvider, GuardEvent, GuardNotifier,
    HistoryStore, ModuleLoader, NavigationSource, Outlet, PreloadedModules,
};
use crate::config::{RouterConfig, RouterDef};
use crate::error::{Result, RouterError};
use crate::grammar::{self, compose_sibling_fragments, group_fragments, split_sibling_fragments};
use crate::history::DwellPolicy;
use crate::named::NamedRouter;
use crate::path::join_path;
use crate::registry::NamedRegistry;
use crate::route::{Match, RouteNode};
use crate::tree::{RouterId, RouterNode, RouterTree};

/// A route that matched during the last pass
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    pub router: RouterId,
    /// Index into the router's routes
    pub route: usize,
    pub matched: Match,
}

/// How a navigation request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The pass ran; `url` is what was written to history, if anything
    Completed { url: Option<String> },
    /// An active route refused to leave
    Cancelled,
    /// The named item `name` refused its new assignment
    Rejected { name: String },
    /// Another pass is running; this one runs after it
    Queued,
    /// The source points outside the origin
    Ignored,
    /// The source is not a link
    NotALink,
}

impl NavigationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NavigationOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Leave the history store alone
    pub skip_history: bool,
}

enum PassResult {
    Done(NavigationOutcome),
    Redirect(String),
}

/// Why matching stopped before the whole tree was visited
#[derive(Debug)]
enum Halt {
    Redirect(String),
    /// A named assignment inside a remainder was refused
    Rejected(String),
}

/// The routing engine for one independent router tree
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use outlet_router::{Content, RenderTarget, RouteNode, RouterConfig, RouterNode, RouterRuntime};
///
/// struct Ignore;
/// impl RenderTarget for Ignore {
///     fn render(&self, _content: Content) {}
/// }
///
/// let mut runtime = RouterRuntime::new(RouterConfig::default());
/// let root = runtime
///     .attach(None, RouterNode::new(Rc::new(Ignore)).with_route(RouteNode::new("users/:id")))
///     .unwrap();
///
/// let outcome = runtime.navigate("/users/7").unwrap();
/// assert!(outcome.is_completed());
/// assert_eq!(runtime.router(root).unwrap().current_match().unwrap().data["id"], "7");
/// assert_eq!(runtime.current_url(), "/users/7");
/// ```
pub struct RouterRuntime {
    pub(crate) config: RouterConfig,
    pub(crate) tree: RouterTree,
    pub(crate) registry: NamedRegistry,
    pub(crate) active: Vec<ActiveRoute>,
    history: Option<Rc<dyn HistoryStore>>,
    guard: Rc<dyn GuardNotifier>,
    content: Rc<dyn ContentProvider>,
    loader: Rc<dyn ModuleLoader>,
    dwell: DwellPolicy,
    in_pass: bool,
    queue: VecDeque<(String, NavigateOptions)>,
}

impl Default for RouterRuntime {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl RouterRuntime {
    pub fn new(config: RouterConfig) -> Self {
        let dwell = DwellPolicy::new(config.dwell_time());
        Self {
            config,
            tree: RouterTree::new(),
            registry: NamedRegistry::new(),
            active: Vec::new(),
            history: None,
            guard: Rc::new(AllowAll),
            content: Rc::new(ElementContentProvider),
            loader: Rc::new(PreloadedModules),
            dwell,
            in_pass: false,
            queue: VecDeque::new(),
        }
    }

    pub fn with_history(mut self, history: Rc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_guard(mut self, guard: Rc<dyn GuardNotifier>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_content(mut self, content: Rc<dyn ContentProvider>) -> Self {
        self.content = content;
        self
    }

    pub fn with_loader(mut self, loader: Rc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn tree(&self) -> &RouterTree {
        &self.tree
    }

    pub fn router(&self, id: RouterId) -> Option<&RouterNode> {
        self.tree.get(id)
    }

    pub fn registry(&self) -> &NamedRegistry {
        &self.registry
    }

    /// Routes matched by the last pass, in match order
    pub fn active_routes(&self) -> &[ActiveRoute] {
        &self.active
    }

    pub fn is_navigating(&self) -> bool {
        self.in_pass
    }

    pub(crate) fn loader(&self) -> &dyn ModuleLoader {
        self.loader.as_ref()
    }

    // ========================================================================
    // Attach / detach
    // ========================================================================

    /// Attaches `node` under `parent` (or as a root)
    ///
    /// A named node registers itself in the registry and immediately picks
    /// up a pending assignment for its name.
    pub fn attach(&mut self, parent: Option<RouterId>, node: RouterNode) -> Result<RouterId> {
        let name = node.name().map(str::to_string);
        if let Some(name) = &name {
            if self.registry.contains_handler(name) {
                return Err(RouterError::DuplicateName(name.clone()));
            }
        }

        let id = self.tree.insert(parent, node)?;
        debug!(router = ?id, name = ?name, "attached router");

        if let Some(name) = name {
            if let Err(err) = self.add_handler(Rc::new(NamedRouter::new(name, id))) {
                self.tree.remove(id);
                return Err(err);
            }
        }
        Ok(id)
    }

    /// Attaches a declarative tree; `outlet_for` supplies each node's outlet
    ///
    /// The whole definition is validated first, so a route without a path
    /// attaches nothing.
    pub fn attach_def<F>(
        &mut self,
        parent: Option<RouterId>,
        def: &RouterDef,
        outlet_for: &mut F,
    ) -> Result<RouterId>
    where
        F: FnMut(&RouterDef) -> Outlet,
    {
        def.validate()?;
        self.attach_def_unchecked(parent, def, outlet_for)
    }

    fn attach_def_unchecked<F>(
        &mut self,
        parent: Option<RouterId>,
        def: &RouterDef,
        outlet_for: &mut F,
    ) -> Result<RouterId>
    where
        F: FnMut(&RouterDef) -> Outlet,
    {
        let node = def.to_node(outlet_for(def))?;
        let id = self.attach(parent, node)?;
        for child in &def.children {
            self.attach_def_unchecked(Some(id), child, outlet_for)?;
        }
        Ok(id)
    }

    /// Removes a router and everything beneath it
    ///
    /// Names are deregistered; their assignments stay for a later attach.
    pub fn detach(&mut self, id: RouterId) -> Result<()> {
        if !self.tree.contains(id) {
            return Err(RouterError::UnknownRouter(id));
        }

        for (_, node) in self.tree.remove(id) {
            if let Some(name) = node.name() {
                self.remove_handler(name);
            }
        }
        let tree = &self.tree;
        self.active.retain(|entry| tree.contains(entry.router));
        debug!(router = ?id, "detached router");
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate(&mut self, url: &str) -> Result<NavigationOutcome> {
        self.navigate_with(url, NavigateOptions::default())
    }

    /// Runs a navigation, or queues it when a pass is already running
    pub fn navigate_with(&mut self, url: &str, options: NavigateOptions) -> Result<NavigationOutcome> {
        if self.in_pass {
            debug!(url = %url, "navigation queued behind running pass");
            self.queue.push_back((url.to_string(), options));
            return Ok(NavigationOutcome::Queued);
        }
        self.sequenced(|runtime| runtime.run_navigation(url, options))
    }

    /// Navigates to whatever a clicked source points at
    pub fn navigate_from(&mut self, source: &dyn NavigationSource) -> Result<NavigationOutcome> {
        match source.same_origin_href() {
            None => Ok(NavigationOutcome::NotALink),
            Some(href) if href.is_empty() => Ok(NavigationOutcome::Ignored),
            Some(href) => self.navigate(&href),
        }
    }

    /// Drives a single router with `url`, the way a named router is driven
    /// by its assignment
    ///
    /// The router's subtree is reset first. Redirects are followed inside
    /// the subtree and update the router's assignment.
    pub fn dispatch_router(&mut self, id: RouterId, url: &str) -> Result<()> {
        if !self.tree.contains(id) {
            return Err(RouterError::UnknownRouter(id));
        }
        self.sequenced(|runtime| runtime.dispatch_subtree(id, url))
    }

    /// Serialized state of the whole runtime: assignments, then the
    /// positional fragments of every root router
    pub fn current_url(&self) -> String {
        let roots = self.tree.positional(self.tree.roots());
        let positional =
            compose_sibling_fragments(roots.iter().map(|id| self.generate_url_fragment(*id)));
        format!(
            "/{}",
            compose_sibling_fragments([self.serialize_assignments(), positional])
        )
    }

    /// URL fragment a router currently represents: its match, followed by
    /// its children's fragments and any unclaimed remainder
    pub fn generate_url_fragment(&self, id: RouterId) -> String {
        let Some(matched) = self.tree.get(id).and_then(RouterNode::current_match) else {
            return String::new();
        };

        let mut nested: Vec<String> = self
            .tree
            .positional_children(id)
            .into_iter()
            .map(|child| self.generate_url_fragment(child))
            .collect();
        nested.push(matched.remainder.clone());

        join_path(matched.url.trim_start_matches('/'), &group_fragments(nested))
    }

    /// Runs `f` as a pass; navigations queued meanwhile run right after it
    fn sequenced<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.in_pass {
            return f(self);
        }

        self.in_pass = true;
        let result = f(self);
        while let Some((url, options)) = self.queue.pop_front() {
            if let Err(err) = self.run_navigation(&url, options) {
                warn!(url = %url, error = %err, "queued navigation failed");
            }
        }
        self.in_pass = false;
        result
    }

    fn run_navigation(&mut self, url: &str, options: NavigateOptions) -> Result<NavigationOutcome> {
        let mut target = url.to_string();
        let mut check_guard = true;

        for _ in 0..=self.config.max_redirects {
            match self.pass(&target, check_guard)? {
                PassResult::Redirect(next) => {
                    debug!(from = %target, to = %next, "redirecting");
                    target = next;
                    check_guard = false;
                }
                PassResult::Done(NavigationOutcome::Completed { .. }) => {
                    let url = (!options.skip_history).then(|| self.write_history());
                    return Ok(NavigationOutcome::Completed { url });
                }
                PassResult::Done(outcome) => return Ok(outcome),
            }
        }

        Err(RouterError::RedirectLimit {
            url: url.to_string(),
            limit: self.config.max_redirects,
        })
    }

    fn write_history(&mut self) -> String {
        let url = self.current_url();
        let mode = self.dwell.decide(Instant::now());
        if let Some(history) = &self.history {
            history.write(&url, mode);
        }
        trace!(url = %url, mode = ?mode, "history written");
        url
    }

    fn pass(&mut self, url: &str, check_guard: bool) -> Result<PassResult> {
        debug!(url = %url, "dispatch pass");

        if check_guard && !self.can_leave_positional(url) {
            info!(url = %url, "navigation cancelled by guard");
            self.guard.navigation_cancelled(url);
            return Ok(PassResult::Done(NavigationOutcome::Cancelled));
        }

        let mut assignments = Vec::new();
        let mut positional = Vec::new();
        for fragment in split_sibling_fragments(url) {
            match grammar::parse_named_assignment(&fragment) {
                Some(assignment) => assignments.push(assignment),
                None => positional.push(fragment),
            }
        }

        for assignment in &assignments {
            if let Some(handler) = self.registry.handler(&assignment.name) {
                if !handler.can_leave(self, &assignment.url) {
                    info!(name = %assignment.name, url = %assignment.url, "assignment refused, pass aborted");
                    return Ok(PassResult::Done(NavigationOutcome::Rejected {
                        name: assignment.name.clone(),
                    }));
                }
            }
        }

        self.reset();

        for assignment in assignments {
            if !self.set_assignment(&assignment.name, &assignment.url)? {
                return Ok(PassResult::Done(NavigationOutcome::Rejected {
                    name: assignment.name,
                }));
            }
        }

        let roots = self.tree.positional(self.tree.roots());
        Ok(match self.match_level(&roots, positional, None)? {
            Some(Halt::Redirect(target)) => PassResult::Redirect(target),
            Some(Halt::Rejected(name)) => PassResult::Done(NavigationOutcome::Rejected { name }),
            None => PassResult::Done(NavigationOutcome::Completed { url: None }),
        })
    }

    fn can_leave_positional(&self, url: &str) -> bool {
        self.active
            .iter()
            .filter(|entry| !self.tree.in_named_subtree(entry.router))
            .all(|entry| self.entry_can_leave(entry, url))
    }

    /// Whether every active route inside `root`'s subtree lets go for `url`
    pub(crate) fn subtree_can_leave(&self, root: RouterId, url: &str) -> bool {
        self.active
            .iter()
            .filter(|entry| self.tree.is_within(entry.router, root))
            .all(|entry| self.entry_can_leave(entry, url))
    }

    fn entry_can_leave(&self, entry: &ActiveRoute, url: &str) -> bool {
        let Some(node) = self.tree.get(entry.router) else {
            return true;
        };
        if !node.outlet().can_leave(url) {
            return false;
        }
        let pattern = node
            .routes()
            .get(entry.route)
            .map(|route| route.path.as_str())
            .unwrap_or_default();
        self.guard.offer_cancellable(GuardEvent::LeaveRoute {
            pattern,
            from: &entry.matched,
            to: url,
        })
    }

    /// Clears positional routers; named subtrees keep their state
    fn reset(&mut self) {
        for id in self.tree.depth_first(self.tree.roots()) {
            if self.tree.in_named_subtree(id) {
                continue;
            }
            if let Some(node) = self.tree.get_mut(id) {
                node.clear_match();
            }
        }
        let tree = &self.tree;
        self.active.retain(|entry| tree.in_named_subtree(entry.router));
    }

    fn reset_subtree(&mut self, root: RouterId) {
        for id in self.tree.depth_first(&[root]) {
            if let Some(node) = self.tree.get_mut(id) {
                node.clear_match();
            }
        }
        let tree = &self.tree;
        self.active.retain(|entry| !tree.is_within(entry.router, root));
    }

    fn dispatch_subtree(&mut self, id: RouterId, url: &str) -> Result<()> {
        let mut target = url.to_string();

        for _ in 0..=self.config.max_redirects {
            self.reset_subtree(id);
            let next = match self.match_router(id, &target)? {
                None => return Ok(()),
                Some(Halt::Rejected(name)) => {
                    info!(router = ?id, name = %name, "nested assignment refused");
                    return Ok(());
                }
                Some(Halt::Redirect(next)) => next,
            };
            debug!(router = ?id, from = %target, to = %next, "redirecting router");
            if let Some(name) = self.tree.get(id).and_then(RouterNode::name) {
                let name = name.to_string();
                self.registry.assign(&name, &next);
            }
            target = next;
        }

        Err(RouterError::RedirectLimit {
            url: url.to_string(),
            limit: self.config.max_redirects,
        })
    }

    // ========================================================================
    // Match phase
    // ========================================================================

    /// Matches `routers` against `fragments` by position
    ///
    /// Named assignments among the fragments go to the registry first and
    /// drop out of `parent`'s remainder; the rest pair with `routers`.
    fn match_level(
        &mut self,
        routers: &[RouterId],
        fragments: Vec<String>,
        parent: Option<RouterId>,
    ) -> Result<Option<Halt>> {
        let mut positional = Vec::with_capacity(fragments.len());
        let mut assignments = Vec::new();
        for fragment in fragments {
            match grammar::parse_named_assignment(&fragment) {
                Some(assignment) => assignments.push(assignment),
                None => positional.push(fragment),
            }
        }

        if !assignments.is_empty() {
            if let Some(matched) = parent
                .and_then(|parent| self.tree.get_mut(parent))
                .and_then(|node| node.current_match.as_mut())
            {
                matched.remainder = group_fragments(&positional);
            }
            for assignment in assignments {
                if !self.set_assignment(&assignment.name, &assignment.url)? {
                    return Ok(Some(Halt::Rejected(assignment.name)));
                }
            }
        }

        for (position, id) in routers.iter().copied().enumerate() {
            if !self.tree.contains(id) {
                debug!(router = ?id, "router detached during pass");
                continue;
            }
            let fragment = positional.get(position).map(String::as_str).unwrap_or_default();
            if let Some(halt) = self.match_router(id, fragment)? {
                return Ok(Some(halt));
            }
            if let Some(parent) = parent {
                self.post_process_match(parent);
            }
        }
        Ok(None)
    }

    /// Carves a child's fragment out of `parent`'s remainder
    ///
    /// The remainder is re-split and its first fragment dropped; what is
    /// left is rewritten as nothing, a bare fragment or a group.
    fn post_process_match(&mut self, parent: RouterId) {
        let Some(matched) = self
            .tree
            .get_mut(parent)
            .and_then(|node| node.current_match.as_mut())
        else {
            return;
        };

        let mut fragments = split_sibling_fragments(&matched.remainder);
        if !fragments.is_empty() {
            fragments.remove(0);
        }
        matched.remainder = group_fragments(fragments);
    }

    /// Drops the match cache of every router below `id`
    ///
    /// Their outlets lived in content that was just replaced, so the next
    /// match has to render again.
    fn clear_descendant_caches(&mut self, id: RouterId) {
        let children = self
            .tree
            .get(id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default();
        for child in self.tree.depth_first(&children) {
            if let Some(node) = self.tree.get_mut(child) {
                node.routes.iter_mut().for_each(RouteNode::clear_last_match);
            }
        }
    }

    fn match_router(&mut self, id: RouterId, fragment: &str) -> Result<Option<Halt>> {
        let guard = Rc::clone(&self.guard);
        let node = self.tree.get_mut(id).ok_or(RouterError::UnknownRouter(id))?;
        let outlet = Rc::clone(node.outlet());

        let mut found = None;
        for (index, route) in node.routes.iter_mut().enumerate() {
            if found.is_some() {
                route.clear_last_match();
                continue;
            }
            found = route
                .match_url(fragment, guard.as_ref())
                .map(|matched| (index, matched));
        }

        let Some((index, matched)) = found else {
            warn!(router = %node.label(), url = %fragment, "no route matched");
            let message = self.config.not_found_label.clone();
            outlet.render(Content::NotFound {
                url: fragment.to_string(),
                message,
            });
            self.clear_descendant_caches(id);
            return Ok(None);
        };

        if let Some(target) = matched.redirect.clone() {
            return Ok(Some(Halt::Redirect(target)));
        }

        node.current_match = Some(matched.clone());
        node.matched_route = Some(index);
        self.active.push(ActiveRoute {
            router: id,
            route: index,
            matched: matched.clone(),
        });

        if matched.use_cache {
            trace!(router = %node.label(), url = %matched.url, "reusing rendered content");
        } else {
            let route = &node.routes[index];
            let content = self.content.resolve(route, &matched.data).unwrap_or_else(|| {
                warn!(pattern = %route.path, "matched route has no content");
                Content::Missing {
                    pattern: route.path.clone(),
                }
            });
            if let Content::Element(spec) = &content {
                spec.ensure_defined(self.loader.as_ref());
            }
            outlet.render(content);
        }

        if !self.tree.contains(id) {
            debug!(router = ?id, "router detached while rendering");
            return Ok(None);
        }
        if !matched.use_cache {
            self.clear_descendant_caches(id);
        }

        let children = self.tree.positional_children(id);
        if matched.remainder.is_empty() || children.is_empty() {
            return Ok(None);
        }
        let fragments = split_sibling_fragments(&matched.remainder);
        self.match_level(&children, fragments, Some(id))
    }
}
