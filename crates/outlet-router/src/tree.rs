//! Arena of router nodes
//!
//! Nodes live in slots addressed by [`RouterId`]. An id carries the slot's
//! generation, so an id kept across a detach never resolves to whatever
//! node reuses the slot later.

use std::fmt;

use crate::collab::Outlet;
use crate::error::{Result, RouterError};
use crate::route::{Match, RouteNode};

/// Generational handle to a router node
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouterId {
    index: usize,
    generation: u32,
}

impl fmt::Debug for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouterId({}v{})", self.index, self.generation)
    }
}

/// A composite matching context: routes, nested routers and one outlet
pub struct RouterNode {
    name: Option<String>,
    pub(crate) routes: Vec<RouteNode>,
    children: Vec<RouterId>,
    parent: Option<RouterId>,
    outlet: Outlet,
    pub(crate) current_match: Option<Match>,
    pub(crate) matched_route: Option<usize>,
}

impl RouterNode {
    pub fn new(outlet: Outlet) -> Self {
        Self {
            name: None,
            routes: Vec::new(),
            children: Vec::new(),
            parent: None,
            outlet,
            current_match: None,
            matched_route: None,
        }
    }

    /// Makes the node a named item; named routers are driven by assignments
    /// and skipped by positional matching
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn with_route(mut self, route: RouteNode) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_routes<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = RouteNode>,
    {
        self.routes.extend(routes);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    pub fn routes(&self) -> &[RouteNode] {
        &self.routes
    }

    pub fn children(&self) -> &[RouterId] {
        &self.children
    }

    pub fn parent(&self) -> Option<RouterId> {
        self.parent
    }

    pub fn outlet(&self) -> &Outlet {
        &self.outlet
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.current_match.as_ref()
    }

    pub fn has_match(&self) -> bool {
        self.current_match.is_some()
    }

    /// Route that produced `current_match`
    pub fn matched_route(&self) -> Option<&RouteNode> {
        self.matched_route.and_then(|i| self.routes.get(i))
    }

    pub(crate) fn clear_match(&mut self) {
        self.current_match = None;
        self.matched_route = None;
    }

    /// Label for logs and errors
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<anonymous>".to_string())
    }
}

impl fmt::Debug for RouterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterNode")
            .field("name", &self.name)
            .field("routes", &self.routes.len())
            .field("children", &self.children)
            .field("current_match", &self.current_match)
            .finish_non_exhaustive()
    }
}

struct Slot {
    generation: u32,
    node: Option<RouterNode>,
}

/// Owner of every router node of one runtime
#[derive(Default)]
pub struct RouterTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    roots: Vec<RouterId>,
}

impl RouterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` under `parent`, or as a root
    pub(crate) fn insert(&mut self, parent: Option<RouterId>, mut node: RouterNode) -> Result<RouterId> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(RouterError::UnknownRouter(parent));
            }
        }
        node.parent = parent;
        node.children.clear();

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation = slot.generation.wrapping_add(1);
                slot.node = Some(node);
                RouterId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                RouterId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };

        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Removes `id` and its whole subtree, returning the removed nodes
    /// (root of the subtree first)
    pub(crate) fn remove(&mut self, id: RouterId) -> Vec<(RouterId, RouterNode)> {
        let Some(parent) = self.get(id).map(RouterNode::parent) else {
            return Vec::new();
        };

        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent_node) => parent_node.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }

        let mut removed = Vec::new();
        for node_id in self.depth_first(&[id]) {
            if let Some(node) = self.slots[node_id.index].node.take() {
                self.free.push(node_id.index);
                removed.push((node_id, node));
            }
        }
        removed
    }

    pub fn contains(&self, id: RouterId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: RouterId) -> Option<&RouterNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: RouterId) -> Option<&mut RouterNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn roots(&self) -> &[RouterId] {
        &self.roots
    }

    /// Pre-order walk (node before its children) starting from `start`
    pub fn depth_first(&self, start: &[RouterId]) -> Vec<RouterId> {
        let mut order = Vec::new();
        let mut stack: Vec<RouterId> = start.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Unnamed routers among `ids`, the ones that take positional fragments
    pub fn positional(&self, ids: &[RouterId]) -> Vec<RouterId> {
        ids.iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(|node| !node.is_named()))
            .collect()
    }

    /// Positional children of `id`
    pub fn positional_children(&self, id: RouterId) -> Vec<RouterId> {
        self.get(id)
            .map(|node| self.positional(&node.children))
            .unwrap_or_default()
    }

    /// Whether `id` is `ancestor` or lies beneath it
    pub fn is_within(&self, id: RouterId, ancestor: RouterId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.get(node_id).and_then(RouterNode::parent);
        }
        false
    }

    /// Whether `id` belongs to the subtree of a named router
    pub fn in_named_subtree(&self, id: RouterId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.get(node_id) {
                Some(node) if node.is_named() => return true,
                Some(node) => current = node.parent(),
                None => return false,
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{Content, RenderTarget};
    use std::rc::Rc;

    struct Blank;

    impl RenderTarget for Blank {
        fn render(&self, _content: Content) {}
    }

    fn node() -> RouterNode {
        RouterNode::new(Rc::new(Blank))
    }

    #[test]
    fn test_insert_and_walk() {
        let mut tree = RouterTree::new();
        let root = tree.insert(None, node()).unwrap();
        let a = tree.insert(Some(root), node()).unwrap();
        let b = tree.insert(Some(root), node()).unwrap();
        let a1 = tree.insert(Some(a), node()).unwrap();

        assert_eq!(tree.depth_first(&[root]), vec![root, a, a1, b]);
        assert_eq!(tree.roots(), &[root]);
        assert!(tree.is_within(a1, root));
        assert!(!tree.is_within(b, a));
    }

    #[test]
    fn test_remove_subtree_invalidates_ids() {
        let mut tree = RouterTree::new();
        let root = tree.insert(None, node()).unwrap();
        let child = tree.insert(Some(root), node()).unwrap();

        let removed = tree.remove(root);
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(child));
        assert!(tree.is_empty());

        let reused = tree.insert(None, node()).unwrap();
        assert_ne!(reused, root);
        assert!(tree.get(root).is_none());
    }

    #[test]
    fn test_insert_under_dead_parent() {
        let mut tree = RouterTree::new();
        let root = tree.insert(None, node()).unwrap();
        tree.remove(root);
        assert!(matches!(
            tree.insert(Some(root), node()),
            Err(RouterError::UnknownRouter(id)) if id == root
        ));
    }

    #[test]
    fn test_positional_skips_named() {
        let mut tree = RouterTree::new();
        let root = tree.insert(None, node()).unwrap();
        let named = tree.insert(Some(root), node().with_name("side")).unwrap();
        let plain = tree.insert(Some(root), node()).unwrap();
        let inner = tree.insert(Some(named), node()).unwrap();

        assert_eq!(tree.positional_children(root), vec![plain]);
        assert!(tree.in_named_subtree(inner));
        assert!(!tree.in_named_subtree(plain));
    }
}
