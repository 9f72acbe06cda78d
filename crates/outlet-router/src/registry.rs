//! Named registry: name → handler and name → assignment
//!
//! The registry is the message bus between URLs and named items. An
//! assignment outlives its handler: it stays stored when the handler goes
//! away and is replayed once when a handler registers under the name again.
//!
//! [`NamedRegistry`] is plain storage. The assignment protocol, which has
//! to call back into handlers that may in turn dispatch, lives on
//! [`RouterRuntime`].

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::dispatch::RouterRuntime;
use crate::error::{Result, RouterError};
use crate::grammar::{
    compose_sibling_fragments, serialize_assignment, serialize_assignment_raw, Assignment,
    NamedAssignment,
};

/// A router or outlet reachable by name
///
/// Handlers receive the runtime so they can dispatch re-entrantly.
pub trait NamedItem {
    fn name(&self) -> &str;

    /// Whether the item may switch to `url`
    fn can_leave(&self, runtime: &RouterRuntime, url: &str) -> bool;

    /// Shows `url` in the item
    fn process_named_url(&self, runtime: &mut RouterRuntime, url: &str) -> Result<()>;
}

/// Storage for handlers and assignments
#[derive(Default)]
pub struct NamedRegistry {
    handlers: IndexMap<String, Rc<dyn NamedItem>>,
    assignments: IndexMap<String, Assignment>,
}

impl NamedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a handler; a non-empty name that is already taken is fatal
    ///
    /// Handlers with an empty name cannot be addressed and are not stored.
    pub fn insert_handler(&mut self, handler: Rc<dyn NamedItem>) -> Result<()> {
        let name = handler.name();
        if name.is_empty() {
            return Ok(());
        }
        if self.handlers.contains_key(name) {
            return Err(RouterError::DuplicateName(name.to_string()));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    /// Deletes the handler entry only; no-op when absent
    pub fn remove_handler(&mut self, name: &str) -> Option<Rc<dyn NamedItem>> {
        self.handlers.shift_remove(name)
    }

    pub fn handler(&self, name: &str) -> Option<Rc<dyn NamedItem>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn assignment(&self, name: &str) -> Option<&Assignment> {
        self.assignments.get(name)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// Writes an assignment and returns the one it replaced
    ///
    /// Re-assigning a name keeps its original position.
    pub fn assign(&mut self, name: &str, url: &str) -> Option<Assignment> {
        self.assignments
            .insert(name.to_string(), Assignment::new(name, url))
    }

    /// Puts back what [`assign`](Self::assign) replaced
    pub fn restore(&mut self, name: &str, previous: Option<Assignment>) {
        match previous {
            Some(previous) => {
                self.assignments.insert(name.to_string(), previous);
            }
            None => {
                self.assignments.shift_remove(name);
            }
        }
    }

    /// Reads and deletes an assignment
    pub fn consume(&mut self, name: &str) -> Option<Assignment> {
        self.assignments.shift_remove(name)
    }

    /// All assignments as `(name:url)` groups joined by `::`, in insertion order
    pub fn serialize_all(&self, escape_periods: bool) -> String {
        compose_sibling_fragments(self.assignments.values().map(|assignment| {
            if escape_periods {
                serialize_assignment(assignment)
            } else {
                serialize_assignment_raw(assignment)
            }
        }))
    }
}

impl fmt::Debug for NamedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("assignments", &self.assignments)
            .finish()
    }
}

// ============================================================================
// Assignment protocol
// ============================================================================

impl RouterRuntime {
    /// Registers a named handler
    ///
    /// Fails with [`RouterError::DuplicateName`] when the name is taken. A
    /// pending assignment for the name is replayed once if the handler can
    /// leave its current state for it; the replay's outcome does not affect
    /// registration.
    pub fn add_handler(&mut self, handler: Rc<dyn NamedItem>) -> Result<()> {
        self.registry.insert_handler(Rc::clone(&handler))?;
        let name = handler.name().to_string();
        debug!(name = %name, "registered named item");

        let Some(pending) = self.registry.assignment(&name).cloned() else {
            return Ok(());
        };
        if !handler.can_leave(self, &pending.url) {
            info!(name = %name, url = %pending.url, "pending assignment not replayed, handler refused");
            return Ok(());
        }
        if let Err(err) = handler.process_named_url(self, &pending.url) {
            warn!(name = %name, url = %pending.url, error = %err, "replaying pending assignment failed");
        }
        Ok(())
    }

    /// Deregisters a handler; its assignment stays
    pub fn remove_handler(&mut self, name: &str) {
        if self.registry.remove_handler(name).is_some() {
            debug!(name = %name, "deregistered named item");
        }
    }

    /// Assigns `url` to `name`
    ///
    /// Returns `Ok(false)` when the registered handler refused to leave its
    /// current state; the previous assignment is then restored. Without a
    /// handler the assignment is simply stored for later.
    pub fn set_assignment(&mut self, name: &str, url: &str) -> Result<bool> {
        let previous = self.registry.assign(name, url);

        let Some(handler) = self.registry.handler(name) else {
            debug!(name = %name, url = %url, "stored pending assignment");
            return Ok(true);
        };

        if !handler.can_leave(self, url) {
            self.registry.restore(name, previous);
            info!(name = %name, url = %url, "assignment cancelled by guard");
            return Ok(false);
        }

        handler.process_named_url(self, url)?;
        Ok(true)
    }

    /// Reads and deletes the assignment for `name`
    pub fn consume_assignment(&mut self, name: &str) -> Option<Assignment> {
        self.registry.consume(name)
    }

    /// Serialized form of every current assignment
    pub fn serialize_assignments(&self) -> String {
        self.registry.serialize_all(self.config.escape_periods)
    }

    /// Parses a `name:payload` fragment and, unless suppressed, assigns it
    ///
    /// A refused assignment still parses; the result is marked `cancelled`.
    pub fn parse_named_assignment(
        &mut self,
        fragment: &str,
        suppress_registration: bool,
    ) -> Result<Option<NamedAssignment>> {
        let Some(mut parsed) = crate::grammar::parse_named_assignment(fragment) else {
            return Ok(None);
        };
        if !suppress_registration {
            parsed.cancelled = !self.set_assignment(&parsed.name, &parsed.url)?;
        }
        Ok(Some(parsed))
    }
}
