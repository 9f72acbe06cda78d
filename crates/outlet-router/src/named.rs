//! Built-in named items

use tracing::{debug, warn};

use crate::collab::{Content, ElementSpec, Outlet};
use crate::dispatch::RouterRuntime;
use crate::error::Result;
use crate::grammar::parse_named_outlet_payload;
use crate::registry::NamedItem;
use crate::tree::RouterId;

/// A router node addressed by name
///
/// Registered by [`RouterRuntime::attach`] for every node that has a name.
#[derive(Debug, Clone)]
pub struct NamedRouter {
    name: String,
    id: RouterId,
}

impl NamedRouter {
    pub fn new(name: impl Into<String>, id: RouterId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn id(&self) -> RouterId {
        self.id
    }
}

impl NamedItem for NamedRouter {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_leave(&self, runtime: &RouterRuntime, url: &str) -> bool {
        runtime.subtree_can_leave(self.id, url)
    }

    fn process_named_url(&self, runtime: &mut RouterRuntime, url: &str) -> Result<()> {
        debug!(name = %self.name, url = %url, "named router dispatch");
        runtime.dispatch_router(self.id, url)
    }
}

/// An outlet that shows the element described by its assignment
///
/// The assignment payload reads `tag(import):key=value&.prop=value`.
pub struct NamedOutlet {
    name: String,
    target: Outlet,
}

impl NamedOutlet {
    pub fn new(name: impl Into<String>, target: Outlet) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

impl NamedItem for NamedOutlet {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_leave(&self, _runtime: &RouterRuntime, url: &str) -> bool {
        self.target.can_leave(url)
    }

    fn process_named_url(&self, runtime: &mut RouterRuntime, url: &str) -> Result<()> {
        let Some(payload) = parse_named_outlet_payload(url) else {
            warn!(name = %self.name, url = %url, "unusable named outlet payload");
            self.target.render(Content::NotFound {
                url: url.to_string(),
                message: runtime.config().not_found_label.clone(),
            });
            return Ok(());
        };

        let spec = ElementSpec::from(payload);
        spec.ensure_defined(runtime.loader());
        self.target.render(Content::Element(spec));
        Ok(())
    }
}
