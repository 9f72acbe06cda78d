//! # Outlet Router
//!
//! A hierarchical routing engine for client-side UIs where several
//! independently placed regions (outlets) resolve fragments of one URL:
//! - Sibling fragments (`list/3::detail`) for routers side by side
//! - Grouping (`list/(3::detail/4)`) to hand siblings to nested routers
//! - Named assignments (`(sidebar:user-card(cards/user_dot_js):id=7)`)
//!   for routers and outlets addressed by name
//! - Parameters (`:id`), optional params with defaults (`:tab?info`) and
//!   greedy tails (`:rest+`, `:rest*`)
//!
//! ## Architecture
//!
//! - [`grammar`]: pure tokenizer/serializer for the URL syntax
//! - [`route`]: path patterns, the matcher and per-route match cache
//! - [`registry`]: named handlers and durable assignments
//! - [`dispatch`]: [`RouterRuntime`], which runs navigation passes over a
//!   tree of [`RouterNode`]s
//!
//! Rendering, history, module loading and link interception are external;
//! the runtime reaches them through the traits in [`collab`].
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use outlet_router::{Content, RenderTarget, RouteNode, RouterNode, RouterRuntime};
//!
//! #[derive(Default)]
//! struct Panel(RefCell<Option<Content>>);
//!
//! impl RenderTarget for Panel {
//!     fn render(&self, content: Content) {
//!         *self.0.borrow_mut() = Some(content);
//!     }
//! }
//!
//! let list = Rc::new(Panel::default());
//! let detail = Rc::new(Panel::default());
//!
//! let mut runtime = RouterRuntime::default();
//! let root = runtime
//!     .attach(None, RouterNode::new(list.clone()).with_route(RouteNode::new("list").with_component("item-list")))
//!     .unwrap();
//! runtime
//!     .attach(Some(root), RouterNode::new(detail.clone()).with_route(RouteNode::new(":id").with_component("item-detail")))
//!     .unwrap();
//!
//! runtime.navigate("/list/42").unwrap();
//!
//! let Some(Content::Element(spec)) = detail.0.borrow().clone() else { panic!() };
//! assert_eq!(spec.tag, "item-detail");
//! assert_eq!(spec.data["id"], "42");
//! assert_eq!(runtime.current_url(), "/list/42");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod collab;
pub mod config;
pub mod dispatch;
mod error;
pub mod grammar;
pub mod history;
pub mod named;
pub mod path;
pub mod registry;
pub mod route;
pub mod tree;

pub use collab::{
    AllowAll, Content, ContentHandle, ContentProvider, ElementContentProvider, ElementSpec,
    GuardEvent, GuardNotifier, HistoryStore, ModuleLoader, NavigationSource, Outlet,
    PreloadedModules, RenderTarget,
};
pub use config::{RouteDef, RouterConfig, RouterDef, RouterManifest};
pub use dispatch::{ActiveRoute, NavigateOptions, NavigationOutcome, RouterRuntime};
pub use error::{Result, RouterError};
pub use grammar::{
    compose_sibling_fragments, parse_named_outlet_payload, serialize_assignment,
    split_sibling_fragments, Assignment, NamedAssignment, NamedOutletPayload,
};
pub use history::{DwellPolicy, HistoryMode};
pub use named::{NamedOutlet, NamedRouter};
pub use registry::{NamedItem, NamedRegistry};
pub use route::{match_path, Match, MatchData, RouteNode};
pub use tree::{RouterId, RouterNode, RouterTree};
