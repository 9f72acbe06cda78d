// File: src/config.rs
// Purpose: Router configuration and declarative router trees from TOML

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::collab::Outlet;
use crate::error::{Result, RouterError};
use crate::route::RouteNode;
use crate::tree::RouterNode;

/// Runtime behaviour knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Navigations closer together than this replace the history entry
    #[serde(default = "default_dwell_time_ms")]
    pub dwell_time_ms: u64,

    /// Redirects followed by one navigation before it fails
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Message carried by the fallback content when nothing matched
    #[serde(default = "default_not_found_label")]
    pub not_found_label: String,

    /// Escape `.` as `_dot_` in serialized assignments
    #[serde(default = "default_true")]
    pub escape_periods: bool,
}

fn default_dwell_time_ms() -> u64 {
    200
}

fn default_max_redirects() -> usize {
    5
}

fn default_not_found_label() -> String {
    "No route matched".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            dwell_time_ms: default_dwell_time_ms(),
            max_redirects: default_max_redirects(),
            not_found_label: default_not_found_label(),
            escape_periods: true,
        }
    }
}

impl RouterConfig {
    pub fn dwell_time(&self) -> Duration {
        Duration::from_millis(self.dwell_time_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_redirects == 0 {
            return Err(RouterError::InvalidConfig(
                "max_redirects must be at least 1".to_string(),
            ));
        }
        if self.not_found_label.trim().is_empty() {
            return Err(RouterError::InvalidConfig(
                "not_found_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads the `[router]` table of a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(RouterManifest::from_toml_str(content)?.router)
    }

    /// Load configuration from a TOML file; a missing file gives the defaults
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(RouterManifest::load(path)?.router)
    }
}

// ============================================================================
// Declarative trees
// ============================================================================

/// A route as written in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    /// Required; a route without it fails to attach
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub fullmatch: bool,

    #[serde(default)]
    pub redirect: Option<String>,

    #[serde(default)]
    pub disable_cache: bool,

    #[serde(default)]
    pub component: Option<String>,

    #[serde(default)]
    pub import: Option<String>,
}

impl RouteDef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Builds the route; `router` and `index` only label the error
    pub fn to_route(&self, router: &str, index: usize) -> Result<RouteNode> {
        let path = self.path.as_ref().ok_or_else(|| RouterError::MissingPath {
            router: router.to_string(),
            index,
        })?;

        let mut route = RouteNode::new(path.clone());
        route.fullmatch = self.fullmatch;
        route.redirect = self.redirect.clone();
        route.disable_cache = self.disable_cache;
        route.component = self.component.clone();
        route.import = self.import.clone();
        Ok(route)
    }
}

/// A router node with its routes and nested routers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDef {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub routes: Vec<RouteDef>,

    #[serde(default)]
    pub children: Vec<RouterDef>,
}

impl RouterDef {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// Checks the whole subtree, so a bad definition attaches nothing
    pub fn validate(&self) -> Result<()> {
        for (index, route) in self.routes.iter().enumerate() {
            route.to_route(self.label(), index)?;
        }
        self.children.iter().try_for_each(RouterDef::validate)
    }

    /// Builds this level only; children are attached by the runtime
    pub fn to_node(&self, outlet: Outlet) -> Result<RouterNode> {
        let routes = self
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| route.to_route(self.label(), index))
            .collect::<Result<Vec<_>>>()?;

        let node = RouterNode::new(outlet).with_routes(routes);
        Ok(match &self.name {
            Some(name) => node.with_name(name.clone()),
            None => node,
        })
    }
}

/// A whole TOML document: `[router]` settings plus `[[routers]]` trees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterManifest {
    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub routers: Vec<RouterDef>,
}

impl RouterManifest {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let manifest: RouterManifest = toml::from_str(content)?;
        manifest.router.validate()?;
        manifest.routers.iter().try_for_each(RouterDef::validate)?;
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read router manifest: {:?}", path))?;

        let manifest = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse router manifest: {:?}", path))?;

        Ok(manifest)
    }
}
