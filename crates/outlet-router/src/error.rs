//! Error types for the routing engine
//!
//! Only structural problems are errors. A URL that does not match, a
//! malformed fragment or a vetoed navigation are ordinary outcomes and
//! never show up here.

use thiserror::Error;

use crate::tree::RouterId;

/// Fatal configuration and runtime errors
#[derive(Debug, Error)]
pub enum RouterError {
    /// A named item tried to register under a name that is already taken
    #[error("a named item called `{0}` is already registered")]
    DuplicateName(String),

    /// A route was declared without its required path pattern
    #[error("route #{index} of router {router} has no path")]
    MissingPath { router: String, index: usize },

    /// The router id does not refer to a live node (detached or never attached)
    #[error("router {0:?} is not attached")]
    UnknownRouter(RouterId),

    /// A chain of redirects exceeded the configured limit
    #[error("redirect limit of {limit} exceeded while navigating to `{url}`")]
    RedirectLimit { url: String, limit: usize },

    /// Configuration values that parse but make no sense
    #[error("invalid router configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T, E = RouterError> = std::result::Result<T, E>;
