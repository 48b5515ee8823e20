// Router behavior switches

use serde::{Deserialize, Serialize};

/// Settings of a [`Router`](crate::Router).
///
/// Every field has a default, so partial documents deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Try routes whose template equals the request path before pattern routes.
    pub prefer_exact_match: bool,
    /// Add a `Vary` header describing the negotiated request headers.
    pub emit_vary_header: bool,
    /// Fill in `Content-Type` from the route's produced types when the action did not.
    pub set_produced_content_type: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefer_exact_match: true,
            emit_vary_header: true,
            set_produced_content_type: true,
        }
    }
}
