// Controllers: the unit of route registration

use crate::route::RouteSpec;
use std::sync::Arc;

/// A group of routes bound and unbound together.
///
/// ```
/// use waypoint_core::{Controller, HttpResponse, RouteBuilder, RouteSpec};
///
/// struct Health;
///
/// impl Controller for Health {
///     fn prefix(&self) -> &str {
///         "/health"
///     }
///
///     fn routes(&self) -> Vec<RouteSpec> {
///         vec![RouteBuilder::get("/").to("check", |_, _| Ok(HttpResponse::ok()))]
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// The routes this controller declares.
    fn routes(&self) -> Vec<RouteSpec>;

    /// Prefix joined in front of every route URI.
    fn prefix(&self) -> &str {
        ""
    }

    /// Name used by reverse routing.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Identity of a bound controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(u64);

impl ControllerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Identity of a controller instance. Two clones of the same `Arc`
    /// share an id.
    pub fn of(controller: &Arc<dyn Controller>) -> Self {
        Self(Arc::as_ptr(controller) as *const () as usize as u64)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Join a controller prefix and a route URI without doubling `/`.
pub fn join_prefix(prefix: &str, uri: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return uri.to_string();
    }
    match uri {
        "" | "/" => prefix.to_string(),
        uri if uri.starts_with('/') => format!("{}{}", prefix, uri),
        uri => format!("{}/{}", prefix, uri),
    }
}
