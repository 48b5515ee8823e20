// Core library for the Waypoint route table
// Path templates, conflict detection, content negotiation, parameter binding
// and reverse routing

pub mod bean;
pub mod bindings;
pub mod config;
pub mod content_negotiation;
pub mod context;
pub mod controller;
pub mod converter;
pub mod cookies;
pub mod error;
pub mod http;
pub mod logging;
pub mod negotiation;
pub mod parameter;
pub mod path_pattern;
pub mod reverse;
pub mod route;
pub mod router;
pub mod validation;

// Re-export commonly used types
pub use bean::*;
pub use bindings::*;
pub use config::*;
pub use content_negotiation::*;
pub use context::*;
pub use controller::*;
pub use converter::*;
pub use cookies::*;
pub use error::*;
pub use self::http::*;
pub use negotiation::*;
pub use parameter::*;
pub use path_pattern::*;
pub use reverse::compute_url;
pub use route::{Action, Route, RouteBuilder, RouteEntry, RouteSpec};
pub use router::Router;
pub use validation::*;
