// Waypoint - an HTTP route table for Rust
//
// Matches (method, path, headers) to registered actions, detects conflicting
// registrations, negotiates media types, binds typed action parameters and
// builds URLs back from routes.

// Re-export core functionality
pub use waypoint_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use waypoint_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ActionParameter,
        BeanDescriptor,
        Context,
        Controller,
        ControllerId,
        Error,
        HttpMethod,
        HttpResponse,
        ParamType,
        Request,
        Result,
        Route,
        RouteBuilder,
        RouteSpec,
        Router,
        RouterConfig,
        ScalarType,
        Value,
        // Validation hook
        Constraint,
        ConstraintViolation,
        RequiredValidator,
        Validator,
    };
}
