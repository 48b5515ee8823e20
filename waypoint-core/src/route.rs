//! Route declarations, compiled route entries, and the per-lookup route handle.

use crate::bindings::Bindings;
use crate::config::RouterConfig;
use crate::content_negotiation::{Accept, MediaType, media_types_overlap, negotiate_media_type};
use crate::context::Context;
use crate::controller::{Controller, ControllerId, join_prefix};
use crate::converter::ConverterEngine;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpResponse, Request};
use crate::parameter::{ActionParameter, Value};
use crate::path_pattern::PathPattern;
use crate::validation::Validator;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The callable behind a route.
pub type Action =
    Arc<dyn for<'a> Fn(&'a Context, Vec<Value<'a>>) -> Result<HttpResponse> + Send + Sync>;

/// A route as declared by a controller, not yet compiled.
#[derive(Clone)]
pub struct RouteSpec {
    method: HttpMethod,
    uri: String,
    action_name: String,
    action: Action,
    accepts: Vec<String>,
    produces: Vec<String>,
    parameters: Vec<ActionParameter>,
}

impl RouteSpec {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("action_name", &self.action_name)
            .field("accepts", &self.accepts)
            .field("produces", &self.produces)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Fluent declaration of a [`RouteSpec`].
///
/// ```
/// use waypoint_core::{ActionParameter, HttpResponse, ParamType, RouteBuilder, ScalarType};
///
/// let spec = RouteBuilder::get("/items/{id}")
///     .producing(["application/json"])
///     .parameter(ActionParameter::path("id", ParamType::Scalar(ScalarType::Long)))
///     .to("item", |_ctx, args| {
///         let id = args[0].as_i64().unwrap_or_default();
///         HttpResponse::ok().with_json(&id)
///     });
/// assert_eq!(spec.action_name(), "item");
/// ```
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    method: HttpMethod,
    uri: String,
    accepts: Vec<String>,
    produces: Vec<String>,
    parameters: Vec<ActionParameter>,
}

impl RouteBuilder {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            accepts: Vec::new(),
            produces: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::POST, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::PUT, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::DELETE, uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::PATCH, uri)
    }

    /// Request body media types the action can read
    pub fn accepting<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepts.extend(media_types.into_iter().map(Into::into));
        self
    }

    /// Response media types the action can write
    pub fn producing<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces.extend(media_types.into_iter().map(Into::into));
        self
    }

    pub fn parameter(mut self, parameter: ActionParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(mut self, parameters: impl IntoIterator<Item = ActionParameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Finish the declaration with the action invoked for matching requests.
    pub fn to<F>(self, action_name: impl Into<String>, action: F) -> RouteSpec
    where
        F: for<'a> Fn(&'a Context, Vec<Value<'a>>) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        RouteSpec {
            method: self.method,
            uri: self.uri,
            action_name: action_name.into(),
            action: Arc::new(action),
            accepts: self.accepts,
            produces: self.produces,
            parameters: self.parameters,
        }
    }
}

/// A compiled, immutable route
pub struct RouteEntry {
    method: HttpMethod,
    pattern: PathPattern,
    signature: String,
    controller_id: ControllerId,
    controller_name: String,
    controller: Option<Arc<dyn Controller>>,
    action_name: String,
    action: Action,
    accepts: Vec<MediaType>,
    produces: Vec<MediaType>,
    parameters: Vec<ActionParameter>,
    must_validate: bool,
}

impl RouteEntry {
    /// Compile a declaration. The controller prefix is joined to the URI.
    pub(crate) fn compile(
        spec: RouteSpec,
        controller_id: ControllerId,
        controller_name: &str,
        prefix: &str,
        controller: Option<Arc<dyn Controller>>,
    ) -> Result<Self> {
        let uri = join_prefix(prefix, &spec.uri);
        let pattern = PathPattern::compile(&uri)?;
        let accepts = parse_media_types(&spec.accepts, &uri)?;
        let produces = parse_media_types(&spec.produces, &uri)?;
        let must_validate = spec
            .parameters
            .iter()
            .any(|parameter| !parameter.constraints().is_empty());

        Ok(Self {
            method: spec.method,
            signature: pattern.signature(),
            pattern,
            controller_id,
            controller_name: controller_name.to_string(),
            controller,
            action_name: spec.action_name,
            action: spec.action,
            accepts,
            produces,
            parameters: spec.parameters,
            must_validate,
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The template with parameter names erased, shared by routes of the same shape
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The full URI template, prefix included
    pub fn url(&self) -> &str {
        self.pattern.raw()
    }

    pub fn controller_id(&self) -> ControllerId {
        self.controller_id
    }

    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    pub fn controller(&self) -> Option<&Arc<dyn Controller>> {
        self.controller.as_ref()
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn accepts(&self) -> &[MediaType] {
        &self.accepts
    }

    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    pub fn parameters(&self) -> &[ActionParameter] {
        &self.parameters
    }

    /// Some parameter declares constraints
    pub fn must_validate(&self) -> bool {
        self.must_validate
    }

    /// Two entries conflict when no request could tell them apart: same
    /// method, same template shape, and overlapping media types.
    pub fn conflicts_with(&self, other: &RouteEntry) -> bool {
        self.method == other.method
            && self.signature == other.signature
            && media_types_overlap(&self.accepts, &other.accepts)
            && media_types_overlap(&self.produces, &other.produces)
    }

    /// Whether a request body of `content_type` is acceptable: 2 for an exact
    /// match or no declared types, 1 for a wildcard match, 0 otherwise.
    pub fn accepts_content_type(&self, content_type: Option<&MediaType>) -> u8 {
        let Some(content_type) = content_type else {
            return 2;
        };
        if self.accepts.is_empty() {
            return 2;
        }
        if self
            .accepts
            .iter()
            .any(|accepted| accepted.same_mime_type(content_type))
        {
            2
        } else if self
            .accepts
            .iter()
            .any(|accepted| accepted.matches(content_type))
        {
            1
        } else {
            0
        }
    }

    /// Whether the client accepts one of the produced types. No `Accept`
    /// header, or no declared produced types, is always compliant.
    pub fn is_compliant_with_accept(&self, accept: Option<&Accept>) -> bool {
        match accept {
            None => true,
            Some(_) if self.produces.is_empty() => true,
            Some(accept) => self.produces.iter().any(|mt| accept.accepts(mt)),
        }
    }

    /// Invoke the action directly with already-bound arguments.
    pub fn call<'a>(&self, ctx: &'a Context, arguments: Vec<Value<'a>>) -> Result<HttpResponse> {
        (self.action)(ctx, arguments)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("url", &self.pattern.raw())
            .field("controller", &self.controller_name)
            .field("action", &self.action_name)
            .field("accepts", &self.accepts)
            .field("produces", &self.produces)
            .finish()
    }
}

fn parse_media_types(declared: &[String], uri: &str) -> Result<Vec<MediaType>> {
    declared
        .iter()
        .map(|raw| {
            MediaType::parse(raw).ok_or_else(|| {
                Error::InvalidRoute(format!("invalid media type '{}' on '{}'", raw, uri))
            })
        })
        .collect()
}

/// Collaborators shared by every route of a router at lookup time.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) engine: Arc<dyn ConverterEngine>,
    pub(crate) validator: Option<Arc<dyn Validator>>,
    pub(crate) config: RouterConfig,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("validator", &self.validator.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// The outcome of a lookup.
///
/// A bound route carries the matched entry and its encoded path captures.
/// An unbound route carries the status to report: 404 when nothing matched
/// or the match is conflicted, 406 or 415 when negotiation failed.
#[derive(Debug, Clone)]
pub struct Route {
    method: HttpMethod,
    path: String,
    entry: Option<Arc<RouteEntry>>,
    status: u16,
    params: HashMap<String, String>,
    services: Option<Arc<Services>>,
}

impl Route {
    pub(crate) fn bound(
        method: HttpMethod,
        path: &str,
        entry: Arc<RouteEntry>,
        params: HashMap<String, String>,
        services: Arc<Services>,
    ) -> Self {
        Self {
            method,
            path: path.to_string(),
            entry: Some(entry),
            status: 200,
            params,
            services: Some(services),
        }
    }

    /// A route that cannot serve the request, carrying the status to answer with.
    pub fn unbound(method: HttpMethod, path: &str, status: u16) -> Self {
        Self {
            method,
            path: path.to_string(),
            entry: None,
            status,
            params: HashMap::new(),
            services: None,
        }
    }

    pub fn is_unbound(&self) -> bool {
        self.entry.is_none()
    }

    /// 404, 406 or 415 for unbound routes; 200 otherwise
    pub fn unbound_status(&self) -> u16 {
        self.status
    }

    pub fn http_method(&self) -> HttpMethod {
        self.method
    }

    /// The request path this route was looked up for
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The matched URI template, or the request path when unbound
    pub fn url(&self) -> &str {
        self.entry
            .as_ref()
            .map_or(self.path.as_str(), |entry| entry.url())
    }

    pub fn entry(&self) -> Option<&Arc<RouteEntry>> {
        self.entry.as_ref()
    }

    pub fn controller_name(&self) -> Option<&str> {
        self.entry.as_ref().map(|entry| entry.controller_name())
    }

    pub fn action_name(&self) -> Option<&str> {
        self.entry.as_ref().map(|entry| entry.action_name())
    }

    pub fn accepts(&self) -> &[MediaType] {
        match &self.entry {
            Some(entry) => entry.accepts(),
            None => &[],
        }
    }

    pub fn produces(&self) -> &[MediaType] {
        match &self.entry {
            Some(entry) => entry.produces(),
            None => &[],
        }
    }

    /// Path captures, still percent-encoded
    pub fn path_parameters_encoded(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Bind every parameter, validate, and run the action.
    ///
    /// Unbound routes answer with their status and an empty body. Binding
    /// errors are returned to the caller; validation failures become a 400
    /// response listing the violations.
    pub fn invoke(&self, ctx: &mut Context) -> Result<HttpResponse> {
        let (Some(entry), Some(services)) = (&self.entry, &self.services) else {
            return Ok(HttpResponse::new(self.status));
        };

        ctx.attach_route(self.clone());
        let ctx: &Context = ctx;

        let arguments = entry
            .parameters()
            .iter()
            .map(|parameter| Bindings::create(parameter, ctx, services.engine.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if entry.must_validate() {
            if let Some(validator) = &services.validator {
                let violations = validator.validate(entry, &arguments);
                if !violations.is_empty() {
                    tracing::debug!(
                        action = entry.action_name(),
                        violations = violations.len(),
                        "parameter validation failed"
                    );
                    return HttpResponse::bad_request().with_json(&violations);
                }
            }
        }

        let mut response = entry.call(ctx, arguments)?;
        decorate_response(entry, &mut response, ctx.request(), &services.config);
        Ok(response)
    }
}

fn decorate_response(
    entry: &RouteEntry,
    response: &mut HttpResponse,
    request: &Request,
    config: &RouterConfig,
) {
    if config.emit_vary_header && !response.has_header("Vary") {
        let mut vary = Vec::new();
        if !entry.accepts().is_empty() {
            vary.push("Content-Type");
        }
        if !entry.produces().is_empty() {
            vary.push("Accept");
        }
        if !vary.is_empty() {
            response
                .headers
                .insert("Vary".to_string(), vary.join(", "));
        }
    }

    if config.set_produced_content_type && !response.has_header("Content-Type") {
        if let Some(media_type) = produced_content_type(entry.produces(), request) {
            response
                .headers
                .insert("Content-Type".to_string(), media_type.mime_type());
        }
    }
}

/// The response type among concrete produced types: the only one, or the
/// one the client prefers by quality value.
fn produced_content_type(produces: &[MediaType], request: &Request) -> Option<MediaType> {
    let concrete: Vec<MediaType> = produces
        .iter()
        .filter(|mt| !mt.is_wildcard())
        .cloned()
        .collect();
    match concrete.len() {
        0 => None,
        1 => concrete.into_iter().next(),
        _ => {
            let preferred = request
                .accept()
                .and_then(|accept| negotiate_media_type(&accept, &concrete).cloned());
            preferred.or_else(|| concrete.into_iter().next())
        }
    }
}
