// Per-request context handed to binders and actions

use crate::content_negotiation::MediaType;
use crate::cookies::{Cookie, FlashCookie, SessionCookie};
use crate::http::Request;
use crate::parameter::Value;
use crate::route::Route;
use std::collections::HashMap;

/// Everything an action can read about the request it is serving.
///
/// A context is created per request and never shared between requests. The
/// route is attached by [`Route::invoke`] before any parameter is bound, which
/// is what makes path parameters available.
#[derive(Debug, Clone, Default)]
pub struct Context {
    request: Request,
    route: Option<Route>,
    form: Vec<(String, String)>,
    session: SessionCookie,
    flash: FlashCookie,
}

impl Context {
    pub fn new(request: Request) -> Self {
        let form = parse_form(&request);
        Self {
            request,
            form,
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session: SessionCookie) -> Self {
        self.session = session;
        self
    }

    pub fn with_flash(mut self, flash: FlashCookie) -> Self {
        self.flash = flash;
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn attach_route(&mut self, route: Route) {
        self.route = Some(route);
    }

    /// Path parameter as captured, still percent-encoded.
    pub fn parameter_from_path_encoded(&self, name: &str) -> Option<&str> {
        self.route
            .as_ref()?
            .path_parameters_encoded()
            .get(name)
            .map(String::as_str)
    }

    /// Path parameter, percent-decoded. Undecodable values are returned as captured.
    pub fn parameter_from_path(&self, name: &str) -> Option<String> {
        self.parameter_from_path_encoded(name)
            .map(|raw| match urlencoding::decode(raw) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => raw.to_string(),
            })
    }

    /// First query value
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.request.parameter(name)
    }

    /// All query values
    pub fn parameter_values(&self, name: &str) -> Vec<String> {
        self.request.parameter_values(name)
    }

    pub fn form(&self) -> &[(String, String)] {
        &self.form
    }

    pub fn form_values(&self, name: &str) -> Vec<String> {
        self.form
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn headers(&self, name: &str) -> Vec<&str> {
        self.request.headers(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.request.cookie(name)
    }

    pub fn data(&self) -> &HashMap<String, Value<'static>> {
        &self.request.data
    }

    pub fn session(&self) -> &SessionCookie {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionCookie {
        &mut self.session
    }

    pub fn flash(&self) -> &FlashCookie {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut FlashCookie {
        &mut self.flash
    }

    /// Raw request body
    pub fn reader(&self) -> &[u8] {
        &self.request.body
    }

    pub fn content_type(&self) -> Option<String> {
        self.request.content_type()
    }
}

fn parse_form(request: &Request) -> Vec<(String, String)> {
    let is_form = request
        .content_type()
        .and_then(|ct| MediaType::parse(&ct))
        .is_some_and(|mt| mt.same_mime_type(&MediaType::form_urlencoded()));
    if !is_form || request.body.is_empty() {
        return Vec::new();
    }
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(&request.body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "failed to parse form body");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    #[test]
    fn test_form_parsed_for_urlencoded_body() {
        let request = Request::new(HttpMethod::POST, "/submit")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("tag=a&tag=b&name=x+y");
        let ctx = Context::new(request);
        assert_eq!(ctx.form_values("tag"), vec!["a", "b"]);
        assert_eq!(ctx.form_values("name"), vec!["x y"]);
        assert!(ctx.form_values("missing").is_empty());
    }

    #[test]
    fn test_form_ignored_for_other_content_types() {
        let request = Request::new(HttpMethod::POST, "/submit")
            .with_header("Content-Type", "application/json")
            .with_body("tag=a");
        let ctx = Context::new(request);
        assert!(ctx.form().is_empty());
        assert_eq!(ctx.reader(), b"tag=a");
    }

    #[test]
    fn test_path_parameters_require_route() {
        let ctx = Context::new(Request::new(HttpMethod::GET, "/foo/1"));
        assert!(ctx.route().is_none());
        assert!(ctx.parameter_from_path("id").is_none());
    }
}
