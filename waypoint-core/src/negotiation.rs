//! Narrowing a set of matching routes by media type.
//!
//! Candidates are first filtered by the request's `Accept` header against
//! each route's produced types, then by the request `Content-Type` against
//! each route's accepted types. Exact `Content-Type` matches win over
//! wildcard matches; otherwise registration order decides.

use crate::content_negotiation::MediaType;
use crate::error::Error;
use crate::http::Request;
use crate::route::RouteEntry;
use std::fmt;
use std::sync::Arc;

/// Why no candidate could serve the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationFailure {
    /// No route produces a type the client accepts (406)
    NotAcceptable,
    /// No route accepts the request body type (415)
    UnsupportedMediaType,
}

impl NegotiationFailure {
    pub fn status(&self) -> u16 {
        match self {
            NegotiationFailure::NotAcceptable => 406,
            NegotiationFailure::UnsupportedMediaType => 415,
        }
    }
}

impl fmt::Display for NegotiationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationFailure::NotAcceptable => f.write_str("not acceptable"),
            NegotiationFailure::UnsupportedMediaType => f.write_str("unsupported media type"),
        }
    }
}

impl From<NegotiationFailure> for Error {
    fn from(failure: NegotiationFailure) -> Self {
        match failure {
            NegotiationFailure::NotAcceptable => Error::NotAcceptable(failure.to_string()),
            NegotiationFailure::UnsupportedMediaType => {
                Error::UnsupportedMediaType(failure.to_string())
            }
        }
    }
}

/// Picks the route serving a request among routes matching its method and path.
pub struct ContentNegotiator;

impl ContentNegotiator {
    /// Select the first candidate compatible with the request's media types.
    ///
    /// When every candidate fails the `Accept` check, the failure is 415 if
    /// the `Content-Type` check would fail as well and 406 otherwise.
    pub fn select<'r>(
        candidates: &[&'r Arc<RouteEntry>],
        request: &Request,
    ) -> Result<&'r Arc<RouteEntry>, NegotiationFailure> {
        let accept = request.accept();
        let content_type = request
            .content_type()
            .and_then(|ct| MediaType::parse(&ct));

        let producing: Vec<&'r Arc<RouteEntry>> = candidates
            .iter()
            .copied()
            .filter(|entry| entry.is_compliant_with_accept(accept.as_ref()))
            .collect();

        if producing.is_empty() {
            let accepting = candidates
                .iter()
                .any(|entry| entry.accepts_content_type(content_type.as_ref()) > 0);
            return Err(if accepting {
                NegotiationFailure::NotAcceptable
            } else {
                NegotiationFailure::UnsupportedMediaType
            });
        }

        let full = producing
            .iter()
            .find(|entry| entry.accepts_content_type(content_type.as_ref()) == 2);
        let partial = || {
            producing
                .iter()
                .find(|entry| entry.accepts_content_type(content_type.as_ref()) == 1)
        };

        full.or_else(partial)
            .copied()
            .ok_or(NegotiationFailure::UnsupportedMediaType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerId;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::route::RouteBuilder;

    fn entry(name: &str, builder: RouteBuilder) -> Arc<RouteEntry> {
        let spec = builder.to(name, |_, _| Ok(HttpResponse::ok()));
        Arc::new(RouteEntry::compile(spec, ControllerId::new(1), "c", "", None).unwrap())
    }

    fn post(content_type: &str, accept: Option<&str>) -> Request {
        let request =
            Request::new(HttpMethod::POST, "/").with_header("Content-Type", content_type);
        match accept {
            Some(accept) => request.with_header("Accept", accept),
            None => request,
        }
    }

    #[test]
    fn test_exact_accepts_beat_wildcard() {
        let wildcard = entry("wildcard", RouteBuilder::post("/").accepting(["text/*"]));
        let exact = entry("exact", RouteBuilder::post("/").accepting(["text/plain"]));
        let selected =
            ContentNegotiator::select(&[&wildcard, &exact], &post("text/plain", None)).unwrap();
        assert_eq!(selected.action_name(), "exact");
        let selected =
            ContentNegotiator::select(&[&wildcard, &exact], &post("text/html", None)).unwrap();
        assert_eq!(selected.action_name(), "wildcard");
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let first = entry("first", RouteBuilder::post("/"));
        let second = entry("second", RouteBuilder::post("/"));
        let selected =
            ContentNegotiator::select(&[&first, &second], &post("application/json", None))
                .unwrap();
        assert_eq!(selected.action_name(), "first");
    }

    #[test]
    fn test_unsupported_media_type() {
        let json = entry("json", RouteBuilder::post("/").accepting(["application/json"]));
        let result = ContentNegotiator::select(&[&json], &post("text/plain", None));
        assert_eq!(result.unwrap_err(), NegotiationFailure::UnsupportedMediaType);
    }

    #[test]
    fn test_not_acceptable() {
        let json = entry(
            "json",
            RouteBuilder::post("/")
                .accepting(["application/json"])
                .producing(["application/json"]),
        );
        let result =
            ContentNegotiator::select(&[&json], &post("application/json", Some("text/html")));
        assert_eq!(result.unwrap_err(), NegotiationFailure::NotAcceptable);
        assert_eq!(NegotiationFailure::NotAcceptable.status(), 406);
    }

    #[test]
    fn test_both_filters_failing_reports_415() {
        let json = entry(
            "json",
            RouteBuilder::post("/")
                .accepting(["application/json"])
                .producing(["application/json"]),
        );
        let result = ContentNegotiator::select(&[&json], &post("text/plain", Some("text/html")));
        assert_eq!(result.unwrap_err(), NegotiationFailure::UnsupportedMediaType);
    }

    #[test]
    fn test_failure_converts_to_error() {
        let error: Error = NegotiationFailure::UnsupportedMediaType.into();
        assert_eq!(error.status_code(), 415);
    }
}
