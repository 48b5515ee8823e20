// Error types for the route table

use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Binding error: {0}")]
    Binding(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not Acceptable: {0}")]
    NotAcceptable(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.http_status().as_u16()
    }

    /// Get the [`StatusCode`] for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            Error::RouteNotFound(_) => StatusCode::NOT_FOUND,

            // 4xx Client Errors
            Error::IllegalArgument(_)
            | Error::Binding(_)
            | Error::Conversion(_)
            | Error::Validation(_)
            | Error::Deserialization(_) => StatusCode::BAD_REQUEST,
            Error::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            // 5xx Server Errors
            Error::InvalidRoute(_) | Error::Serialization(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::RouteNotFound("/x".into()).status_code(), 404);
        assert_eq!(Error::IllegalArgument("name".into()).status_code(), 400);
        assert_eq!(Error::Conversion("abc".into()).status_code(), 400);
        assert_eq!(Error::NotAcceptable("xml".into()).status_code(), 406);
        assert_eq!(Error::UnsupportedMediaType("xml".into()).status_code(), 415);
        assert_eq!(Error::InvalidRoute("{".into()).status_code(), 500);
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::Binding("x".into()).is_client_error());
        assert!(!Error::Binding("x".into()).is_server_error());
        assert!(Error::Internal("x".into()).is_server_error());
    }

    #[test]
    fn test_display() {
        let err = Error::UnsupportedMediaType("text/csv".into());
        assert_eq!(err.to_string(), "Unsupported Media Type: text/csv");
    }
}
