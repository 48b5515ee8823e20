// Validation hook run between binding and invocation

use crate::parameter::{Constraint, Value};
use crate::route::RouteEntry;
use serde::{Deserialize, Serialize};

/// One failed constraint, reported in the body of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub parameter: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub invalid_value: Option<String>,
}

impl ConstraintViolation {
    pub fn new(parameter: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.map(str::to_string),
            message: message.into(),
            invalid_value: None,
        }
    }

    pub fn with_invalid_value(mut self, value: impl Into<String>) -> Self {
        self.invalid_value = Some(value.into());
        self
    }
}

/// Checks bound arguments against the constraints declared on a route's
/// parameters. `arguments` is index-aligned with `route.parameters()`.
pub trait Validator: Send + Sync {
    fn validate(&self, route: &RouteEntry, arguments: &[Value<'_>]) -> Vec<ConstraintViolation>;
}

impl<F> Validator for F
where
    F: Fn(&RouteEntry, &[Value<'_>]) -> Vec<ConstraintViolation> + Send + Sync,
{
    fn validate(&self, route: &RouteEntry, arguments: &[Value<'_>]) -> Vec<ConstraintViolation> {
        self(route, arguments)
    }
}

impl Constraint {
    /// The value must not be null
    pub fn required() -> Self {
        Constraint::new(RequiredValidator::CONSTRAINT)
    }
}

/// Rejects null values of parameters carrying [`Constraint::required`].
/// Other constraints are left to richer validators.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl RequiredValidator {
    pub const CONSTRAINT: &'static str = "required";
}

impl Validator for RequiredValidator {
    fn validate(&self, route: &RouteEntry, arguments: &[Value<'_>]) -> Vec<ConstraintViolation> {
        route
            .parameters()
            .iter()
            .zip(arguments)
            .filter(|(parameter, value)| {
                value.is_null()
                    && parameter
                        .constraints()
                        .iter()
                        .any(|c| c.name() == Self::CONSTRAINT)
            })
            .map(|(parameter, _)| {
                ConstraintViolation::new(parameter.name(), "must not be null")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_serialization() {
        let violation = ConstraintViolation::new(Some("age"), "must be positive")
            .with_invalid_value("-1");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["parameter"], "age");
        assert_eq!(json["invalid_value"], "-1");

        let json = serde_json::to_value(ConstraintViolation::new(None, "bad")).unwrap();
        assert!(json.get("invalid_value").is_none());
        assert!(json["parameter"].is_null());
    }
}
