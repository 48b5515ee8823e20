//! Action parameter descriptors and bound values.

use crate::bean::BeanDescriptor;
use crate::context::Context;
use crate::cookies::{Cookie, FlashCookie, SessionCookie};
use crate::http::Request;
use crate::route::Route;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Where a parameter value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Path parameters only
    Path,
    /// Query parameters only
    Query,
    /// Path parameters, then query parameters
    Parameter,
    /// Url-encoded form fields
    Form,
    /// Whole request objects, cookies, the data map, or headers
    Http,
    /// The request body, parsed according to its content type
    Body,
    /// A bean assembled from other parameters
    Bean,
    /// A named cookie
    Cookie,
}

impl Source {
    /// Sources that look values up by name.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            Source::Path | Source::Query | Source::Parameter | Source::Form | Source::Cookie
        )
    }
}

/// Element types that can be converted from strings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    Float,
    Double,
    Bool,
    Char,
    /// A type handled by a named custom converter
    Custom(Cow<'static, str>),
}

impl ScalarType {
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        ScalarType::Custom(name.into())
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::String => f.write_str("string"),
            ScalarType::Int => f.write_str("int"),
            ScalarType::Long => f.write_str("long"),
            ScalarType::Float => f.write_str("float"),
            ScalarType::Double => f.write_str("double"),
            ScalarType::Bool => f.write_str("bool"),
            ScalarType::Char => f.write_str("char"),
            ScalarType::Custom(name) => f.write_str(name),
        }
    }
}

/// The declared type of an action parameter
#[derive(Clone)]
pub enum ParamType {
    /// Optional scalar, `Null` when absent
    Scalar(ScalarType),
    /// Scalar that falls back to its zero value when absent
    Primitive(ScalarType),
    Array(ScalarType),
    List(ScalarType),
    Context,
    Request,
    Route,
    Session,
    Flash,
    /// The raw body
    Reader,
    Cookie,
    /// A parsed JSON body
    Json,
    /// The body bytes
    Bytes,
    Bean(Arc<BeanDescriptor>),
}

impl ParamType {
    /// Element type of arrays and lists
    pub fn element_type(&self) -> Option<&ScalarType> {
        match self {
            ParamType::Array(elem) | ParamType::List(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, ParamType::Array(_) | ParamType::List(_))
    }

    /// Whole-object types resolved from the context without a name.
    pub fn is_context_object(&self) -> bool {
        matches!(
            self,
            ParamType::Context
                | ParamType::Request
                | ParamType::Route
                | ParamType::Session
                | ParamType::Flash
                | ParamType::Reader
        )
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Scalar(t) => write!(f, "Scalar({})", t),
            ParamType::Primitive(t) => write!(f, "Primitive({})", t),
            ParamType::Array(t) => write!(f, "Array({})", t),
            ParamType::List(t) => write!(f, "List({})", t),
            ParamType::Context => f.write_str("Context"),
            ParamType::Request => f.write_str("Request"),
            ParamType::Route => f.write_str("Route"),
            ParamType::Session => f.write_str("Session"),
            ParamType::Flash => f.write_str("Flash"),
            ParamType::Reader => f.write_str("Reader"),
            ParamType::Cookie => f.write_str("Cookie"),
            ParamType::Json => f.write_str("Json"),
            ParamType::Bytes => f.write_str("Bytes"),
            ParamType::Bean(descriptor) => write!(f, "Bean({})", descriptor.type_name()),
        }
    }
}

/// An opaque validation marker read by the validator, e.g. `not_null` or `min=3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint(pub Cow<'static, str>);

impl Constraint {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Describes one argument of an action.
#[derive(Debug, Clone)]
pub struct ActionParameter {
    name: Option<String>,
    source: Source,
    raw_type: ParamType,
    default_value: Option<String>,
    constraints: Vec<Constraint>,
}

impl ActionParameter {
    pub fn new(name: Option<&str>, source: Source, raw_type: ParamType) -> Self {
        Self {
            name: name.map(str::to_string),
            source,
            raw_type,
            default_value: None,
            constraints: Vec::new(),
        }
    }

    pub fn path(name: &str, raw_type: ParamType) -> Self {
        Self::new(Some(name), Source::Path, raw_type)
    }

    pub fn query(name: &str, raw_type: ParamType) -> Self {
        Self::new(Some(name), Source::Query, raw_type)
    }

    /// Path parameter, falling back to the query string
    pub fn parameter(name: &str, raw_type: ParamType) -> Self {
        Self::new(Some(name), Source::Parameter, raw_type)
    }

    pub fn form(name: &str, raw_type: ParamType) -> Self {
        Self::new(Some(name), Source::Form, raw_type)
    }

    /// Named HTTP parameter: a cookie, a data map entry, or a header
    pub fn http(name: &str, raw_type: ParamType) -> Self {
        Self::new(Some(name), Source::Http, raw_type)
    }

    /// Unnamed HTTP parameter injecting a whole object such as the context
    pub fn http_object(raw_type: ParamType) -> Self {
        Self::new(None, Source::Http, raw_type)
    }

    pub fn cookie(name: &str, raw_type: ParamType) -> Self {
        Self::new(Some(name), Source::Cookie, raw_type)
    }

    pub fn body(raw_type: ParamType) -> Self {
        Self::new(None, Source::Body, raw_type)
    }

    pub fn bean(descriptor: Arc<BeanDescriptor>) -> Self {
        Self::new(None, Source::Bean, ParamType::Bean(descriptor))
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn raw_type(&self) -> &ParamType {
        &self.raw_type
    }

    pub fn generic_element_type(&self) -> Option<&ScalarType> {
        self.raw_type.element_type()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether binding must fail when no name was given.
    pub fn requires_name(&self) -> bool {
        match self.source {
            Source::Http => !self.raw_type.is_context_object(),
            source => source.is_named(),
        }
    }
}

/// A bound argument.
///
/// Whole-object values borrow from the [`Context`] the route was invoked
/// with, so they live exactly as long as the request.
#[derive(Clone, Default)]
pub enum Value<'a> {
    #[default]
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    List(Vec<Value<'a>>),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    /// Output of a custom converter
    Custom(Arc<dyn Any + Send + Sync>),
    Bean(Arc<dyn Any + Send + Sync>),
    Context(&'a Context),
    Request(&'a Request),
    Route(&'a Route),
    Session(&'a SessionCookie),
    Flash(&'a FlashCookie),
    Cookie(&'a Cookie),
    Reader(&'a [u8]),
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    pub fn as_cookie(&self) -> Option<&'a Cookie> {
        match self {
            Value::Cookie(cookie) => Some(cookie),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&'a Context> {
        match self {
            Value::Context(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&'a Request> {
        match self {
            Value::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_route(&self) -> Option<&'a Route> {
        match self {
            Value::Route(route) => Some(route),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            Value::Reader(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow a bean of type `T`
    pub fn bean<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Bean(bean) => bean.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Take a bean of type `T` out of the value. Returns `None` if the
    /// bean has another type or is still shared.
    pub fn into_bean<T: Any + Send + Sync>(self) -> Option<T> {
        match self {
            Value::Bean(bean) => bean
                .downcast::<T>()
                .ok()
                .and_then(|bean| Arc::try_unwrap(bean).ok()),
            _ => None,
        }
    }

    /// Borrow the output of a custom converter
    pub fn custom<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Whether this value already has the shape of `target`.
    ///
    /// Used for values placed in the request data map, which are only
    /// injected when their type matches exactly.
    pub fn conforms_to(&self, target: &ParamType) -> bool {
        match target {
            ParamType::Scalar(scalar) | ParamType::Primitive(scalar) => {
                self.conforms_to_scalar(scalar)
            }
            ParamType::Array(elem) | ParamType::List(elem) => match self {
                Value::List(items) => items.iter().all(|item| item.conforms_to_scalar(elem)),
                _ => false,
            },
            ParamType::Json => matches!(self, Value::Json(_)),
            ParamType::Bytes => matches!(self, Value::Bytes(_)),
            ParamType::Bean(_) => matches!(self, Value::Bean(_)),
            _ => false,
        }
    }

    fn conforms_to_scalar(&self, scalar: &ScalarType) -> bool {
        matches!(
            (self, scalar),
            (Value::Str(_), ScalarType::String)
                | (Value::Int(_), ScalarType::Int | ScalarType::Long)
                | (Value::Float(_), ScalarType::Float | ScalarType::Double)
                | (Value::Bool(_), ScalarType::Bool)
                | (Value::Char(_), ScalarType::Char)
                | (Value::Custom(_), ScalarType::Custom(_))
        )
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Json(json) => f.debug_tuple("Json").field(json).finish(),
            Value::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Value::Custom(_) => f.write_str("Custom(..)"),
            Value::Bean(_) => f.write_str("Bean(..)"),
            Value::Context(_) => f.write_str("Context(..)"),
            Value::Request(request) => write!(f, "Request({} {})", request.method, request.path),
            Value::Route(route) => write!(f, "Route({})", route.path()),
            Value::Session(_) => f.write_str("Session(..)"),
            Value::Flash(_) => f.write_str("Flash(..)"),
            Value::Cookie(cookie) => f.debug_tuple("Cookie").field(&cookie.name).finish(),
            Value::Reader(bytes) => write!(f, "Reader({} bytes)", bytes.len()),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Reader(a), Value::Reader(b)) => a == b,
            (Value::Cookie(a), Value::Cookie(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) | (Value::Bean(a), Value::Bean(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Value::Context(a), Value::Context(b)) => std::ptr::eq(*a, *b),
            (Value::Request(a), Value::Request(b)) => std::ptr::eq(*a, *b),
            (Value::Route(a), Value::Route(b)) => std::ptr::eq(*a, *b),
            (Value::Session(a), Value::Session(b)) => std::ptr::eq(*a, *b),
            (Value::Flash(a), Value::Flash(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl From<&str> for Value<'_> {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value<'_> {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(value: Vec<Value<'a>>) -> Self {
        Value::List(value)
    }
}

impl From<serde_json::Value> for Value<'_> {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}
