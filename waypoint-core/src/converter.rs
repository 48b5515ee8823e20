//! String-to-value conversion used by parameter binding.

use crate::content_negotiation::MediaType;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::parameter::{ParamType, ScalarType, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Converts a string into a value of a custom type.
pub trait ParameterConverter: Send + Sync {
    fn from_string(&self, input: &str) -> std::result::Result<Arc<dyn Any + Send + Sync>, String>;
}

impl<F> ParameterConverter for F
where
    F: Fn(&str) -> std::result::Result<Arc<dyn Any + Send + Sync>, String> + Send + Sync,
{
    fn from_string(&self, input: &str) -> std::result::Result<Arc<dyn Any + Send + Sync>, String> {
        self(input)
    }
}

/// The conversion engine consulted for every scalar, array and body binding.
///
/// Implementors only have to provide [`convert`](ConverterEngine::convert);
/// the multi-value, default and body handling is shared.
pub trait ConverterEngine: Send + Sync {
    /// Convert a single raw string to `target`.
    fn convert(&self, raw: &str, target: &ScalarType) -> Result<Value<'static>>;

    /// Convert an optional single value.
    fn convert_value(
        &self,
        input: Option<&str>,
        target: &ParamType,
        default: Option<&str>,
    ) -> Result<Value<'static>> {
        match input {
            Some(raw) => self.convert_values(&[raw.to_string()], target, default),
            None => self.convert_values(&[], target, default),
        }
    }

    /// Convert submitted values to `target`.
    ///
    /// Scalars use the first value. Arrays and lists convert every value, so
    /// the result has as many elements as `input`. When `input` is empty the
    /// default is used (split on `,` for arrays); without a default the
    /// result is `Null`, the zero value of a primitive, or an empty list.
    fn convert_values(
        &self,
        input: &[String],
        target: &ParamType,
        default: Option<&str>,
    ) -> Result<Value<'static>> {
        match target {
            ParamType::Array(elem) | ParamType::List(elem) => {
                let raw: Vec<String> = match (input.is_empty(), default) {
                    (false, _) => input.to_vec(),
                    (true, Some(default)) => split_default(default),
                    (true, None) => Vec::new(),
                };
                raw.iter()
                    .map(|value| self.convert(value, elem))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::List)
            }
            ParamType::Scalar(scalar) => match input.first().map(String::as_str).or(default) {
                Some(raw) => self.convert(raw, scalar),
                None => Ok(Value::Null),
            },
            ParamType::Primitive(scalar) => match input.first().map(String::as_str).or(default) {
                Some(raw) => self.convert(raw, scalar),
                None => Ok(zero_value(scalar)),
            },
            other => Err(Error::Binding(format!(
                "no converter available for {:?}",
                other
            ))),
        }
    }

    /// Read the request body as `target`.
    fn parse_body(&self, ctx: &Context, target: &ParamType) -> Result<Value<'static>> {
        parse_body(ctx, target)
    }
}

/// The zero value used for absent primitives.
pub fn zero_value(scalar: &ScalarType) -> Value<'static> {
    match scalar {
        ScalarType::Int | ScalarType::Long => Value::Int(0),
        ScalarType::Float | ScalarType::Double => Value::Float(0.0),
        ScalarType::Bool => Value::Bool(false),
        ScalarType::Char => Value::Char('\0'),
        ScalarType::String | ScalarType::Custom(_) => Value::Null,
    }
}

/// Boolean literals, case-insensitive: `true/on/yes/1` and `false/off/no/0`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn split_default(default: &str) -> Vec<String> {
    default
        .split(',')
        .map(|part| part.trim().to_string())
        .collect()
}

/// Built-in engine: standard scalars plus named custom converters.
#[derive(Default, Clone)]
pub struct DefaultConverterEngine {
    converters: HashMap<String, Arc<dyn ParameterConverter>>,
}

impl DefaultConverterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for [`ScalarType::Custom`] values named `name`.
    pub fn with_converter(
        mut self,
        name: impl Into<String>,
        converter: impl ParameterConverter + 'static,
    ) -> Self {
        self.converters.insert(name.into(), Arc::new(converter));
        self
    }

    pub fn has_converter(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }
}

impl fmt::Debug for DefaultConverterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultConverterEngine")
            .field("converters", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ConverterEngine for DefaultConverterEngine {
    fn convert(&self, raw: &str, target: &ScalarType) -> Result<Value<'static>> {
        let invalid = || Error::Conversion(format!("'{}' is not a valid {}", raw, target));
        match target {
            ScalarType::String => Ok(Value::Str(raw.to_string())),
            ScalarType::Int => raw
                .parse::<i32>()
                .map(|v| Value::Int(v.into()))
                .map_err(|_| invalid()),
            ScalarType::Long => raw.parse::<i64>().map(Value::Int).map_err(|_| invalid()),
            ScalarType::Float => raw
                .parse::<f32>()
                .map(|v| Value::Float(v.into()))
                .map_err(|_| invalid()),
            ScalarType::Double => raw.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
            ScalarType::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
            ScalarType::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(invalid()),
                }
            }
            ScalarType::Custom(name) => {
                let converter = self.converters.get(name.as_ref()).ok_or_else(|| {
                    Error::Binding(format!("no converter registered for type '{}'", name))
                })?;
                converter
                    .from_string(raw)
                    .map(Value::Custom)
                    .map_err(Error::Conversion)
            }
        }
    }
}

/// Body parsing shared by every engine: bytes, text, JSON, or a url-encoded
/// form turned into a JSON object.
pub fn parse_body(ctx: &Context, target: &ParamType) -> Result<Value<'static>> {
    match target {
        ParamType::Bytes => Ok(Value::Bytes(ctx.reader().to_vec())),
        ParamType::Scalar(ScalarType::String) => Ok(Value::Str(
            String::from_utf8_lossy(ctx.reader()).into_owned(),
        )),
        ParamType::Json => {
            let media_type = ctx.content_type().and_then(|ct| MediaType::parse(&ct));
            match media_type {
                Some(mt) if mt.same_mime_type(&MediaType::form_urlencoded()) => {
                    Ok(Value::Json(form_to_json(ctx.form())))
                }
                Some(mt) if !mt.is_json() => Err(Error::UnsupportedMediaType(mt.mime_type())),
                _ if ctx.reader().is_empty() => Ok(Value::Null),
                _ => serde_json::from_slice(ctx.reader())
                    .map(Value::Json)
                    .map_err(|e| Error::Deserialization(e.to_string())),
            }
        }
        other => Err(Error::Binding(format!(
            "cannot read the request body as {:?}",
            other
        ))),
    }
}

fn form_to_json(form: &[(String, String)]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (key, value) in form {
        let value = serde_json::Value::String(value.clone());
        match map.get_mut(key) {
            Some(serde_json::Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.clone(), value);
            }
        }
    }
    serde_json::Value::Object(map)
}
