//! Parameter binding.
//!
//! [`Bindings::create`] turns one [`ActionParameter`] into a [`Value`] by
//! reading the source the parameter names and converting what it finds.
//! Absent values are not errors: they bind to `Null`, an empty list, or a
//! primitive's zero value. A named source declared without a name is a
//! programming error and fails immediately.

use crate::context::Context;
use crate::converter::{ConverterEngine, zero_value};
use crate::error::{Error, Result};
use crate::parameter::{ActionParameter, ParamType, Source, Value};

/// Entry point of parameter binding
pub struct Bindings;

impl Bindings {
    /// Bind `parameter` from the request held by `ctx`.
    pub fn create<'a>(
        parameter: &ActionParameter,
        ctx: &'a Context,
        engine: &dyn ConverterEngine,
    ) -> Result<Value<'a>> {
        let name = match parameter.name() {
            Some(name) if !name.is_empty() => name,
            _ if parameter.requires_name() => {
                return Err(Error::IllegalArgument(format!(
                    "a {:?} parameter of type {:?} must declare a name",
                    parameter.source(),
                    parameter.raw_type()
                )));
            }
            _ => "",
        };
        let target = parameter.raw_type();
        let default = parameter.default_value();

        let value = match parameter.source() {
            Source::Path => {
                let values: Vec<String> = ctx.parameter_from_path(name).into_iter().collect();
                engine.convert_values(&values, target, default)?
            }
            Source::Query => engine.convert_values(&ctx.parameter_values(name), target, default)?,
            Source::Parameter => {
                let values = match ctx.parameter_from_path(name) {
                    Some(value) => vec![value],
                    None => ctx.parameter_values(name),
                };
                engine.convert_values(&values, target, default)?
            }
            Source::Form => engine.convert_values(&ctx.form_values(name), target, default)?,
            Source::Cookie => match target {
                ParamType::Cookie => ctx.cookie(name).map_or(Value::Null, Value::Cookie),
                _ => engine.convert_value(
                    ctx.cookie(name).map(|cookie| cookie.value.as_str()),
                    target,
                    default,
                )?,
            },
            Source::Http => Self::from_http(name, target, default, ctx, engine)?,
            Source::Body => engine.parse_body(ctx, target)?,
            Source::Bean => match target {
                ParamType::Bean(descriptor) => descriptor.create(ctx, engine)?,
                other => {
                    return Err(Error::Binding(format!(
                        "a bean parameter cannot be bound to {:?}",
                        other
                    )));
                }
            },
        };

        tracing::trace!(
            source = ?parameter.source(),
            name,
            value = ?value,
            "bound action parameter"
        );
        Ok(value)
    }

    fn from_http<'a>(
        name: &str,
        target: &ParamType,
        default: Option<&str>,
        ctx: &'a Context,
        engine: &dyn ConverterEngine,
    ) -> Result<Value<'a>> {
        match target {
            ParamType::Context => Ok(Value::Context(ctx)),
            ParamType::Request => Ok(Value::Request(ctx.request())),
            ParamType::Route => Ok(ctx.route().map_or(Value::Null, Value::Route)),
            ParamType::Session => Ok(Value::Session(ctx.session())),
            ParamType::Flash => Ok(Value::Flash(ctx.flash())),
            ParamType::Reader => Ok(Value::Reader(ctx.reader())),
            ParamType::Cookie => Ok(ctx.cookie(name).map_or(Value::Null, Value::Cookie)),
            target => {
                if let Some(value) = ctx.data().get(name) {
                    if value.conforms_to(target) {
                        return Ok(value.clone());
                    }
                }

                let headers: Vec<String> = ctx
                    .headers(name)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                if headers.is_empty() && default.is_none() {
                    return Ok(match target {
                        ParamType::Array(_) | ParamType::List(_) => Value::List(Vec::new()),
                        ParamType::Primitive(scalar) => zero_value(scalar),
                        _ => Value::Null,
                    });
                }
                Ok(engine.convert_values(&headers, target, default)?)
            }
        }
    }
}
