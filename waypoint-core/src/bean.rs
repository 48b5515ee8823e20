//! Beans: values assembled from several request parameters.
//!
//! A [`BeanDescriptor`] says how to build a value of some type `T` from the
//! request. Binding prefers the annotated constructor, whose arguments are
//! bound like top-level action parameters. Without one, the default
//! constructor is used. Setters then run for every parameter whose bound
//! value is not null. Nested beans are bound recursively.
//!
//! ```
//! use waypoint_core::{ActionParameter, BeanDescriptor, ParamType, ScalarType};
//!
//! #[derive(Default)]
//! struct Search {
//!     term: Option<String>,
//!     page: i64,
//! }
//!
//! let descriptor = BeanDescriptor::builder::<Search>()
//!     .default_constructor(Search::default)
//!     .setter(
//!         ActionParameter::query("q", ParamType::Scalar(ScalarType::String)),
//!         |bean, value| bean.term = value.as_str().map(str::to_string),
//!     )
//!     .setter(
//!         ActionParameter::query("page", ParamType::Primitive(ScalarType::Int)),
//!         |bean, value| bean.page = value.as_i64().unwrap_or_default(),
//!     )
//!     .build();
//! assert_eq!(descriptor.setters().len(), 2);
//! ```

use crate::bindings::Bindings;
use crate::context::Context;
use crate::converter::ConverterEngine;
use crate::error::{Error, Result};
use crate::parameter::{ActionParameter, Value};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type AnyBean = Box<dyn Any + Send + Sync>;
type ConstructorFn = dyn for<'a> Fn(Vec<Value<'a>>) -> Result<AnyBean> + Send + Sync;
type DefaultFn = dyn Fn() -> AnyBean + Send + Sync;
type SetterFn = dyn for<'a> Fn(&mut (dyn Any + Send + Sync), Value<'a>) + Send + Sync;

struct Constructor {
    parameters: Vec<ActionParameter>,
    build: Box<ConstructorFn>,
}

/// A setter bound from one parameter
pub struct BeanSetter {
    parameter: ActionParameter,
    apply: Box<SetterFn>,
}

impl BeanSetter {
    pub fn parameter(&self) -> &ActionParameter {
        &self.parameter
    }
}

/// How to build a bean of one type
pub struct BeanDescriptor {
    type_name: &'static str,
    constructor: Option<Constructor>,
    default_constructor: Option<Box<DefaultFn>>,
    setters: Vec<BeanSetter>,
}

impl BeanDescriptor {
    pub fn builder<T: Any + Send + Sync>() -> BeanBuilder<T> {
        BeanBuilder {
            descriptor: BeanDescriptor {
                type_name: std::any::type_name::<T>(),
                constructor: None,
                default_constructor: None,
                setters: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn setters(&self) -> &[BeanSetter] {
        &self.setters
    }

    /// Parameters of the annotated constructor, if there is one
    pub fn constructor_parameters(&self) -> Option<&[ActionParameter]> {
        self.constructor.as_ref().map(|c| c.parameters.as_slice())
    }

    /// Instantiate and populate the bean from the request.
    pub fn create<'a>(
        &self,
        ctx: &'a Context,
        engine: &dyn ConverterEngine,
    ) -> Result<Value<'a>> {
        let mut bean = if let Some(constructor) = &self.constructor {
            let arguments = constructor
                .parameters
                .iter()
                .map(|parameter| Bindings::create(parameter, ctx, engine))
                .collect::<Result<Vec<_>>>()?;
            (constructor.build)(arguments)?
        } else if let Some(default_constructor) = &self.default_constructor {
            default_constructor()
        } else {
            return Err(Error::Binding(format!(
                "cannot find a suitable constructor to create an instance of {}",
                self.type_name
            )));
        };

        for setter in &self.setters {
            let value = Bindings::create(&setter.parameter, ctx, engine)?;
            if !value.is_null() {
                (setter.apply)(bean.as_mut(), value);
            }
        }

        Ok(Value::Bean(Arc::from(bean)))
    }
}

impl fmt::Debug for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescriptor")
            .field("type_name", &self.type_name)
            .field("constructor", &self.constructor_parameters())
            .field("default_constructor", &self.default_constructor.is_some())
            .field(
                "setters",
                &self
                    .setters
                    .iter()
                    .map(|s| &s.parameter)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn erase_constructor<F>(build: F) -> Box<ConstructorFn>
where
    F: for<'a> Fn(Vec<Value<'a>>) -> Result<AnyBean> + Send + Sync + 'static,
{
    Box::new(build)
}

fn erase_setter<F>(apply: F) -> Box<SetterFn>
where
    F: for<'a> Fn(&mut (dyn Any + Send + Sync), Value<'a>) + Send + Sync + 'static,
{
    Box::new(apply)
}

/// Typed builder for a [`BeanDescriptor`]
pub struct BeanBuilder<T> {
    descriptor: BeanDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> BeanBuilder<T> {
    /// A constructor whose arguments are all bound from the request.
    /// Takes priority over the default constructor.
    pub fn constructor<F>(mut self, parameters: Vec<ActionParameter>, build: F) -> Self
    where
        F: for<'a> Fn(Vec<Value<'a>>) -> Result<T> + Send + Sync + 'static,
    {
        self.descriptor.constructor = Some(Constructor {
            parameters,
            build: erase_constructor(move |arguments| {
                build(arguments).map(|bean| Box::new(bean) as AnyBean)
            }),
        });
        self
    }

    pub fn default_constructor<F>(mut self, build: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor.default_constructor = Some(Box::new(move || Box::new(build()) as AnyBean));
        self
    }

    /// A setter invoked with the bound value of `parameter` when it is not null.
    pub fn setter<F>(mut self, parameter: ActionParameter, apply: F) -> Self
    where
        F: for<'a> Fn(&mut T, Value<'a>) + Send + Sync + 'static,
    {
        self.descriptor.setters.push(BeanSetter {
            parameter,
            apply: erase_setter(move |bean, value| {
                if let Some(bean) = bean.downcast_mut::<T>() {
                    apply(bean, value);
                }
            }),
        });
        self
    }

    pub fn build(self) -> Arc<BeanDescriptor> {
        Arc::new(self.descriptor)
    }
}
