//! Property descriptors.
//!
//! A [`PropertyDescriptor`] describes one declared property of an error type:
//! its attribute flags, an optional value, optional accessor functions, and
//! whether the property is filled from a positional constructor argument or
//! fixed once on the type.

use crate::error::{ErrorKind, Result};
use crate::instance::ErrorInstance;
use crate::value::Value;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

/// Computes a property value from the instance it is read on.
pub type Getter = Arc<dyn Fn(&ErrorInstance) -> Value + Send + Sync>;
/// Receives a value written to a property.
pub type Setter = Arc<dyn Fn(&mut ErrorInstance, Value) + Send + Sync>;

/// Keys accepted by [`PropertyDescriptor::from_json`].
const DATA_KEYS: [&str; 4] = ["value", "writable", "enumerable", "configurable"];

/// Property definition attributes. Unset flags take a context-dependent
/// default (see [`Attributes::resolve`]).
#[derive(Clone, Default)]
pub struct AccessorSpec {
    pub value: Option<Value>,
    pub get: Option<Getter>,
    pub set: Option<Setter>,
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}
impl AccessorSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_getter(mut self, get: impl Fn(&ErrorInstance) -> Value + Send + Sync + 'static) -> Self {
        self.get = Some(Arc::new(get));
        self
    }

    pub fn with_setter(mut self, set: impl Fn(&mut ErrorInstance, Value) + Send + Sync + 'static) -> Self {
        self.set = Some(Arc::new(set));
        self
    }

    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    /// Returns `true` if the spec defines a getter or a setter.
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }
}
impl Debug for AccessorSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AccessorSpec")
            .field("value", &self.value)
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .field("writable", &self.writable)
            .field("enumerable", &self.enumerable)
            .field("configurable", &self.configurable)
            .finish()
    }
}

/// Resolved property attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}
impl Attributes {
    /// Attributes of a property created by plain assignment.
    pub const ASSIGNED: Self = Self {
        writable: true,
        enumerable: true,
        configurable: true,
    };

    /// Fills unset flags of `spec` with `fallback`.
    ///
    /// Constructor arguments fall back to `true` (they behave like assigned
    /// fields); fixed properties fall back to `false` (they behave like
    /// defined properties).
    pub fn resolve(spec: &AccessorSpec, fallback: bool) -> Self {
        Self {
            writable: spec.writable.unwrap_or(fallback),
            enumerable: spec.enumerable.unwrap_or(fallback),
            configurable: spec.configurable.unwrap_or(fallback),
        }
    }
}

/// A declared property: attribute spec plus constructor-argument flag.
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    spec: AccessorSpec,
    constructor_argument: bool,
}
impl PropertyDescriptor {
    /// A property filled from a constructor argument.
    pub fn new(spec: AccessorSpec) -> Self {
        Self {
            spec,
            constructor_argument: true,
        }
    }

    /// A property fixed once on the type, not a constructor argument.
    pub fn fixed(spec: AccessorSpec) -> Self {
        Self {
            spec,
            constructor_argument: false,
        }
    }

    pub fn with_constructor_argument(mut self, constructor_argument: bool) -> Self {
        self.constructor_argument = constructor_argument;
        self
    }

    /// Builds a descriptor from a JSON object such as
    /// `{"value": "x", "writable": false}`.
    ///
    /// Only plain data descriptors can be expressed this way. Anything other
    /// than an object with known keys (and booleans for the flags) is rejected
    /// with [`ErrorKind::InvalidArgument`].
    ///
    /// ```
    /// use errgen_factory::PropertyDescriptor;
    /// use serde_json::json;
    ///
    /// assert!(PropertyDescriptor::from_json(&json!({"value": 1, "writable": false}), true).is_ok());
    /// assert!(PropertyDescriptor::from_json(&json!({}), true).is_ok());
    /// assert!(PropertyDescriptor::from_json(&json!("abc"), true).is_err());
    /// assert!(PropertyDescriptor::from_json(&json!([]), true).is_err());
    /// assert!(PropertyDescriptor::from_json(&json!({"writable": "no"}), true).is_err());
    /// ```
    pub fn from_json(description: &Value, constructor_argument: bool) -> Result<Self> {
        let Value::Object(map) = description else {
            exn::bail!(ErrorKind::InvalidArgument(format!("property description must be an object, found {description}")));
        };
        let mut spec = AccessorSpec::new();
        for (key, value) in map {
            let flag = match (key.as_str(), value) {
                ("value", value) => {
                    spec.value = Some(value.clone());
                    continue;
                },
                (_, Value::Bool(flag)) if DATA_KEYS.contains(&key.as_str()) => *flag,
                (_, value) if DATA_KEYS.contains(&key.as_str()) => {
                    exn::bail!(ErrorKind::InvalidArgument(format!("property attribute `{key}` must be a boolean, found {value}")))
                },
                _ => exn::bail!(ErrorKind::InvalidArgument(format!("unknown property attribute `{key}`"))),
            };
            match key.as_str() {
                "writable" => spec.writable = Some(flag),
                "enumerable" => spec.enumerable = Some(flag),
                _ => spec.configurable = Some(flag),
            }
        }
        Ok(Self { spec, constructor_argument })
    }

    pub fn spec(&self) -> &AccessorSpec {
        &self.spec
    }

    pub fn is_constructor_argument(&self) -> bool {
        self.constructor_argument
    }

    /// Separates the argument default from the rest of the spec.
    ///
    /// For constructor arguments the spec's `value` becomes the per-instance
    /// default and is not kept in the stored spec. Fixed properties keep it.
    pub(crate) fn split_default(self) -> (Option<Value>, AccessorSpec) {
        let mut spec = self.spec;
        match self.constructor_argument {
            true => (spec.value.take(), spec),
            false => (None, spec),
        }
    }
}

/// A property defined once on a type and shared by all of its instances.
#[derive(Clone, Debug)]
pub(crate) struct FixedProperty {
    spec: AccessorSpec,
    attributes: Attributes,
}
impl FixedProperty {
    pub(crate) fn new(spec: AccessorSpec) -> Self {
        let attributes = Attributes::resolve(&spec, false);
        Self { spec, attributes }
    }

    pub(crate) fn attributes(&self) -> Attributes {
        self.attributes
    }

    pub(crate) fn setter(&self) -> Option<&Setter> {
        self.spec.set.as_ref()
    }

    /// Returns `true` if a plain write may shadow this property on an instance.
    pub(crate) fn accepts_shadowing(&self) -> bool {
        !self.spec.is_accessor() && self.attributes.writable
    }

    /// Reads the property as seen from `instance`.
    pub(crate) fn read(&self, instance: &ErrorInstance) -> Option<Value> {
        match &self.spec.get {
            Some(get) => Some(get(instance)),
            None => self.spec.value.clone(),
        }
    }
}
