//! Property configuration accepted by [`Registry::create_error_type`](crate::Registry::create_error_type).

use crate::error::{ErrorKind, Result};
use crate::property::PropertyDescriptor;
use crate::value::Value;

/// What a configured property maps to.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    /// A constructor argument without a default.
    Undefined,
    /// A constructor argument with a default (`null`, `false` and `0` included).
    Default(Value),
    /// A full property description.
    Descriptor(PropertyDescriptor),
}
impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        Self::Default(value)
    }
}
impl From<PropertyDescriptor> for PropertyValue {
    fn from(descriptor: PropertyDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// The declared properties of an error type.
///
/// ```
/// use errgen_factory::{AccessorSpec, PropertyConfig, PropertyDescriptor};
/// use serde_json::json;
///
/// // Ordered names, no defaults.
/// let names: PropertyConfig = ["message", "context"].into();
/// // Ordered mapping with defaults and descriptors.
/// let map = PropertyConfig::map()
///     .undefined("message")
///     .with("status", json!(500))
///     .descriptor("kind", PropertyDescriptor::fixed(AccessorSpec::new().with_value("http")));
/// # let _ = (names, map);
/// ```
#[derive(Clone, Debug, Default)]
pub enum PropertyConfig {
    /// No configuration: the type takes a single `message` argument.
    #[default]
    Absent,
    /// Ordered property names, each a constructor argument without default.
    Names(Vec<String>),
    /// Ordered mapping from property name to default or descriptor.
    Map(Vec<(String, PropertyValue)>),
}
impl PropertyConfig {
    pub fn names(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    /// An empty mapping, to be filled with [`with`](Self::with),
    /// [`undefined`](Self::undefined) and [`descriptor`](Self::descriptor).
    pub fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Adds (or replaces) an entry, keeping the position of a replaced key.
    ///
    /// Turns a non-mapping config into an empty mapping first.
    pub fn with(self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let mut entries = match self {
            Self::Map(entries) => entries,
            _ => Vec::new(),
        };
        let key = key.into();
        let value = value.into();
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
        Self::Map(entries)
    }

    /// Adds a constructor argument without a default.
    pub fn undefined(self, key: impl Into<String>) -> Self {
        self.with(key, PropertyValue::Undefined)
    }

    pub fn descriptor(self, key: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.with(key, PropertyValue::Descriptor(descriptor))
    }

    /// Interprets a JSON value: `null` is absent, an array lists property
    /// names, an object maps property names to defaults.
    ///
    /// JSON cannot express "no default", so every object entry has one.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Absent),
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(name) => names.push(name),
                        other => {
                            exn::bail!(ErrorKind::InvalidArgument(format!("property name must be a string, found {other}")))
                        },
                    }
                }
                Ok(Self::Names(names))
            },
            Value::Object(map) => Ok(Self::Map(map.into_iter().map(|(k, v)| (k, PropertyValue::Default(v))).collect())),
            other => exn::bail!(ErrorKind::InvalidArgument(format!("unsupported property configuration: {other}"))),
        }
    }
}
impl<S: Into<String>, const N: usize> From<[S; N]> for PropertyConfig {
    fn from(names: [S; N]) -> Self {
        Self::names(names)
    }
}
impl From<Vec<String>> for PropertyConfig {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}
impl From<Vec<&str>> for PropertyConfig {
    fn from(names: Vec<&str>) -> Self {
        Self::names(names)
    }
}
impl From<Option<PropertyConfig>> for PropertyConfig {
    fn from(config: Option<PropertyConfig>) -> Self {
        config.unwrap_or_default()
    }
}
