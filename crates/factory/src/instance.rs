//! Error instances.

use crate::descriptor::ErrorType;
use crate::error::{ErrorKind, Result};
use crate::message;
use crate::property::Attributes;
use crate::stack;
use crate::value::{Map, Value, display, message_text};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Raw message storage. Reading `message` renders it.
const RAW_MESSAGE: &str = "_message";
const MESSAGE: &str = "message";
const MESSAGE_DATA: &str = "messageData";
const STACK: &str = "stack";
const NAME: &str = "name";
const CANONICAL_NAME: &str = "canonicalName";

#[derive(Clone, Debug)]
struct Slot {
    value: Value,
    attributes: Attributes,
}

/// An error value produced by a generated [`ErrorType`].
///
/// Besides the declared properties, every instance has
///
/// - `message`: the rendered view of `_message` (see [`message`](crate::message)),
/// - `_message`: the raw, possibly templated, message,
/// - `stack`: the cleaned stack trace captured at construction,
/// - `name` / `canonicalName`: read-only, taken from the type.
#[derive(Clone)]
pub struct ErrorInstance {
    ty: Arc<ErrorType>,
    raw_message: String,
    stack: String,
    properties: BTreeMap<String, Slot>,
}

impl ErrorInstance {
    pub(crate) fn blank(ty: Arc<ErrorType>) -> Self {
        Self {
            ty,
            raw_message: String::new(),
            stack: String::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn error_type(&self) -> &Arc<ErrorType> {
        &self.ty
    }

    pub fn name(&self) -> &str {
        self.ty.name()
    }

    pub fn canonical_name(&self) -> &str {
        self.ty.canonical_name()
    }

    /// Returns `true` if the instance's type is `ty` or derives from it.
    pub fn is_instance_of(&self, ty: &ErrorType) -> bool {
        self.ty.is_subtype_of(ty)
    }

    /// The rendered message.
    pub fn message(&self) -> String {
        message::render(&self.raw_message, self.name(), self.message_data().as_ref())
    }

    /// The raw message, `{{tokens}}` unexpanded.
    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    /// Replaces the raw message without touching the stack.
    pub fn set_raw_message(&mut self, raw: impl Into<String>) {
        self.raw_message = raw.into();
    }

    /// Replaces the raw message.
    ///
    /// When the registry's `auto_update_stack` flag is set, the previously
    /// rendered message is replaced by the new one in the stack's header.
    /// Otherwise the stack keeps showing the message it was captured with.
    pub fn set_message(&mut self, raw: impl Into<String>) -> Result<()> {
        if !self.ty.message_writable() {
            exn::bail!(ErrorKind::ReadOnlyProperty(MESSAGE.to_string()));
        }
        let auto_update = self.ty.runtime.auto_update_stack.load(Ordering::Relaxed);
        let previous = auto_update.then(|| self.message());
        self.raw_message = raw.into();
        if let Some(previous) = previous {
            self.stack = message::restamp(&self.stack, &previous, &self.message());
        }
        Ok(())
    }

    /// The `messageData` object used to fill message tokens, if any.
    pub fn message_data(&self) -> Option<Map<String, Value>> {
        match self.get(MESSAGE_DATA) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn set_stack(&mut self, stack: impl Into<String>) {
        self.stack = stack.into();
    }

    /// Reads a property: intrinsic properties first, then the instance's own
    /// properties, then fixed properties along the type chain.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            MESSAGE => Some(Value::String(self.message())),
            RAW_MESSAGE => Some(Value::String(self.raw_message.clone())),
            STACK => Some(Value::String(self.stack.clone())),
            NAME => Some(Value::String(self.name().to_string())),
            CANONICAL_NAME => Some(Value::String(self.canonical_name().to_string())),
            _ => match self.properties.get(key) {
                Some(slot) => Some(slot.value.clone()),
                None => self.ty.lookup_fixed(key).and_then(|property| property.read(self)),
            },
        }
    }

    /// Returns `true` if `key` resolves to a property.
    pub fn has(&self, key: &str) -> bool {
        matches!(key, MESSAGE | RAW_MESSAGE | STACK | NAME | CANONICAL_NAME)
            || self.properties.contains_key(key)
            || self.ty.lookup_fixed(key).is_some()
    }

    /// Writes a property.
    ///
    /// Fails with [`ErrorKind::ReadOnlyProperty`] for `name`, `canonicalName`,
    /// a read-only `message`, non-writable own properties and non-writable
    /// fixed properties. Writing a fixed accessor calls its setter; any other
    /// write creates or updates an own property.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        match key {
            MESSAGE => return self.set_message(message_text(&value)),
            RAW_MESSAGE => {
                self.raw_message = message_text(&value);
                return Ok(());
            },
            STACK => {
                self.stack = display(&value);
                return Ok(());
            },
            NAME | CANONICAL_NAME => exn::bail!(ErrorKind::ReadOnlyProperty(key.to_string())),
            _ => {},
        }
        if let Some(slot) = self.properties.get_mut(key) {
            if !slot.attributes.writable {
                exn::bail!(ErrorKind::ReadOnlyProperty(key.to_string()));
            }
            slot.value = value;
            return Ok(());
        }
        let ty = Arc::clone(&self.ty);
        if let Some(property) = ty.lookup_fixed(key) {
            if let Some(setter) = property.setter() {
                setter(self, value);
                return Ok(());
            }
            if !property.accepts_shadowing() {
                exn::bail!(ErrorKind::ReadOnlyProperty(key.to_string()));
            }
        }
        self.properties.insert(
            key.to_string(),
            Slot {
                value,
                attributes: Attributes::ASSIGNED,
            },
        );
        Ok(())
    }

    /// Removes an own property, returning its value.
    ///
    /// Fixed properties live on the type and are unaffected. Fails with
    /// [`ErrorKind::NonConfigurableProperty`] for `message`, `name`,
    /// `canonicalName` and own properties declared non-configurable.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            MESSAGE | NAME | CANONICAL_NAME => exn::bail!(ErrorKind::NonConfigurableProperty(key.to_string())),
            RAW_MESSAGE => return Ok(Some(Value::String(std::mem::take(&mut self.raw_message)))),
            STACK => return Ok(Some(Value::String(std::mem::take(&mut self.stack)))),
            _ => {},
        }
        let configurable = match self.properties.get(key) {
            Some(slot) => slot.attributes.configurable,
            None => return Ok(None),
        };
        if !configurable {
            exn::bail!(ErrorKind::NonConfigurableProperty(key.to_string()));
        }
        Ok(self.properties.remove(key).map(|slot| slot.value))
    }

    /// Enumerable property names: `name`, `canonicalName`, `message`, then own
    /// properties, then inherited fixed properties not shadowed by own ones.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = [NAME, CANONICAL_NAME, MESSAGE].iter().map(|k| k.to_string()).collect();
        keys.extend(
            self.properties.iter().filter(|(_, slot)| slot.attributes.enumerable).map(|(key, _)| key.clone()),
        );
        keys.extend(
            self.ty
                .fixed_properties()
                .into_iter()
                .filter(|(key, property)| property.attributes().enumerable && !self.properties.contains_key(*key))
                .map(|(key, _)| key.to_string()),
        );
        keys
    }

    /// Defines a property during construction.
    ///
    /// Unlike [`set`](Self::set) this ignores writability of freshly declared
    /// properties, but never overwrites a property an earlier construction
    /// step made read-only, nor the type's names.
    pub(crate) fn define(&mut self, key: &str, value: Value, attributes: Attributes) {
        match key {
            MESSAGE | RAW_MESSAGE => self.raw_message = message_text(&value),
            STACK => self.stack = display(&value),
            NAME | CANONICAL_NAME => {
                tracing::trace!(error_type = self.canonical_name(), key, "Ignoring assignment to read-only name");
            },
            _ if self.properties.get(key).is_some_and(|slot| !slot.attributes.writable) => {
                tracing::trace!(error_type = self.canonical_name(), key, "Ignoring assignment to read-only property");
            },
            _ => {
                self.properties.insert(key.to_string(), Slot { value, attributes });
            },
        }
    }

    /// Falls back to the type's short name when no message was assigned.
    pub(crate) fn ensure_message(&mut self) {
        if self.raw_message.is_empty() {
            self.raw_message = self.name().to_string();
        }
    }

    /// Captures, assembles and cleans the stack for the current message.
    pub(crate) fn capture_stack(&mut self) {
        let frames = self.ty.runtime.capture.capture();
        self.stack = stack::clean(&stack::assemble(&self.to_string(), &frames));
    }
}

impl Display for ErrorInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.name(), self.message())
    }
}
impl Debug for ErrorInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let properties: BTreeMap<&str, &Value> =
            self.properties.iter().map(|(key, slot)| (key.as_str(), &slot.value)).collect();
        f.debug_struct("ErrorInstance")
            .field("canonical_name", &self.canonical_name())
            .field("message", &self.message())
            .field("properties", &properties)
            .finish()
    }
}
impl std::error::Error for ErrorInstance {}
