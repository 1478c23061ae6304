//! Runtime synthesis of named error types.
//!
//! A [`Registry`] declares error types from a name, a [`PropertyConfig`] and
//! an optional base type. Each declared [`ErrorType`] constructs
//! [`ErrorInstance`]s from positional arguments, renders `{{token}}` message
//! templates from the instance's `messageData`, and records a cleaned stack
//! trace at construction.

mod config;
mod descriptor;
pub mod error;
mod instance;
pub mod message;
mod property;
mod registry;
pub mod stack;
mod value;

pub use crate::config::{PropertyConfig, PropertyValue};
pub use crate::descriptor::{ErrorType, NATIVE_NAME};
pub use crate::instance::ErrorInstance;
pub use crate::property::{AccessorSpec, Attributes, Getter, PropertyDescriptor, Setter};
pub use crate::registry::Registry;
pub use crate::stack::{BacktraceCapture, FixedCapture, StackCapture};
pub use crate::value::{Arg, Map, Value};
