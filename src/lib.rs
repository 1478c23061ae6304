//! Named, templated error types declared at runtime.
//!
//! This crate holds the process-wide default [`Registry`]. Libraries that
//! need isolation (tests in particular) can create their own registry with
//! [`Registry::with_capture`] instead.
//!
//! ```
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let ty = errgen::create_error_type("io.ReadError", ["message", "path"], None).unwrap();
//! let err = ty.construct([json!("cannot read {{path}}"), json!("/etc/hosts")]);
//! assert_eq!(err.name(), "ReadError");
//! assert_eq!(err.get("path"), Some(json!("/etc/hosts")));
//! assert!(Arc::ptr_eq(&ty, &errgen::registry().get("io.ReadError").unwrap()));
//! ```

pub use errgen_config::{Config, TypeDecl};
pub use errgen_factory::error::{Error, ErrorKind, Result};
pub use errgen_factory::{
    AccessorSpec, Arg, Attributes, BacktraceCapture, ErrorInstance, ErrorType, FixedCapture, NATIVE_NAME,
    PropertyConfig, PropertyDescriptor, PropertyValue, Registry, StackCapture, Value,
};
pub use errgen_ident as ident;
use std::sync::{Arc, LazyLock};

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide default registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Declares an error type in the default registry.
///
/// See [`Registry::create_error_type`].
pub fn create_error_type(
    name: &str,
    config: impl Into<PropertyConfig>,
    base: Option<&Arc<ErrorType>>,
) -> Result<Arc<ErrorType>> {
    REGISTRY.create_error_type(name, config, base)
}

/// Whether message changes rewrite the stack of errors from the default registry.
pub fn auto_update_stack() -> bool {
    REGISTRY.auto_update_stack()
}

pub fn set_auto_update_stack(enabled: bool) {
    REGISTRY.set_auto_update_stack(enabled);
}

/// Applies a loaded [`Config`] to the default registry, returning the
/// declared catalog types in order.
pub fn configure(config: &Config) -> Result<Vec<Arc<ErrorType>>> {
    tracing::debug!(catalog = config.catalog.len(), "Configuring default registry");
    REGISTRY.apply(config)
}
