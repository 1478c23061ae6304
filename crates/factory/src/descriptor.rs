//! Generated error types.

use crate::instance::ErrorInstance;
use crate::property::{Attributes, FixedProperty};
use crate::registry::Runtime;
use crate::value::{Arg, Value};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::{Arc, LazyLock};

/// Canonical name of the native error root.
pub const NATIVE_NAME: &str = "Error";

static NATIVE: LazyLock<Arc<ErrorType>> = LazyLock::new(|| {
    Arc::new(ErrorType {
        name: NATIVE_NAME.to_string(),
        canonical_name: NATIVE_NAME.to_string(),
        arguments: vec![Argument::plain("message")],
        fixed: BTreeMap::new(),
        base: None,
        message_writable: true,
        runtime: Arc::new(Runtime::default()),
    })
});

/// A declared constructor argument.
#[derive(Clone, Debug)]
pub(crate) struct Argument {
    pub(crate) name: String,
    pub(crate) default: Option<Value>,
    pub(crate) attributes: Attributes,
}
impl Argument {
    pub(crate) fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            attributes: Attributes::ASSIGNED,
        }
    }

    pub(crate) fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::plain(name)
        }
    }
}

/// A generated error type.
///
/// Types are only ever handed out behind an [`Arc`]; two handles refer to the
/// same type exactly when [`Arc::ptr_eq`] says so, which is also what `==`
/// compares.
pub struct ErrorType {
    pub(crate) name: String,
    pub(crate) canonical_name: String,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) fixed: BTreeMap<String, FixedProperty>,
    pub(crate) base: Option<Arc<ErrorType>>,
    pub(crate) message_writable: bool,
    pub(crate) runtime: Arc<Runtime>,
}

impl ErrorType {
    /// The native error root every generated type derives from.
    pub fn native() -> &'static Arc<ErrorType> {
        &NATIVE
    }

    /// Returns `true` for the native error root.
    pub fn is_native(&self) -> bool {
        std::ptr::eq(self, Arc::as_ptr(Self::native()))
    }

    /// Short name: the last dot-separated segment of the canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full, possibly dot-scoped, name the type was declared with.
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    /// Constructor argument names in positional order.
    pub fn arguments(&self) -> Vec<&str> {
        self.arguments.iter().map(|arg| arg.name.as_str()).collect()
    }

    /// Number of positional constructor arguments.
    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Constructor arguments that have a default, with their defaults.
    pub fn defaults(&self) -> BTreeMap<&str, &Value> {
        self.arguments
            .iter()
            .filter_map(|arg| arg.default.as_ref().map(|default| (arg.name.as_str(), default)))
            .collect()
    }

    /// Default value of a constructor argument, if it has one.
    pub fn default_for(&self, argument: &str) -> Option<&Value> {
        self.arguments.iter().find(|arg| arg.name == argument).and_then(|arg| arg.default.as_ref())
    }

    /// The generated base type. `None` means the type derives directly from
    /// the native root.
    pub fn base(&self) -> Option<&Arc<ErrorType>> {
        self.base.as_ref()
    }

    /// Constructor signature, e.g. `ArgumentError(message, argument)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.arguments().join(", "))
    }

    /// Returns `true` if this type is `other` or derives from it.
    pub fn is_subtype_of(&self, other: &ErrorType) -> bool {
        if other.is_native() {
            return true;
        }
        let mut current = Some(self);
        while let Some(ty) = current {
            if std::ptr::eq(ty, other) {
                return true;
            }
            current = ty.base.as_deref();
        }
        false
    }

    /// Whether `message` may be reassigned on instances.
    pub(crate) fn message_writable(&self) -> bool {
        self.message_writable
    }

    /// Finds a fixed property on this type or along its base chain.
    pub(crate) fn lookup_fixed(&self, key: &str) -> Option<&FixedProperty> {
        let mut current = Some(self);
        while let Some(ty) = current {
            if let Some(property) = ty.fixed.get(key) {
                return Some(property);
            }
            current = ty.base.as_deref();
        }
        None
    }

    /// Fixed properties visible on instances, nearest definition first.
    pub(crate) fn fixed_properties(&self) -> Vec<(&str, &FixedProperty)> {
        let mut seen = BTreeMap::new();
        let mut current = Some(self);
        while let Some(ty) = current {
            for (key, property) in &ty.fixed {
                seen.entry(key.as_str()).or_insert(property);
            }
            current = ty.base.as_deref();
        }
        seen.into_iter().collect()
    }

    /// Creates an instance from positional arguments. `None` (or a missing
    /// trailing argument) means "not supplied".
    ///
    /// Never fails: surplus arguments are ignored and missing ones leave
    /// their property unset (or defaulted).
    pub fn construct<I>(self: &Arc<Self>, args: I) -> ErrorInstance
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        let args: Vec<Arg> = args.into_iter().map(Into::into).collect();
        let mut instance = ErrorInstance::blank(Arc::clone(self));
        self.initialize(&mut instance, &args);
        instance
    }

    /// Creates an instance without any arguments.
    pub fn construct_empty(self: &Arc<Self>) -> ErrorInstance {
        self.construct(Vec::<Arg>::new())
    }

    /// The type as a plain callable. Calling it is equivalent to
    /// [`construct`](Self::construct).
    pub fn constructor(self: &Arc<Self>) -> impl Fn(Vec<Arg>) -> ErrorInstance + Send + Sync + 'static {
        let ty = Arc::clone(self);
        move |args: Vec<Arg>| ty.construct(args)
    }

    /// Runs this type's share of construction on `instance`, then hands over
    /// to the base type (or captures the stack at the root).
    fn initialize(&self, instance: &mut ErrorInstance, args: &[Arg]) {
        let effective: Vec<Arg> = self
            .arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| args.get(i).cloned().flatten().or_else(|| arg.default.clone()))
            .collect();
        for (arg, value) in self.arguments.iter().zip(&effective) {
            if let Some(value) = value {
                instance.define(&arg.name, value.clone(), arg.attributes);
            }
        }
        instance.ensure_message();
        match &self.base {
            Some(base) => {
                let forwarded = forward_arguments(&base.arguments, &self.arguments, &effective);
                base.initialize(instance, &forwarded);
            },
            None => instance.capture_stack(),
        }
    }
}

/// Maps this type's effective argument values onto the base type's arguments.
///
/// Base arguments are taken in the base's own order. Those that this type
/// also declares receive this type's value; the rest receive the absent
/// marker so the base applies its own default. Trailing absent markers are
/// dropped, interior ones are kept.
pub(crate) fn forward_arguments(base: &[Argument], own: &[Argument], effective: &[Arg]) -> Vec<Arg> {
    let mut forwarded: Vec<Arg> = base
        .iter()
        .map(|base_arg| {
            own.iter().position(|arg| arg.name == base_arg.name).and_then(|i| effective.get(i).cloned().flatten())
        })
        .collect();
    while matches!(forwarded.last(), Some(None)) {
        forwarded.pop();
    }
    forwarded
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
impl Eq for ErrorType {}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.canonical_name)
    }
}
impl Debug for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ErrorType")
            .field("canonical_name", &self.canonical_name)
            .field("arguments", &self.arguments())
            .field("fixed", &self.fixed.keys().collect::<Vec<_>>())
            .field("base", &self.base.as_ref().map(|base| base.canonical_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(names: &[&str]) -> Vec<Argument> {
        names.iter().map(|name| Argument::plain(*name)).collect()
    }

    #[test]
    fn test_forward_arguments_maps_by_name() {
        let base = args(&["a", "t", "c", "x", "y", "z"]);
        let own = args(&["z", "b", "c", "d"]);
        let effective = vec![Some(json!(1)), Some(json!(2)), Some(json!(3)), Some(json!(4))];
        assert_eq!(
            forward_arguments(&base, &own, &effective),
            vec![None, None, Some(json!(3)), None, None, Some(json!(1))]
        );
    }

    #[test]
    fn test_forward_arguments_truncates_trailing_absent() {
        let base = args(&["message", "a", "b"]);
        let own = args(&["message", "c"]);
        let effective = vec![Some(json!("msg")), Some(json!(true))];
        assert_eq!(forward_arguments(&base, &own, &effective), vec![Some(json!("msg"))]);
        assert_eq!(forward_arguments(&base, &own, &[None, None]), Vec::<Arg>::new());
    }

    #[test]
    fn test_forward_arguments_keeps_interior_absent() {
        let base = args(&["a", "b", "c"]);
        let own = args(&["c"]);
        assert_eq!(forward_arguments(&base, &own, &[Some(json!(null))]), vec![None, None, Some(json!(null))]);
    }

    #[test]
    fn test_native_root() {
        let native = ErrorType::native();
        assert!(native.is_native());
        assert_eq!(native.name(), "Error");
        assert_eq!(native.signature(), "Error(message)");
        assert!(native.is_subtype_of(native));
        assert!(Arc::ptr_eq(native, ErrorType::native()));
    }

    #[test]
    fn test_native_construct() {
        let err = ErrorType::native().construct([json!("boom")]);
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "Error: boom");
        assert!(err.stack().starts_with("Error: boom"));
    }
}
