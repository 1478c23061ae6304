//! Type registry and synthesizer.

use crate::config::{PropertyConfig, PropertyValue};
use crate::descriptor::{Argument, ErrorType, NATIVE_NAME};
use crate::error::{ErrorKind, Result};
use crate::property::{Attributes, FixedProperty, PropertyDescriptor};
use crate::stack::{BacktraceCapture, StackCapture};
use errgen_config::{Config, TypeDecl};
use errgen_ident::Options;
use exn::ResultExt;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::instrument;

/// Names the factory manages itself; they cannot be declared in a mapping.
const RESERVED: [&str; 2] = ["_message", "stack"];
/// Intrinsic instance properties a fixed property would never be visible under.
const INTRINSIC: [&str; 3] = ["message", "name", "canonicalName"];
const IMPLICIT_ARGUMENT: &str = "message";

/// State shared by a registry and every type it creates.
pub(crate) struct Runtime {
    pub(crate) auto_update_stack: AtomicBool,
    pub(crate) capture: Box<dyn StackCapture>,
}
impl Runtime {
    fn new(capture: impl StackCapture + 'static) -> Self {
        Self {
            auto_update_stack: AtomicBool::new(false),
            capture: Box::new(capture),
        }
    }
}
impl Default for Runtime {
    fn default() -> Self {
        Self::new(BacktraceCapture)
    }
}

/// Declared error types, keyed by canonical name.
///
/// Entries are only ever added. Declaring a name twice hands back the type
/// registered first, whatever configuration the second call passes.
pub struct Registry {
    types: RwLock<HashMap<String, Arc<ErrorType>>>,
    runtime: Arc<Runtime>,
}

impl Registry {
    /// An empty registry capturing stacks with [`BacktraceCapture`].
    pub fn new() -> Self {
        Self::with_capture(BacktraceCapture)
    }

    /// An empty registry using `capture` for every stack it records.
    pub fn with_capture(capture: impl StackCapture + 'static) -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            runtime: Arc::new(Runtime::new(capture)),
        }
    }

    /// Whether assigning a message also rewrites the first line of the stack.
    pub fn auto_update_stack(&self) -> bool {
        self.runtime.auto_update_stack.load(Ordering::Relaxed)
    }

    pub fn set_auto_update_stack(&self, enabled: bool) {
        self.runtime.auto_update_stack.store(enabled, Ordering::Relaxed);
    }

    pub fn get(&self, canonical_name: &str) -> Option<Arc<ErrorType>> {
        self.read().get(canonical_name).cloned()
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.read().contains_key(canonical_name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered canonical names, sorted.
    pub fn canonical_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Declares an error type, or returns the one already registered under
    /// `name`.
    ///
    /// `name` may be scope-qualified (`http.TimeoutError`); the short name is
    /// the last segment. `base` defaults to the native root and must otherwise
    /// be a type of this registry.
    ///
    /// ```
    /// use errgen_factory::Registry;
    /// use serde_json::json;
    ///
    /// let registry = Registry::new();
    /// let ty = registry.create_error_type("ArgumentError", ["message", "argument"], None).unwrap();
    /// assert_eq!(ty.signature(), "ArgumentError(message, argument)");
    ///
    /// let err = ty.construct([json!("bad input"), json!("id")]);
    /// assert_eq!(err.to_string(), "ArgumentError: bad input");
    /// assert_eq!(err.get("argument"), Some(json!("id")));
    /// ```
    #[instrument(skip_all, fields(name = name))]
    pub fn create_error_type(
        &self,
        name: &str,
        config: impl Into<PropertyConfig>,
        base: Option<&Arc<ErrorType>>,
    ) -> Result<Arc<ErrorType>> {
        if name.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("error type name must not be empty".to_string()));
        }
        errgen_ident::validate(name, Options::SCOPED)
            .or_raise(|| ErrorKind::InvalidArgument(format!("invalid error type name `{name}`")))?;
        if let Some(existing) = self.get(name) {
            tracing::trace!(canonical_name = name, "Error type already registered");
            return Ok(existing);
        }

        let base = self.resolve_base(base)?;
        let declared = Declaration::build(config.into())?;
        let message_writable = declared
            .message_writable
            .unwrap_or_else(|| base.as_ref().is_none_or(|base| base.message_writable()));
        let short_name = name.rsplit_once('.').map_or(name, |(_, short)| short);
        let ty = Arc::new(ErrorType {
            name: short_name.to_string(),
            canonical_name: name.to_string(),
            arguments: declared.arguments,
            fixed: declared.fixed,
            base,
            message_writable,
            runtime: Arc::clone(&self.runtime),
        });

        let (registered, inserted) = self.insert(ty);
        match inserted {
            true => tracing::debug!(
                canonical_name = name,
                signature = %registered.signature(),
                base = registered.base().map(|base| base.canonical_name()),
                "Registered error type"
            ),
            false => tracing::trace!(canonical_name = name, "Error type registered concurrently"),
        }
        Ok(registered)
    }

    /// Registers `ty` unless its canonical name is already taken. Returns the
    /// registered type and whether it is `ty`.
    fn insert(&self, ty: Arc<ErrorType>) -> (Arc<ErrorType>, bool) {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        match types.entry(ty.canonical_name().to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => (Arc::clone(entry.insert(ty)), true),
        }
    }

    /// Applies a loaded configuration: sets the registry-wide flags, then
    /// declares every catalog entry in order.
    #[instrument(skip_all, fields(entries = config.catalog.len()))]
    pub fn apply(&self, config: &Config) -> Result<Vec<Arc<ErrorType>>> {
        self.set_auto_update_stack(config.auto_update_stack);
        config.catalog.iter().map(|decl| self.declare(decl)).collect()
    }

    fn declare(&self, decl: &TypeDecl) -> Result<Arc<ErrorType>> {
        let base = match decl.base.as_deref() {
            None => None,
            Some(base) => match self.get(base) {
                Some(ty) => Some(ty),
                None if base == NATIVE_NAME => Some(Arc::clone(ErrorType::native())),
                None => exn::bail!(ErrorKind::Catalog(format!("`{}` extends unknown type `{base}`", decl.name))),
            },
        };
        let properties =
            PropertyConfig::from_json(decl.properties.clone()).or_raise(|| ErrorKind::Catalog(decl.name.clone()))?;
        self.create_error_type(&decl.name, properties, base.as_ref())
            .or_raise(|| ErrorKind::Catalog(decl.name.clone()))
    }

    /// The native root resolves to "no generated base".
    fn resolve_base(&self, base: Option<&Arc<ErrorType>>) -> Result<Option<Arc<ErrorType>>> {
        match base {
            None => Ok(None),
            Some(base) if base.is_native() => Ok(None),
            Some(base) => match self.get(base.canonical_name()) {
                Some(registered) if Arc::ptr_eq(&registered, base) => Ok(Some(registered)),
                _ => exn::bail!(ErrorKind::InvalidBaseType(base.canonical_name().to_string())),
            },
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ErrorType>>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Registry")
            .field("types", &self.canonical_names())
            .field("auto_update_stack", &self.auto_update_stack())
            .finish()
    }
}

/// Arguments and fixed properties parsed out of a [`PropertyConfig`].
#[derive(Debug, Default)]
struct Declaration {
    arguments: Vec<Argument>,
    fixed: BTreeMap<String, FixedProperty>,
    message_writable: Option<bool>,
}

impl Declaration {
    fn build(config: PropertyConfig) -> Result<Self> {
        let mut declared = Self::default();
        match config {
            PropertyConfig::Absent => {},
            PropertyConfig::Names(names) => {
                for name in names {
                    declared.claim(&name)?;
                    declared.arguments.push(Argument::plain(name));
                }
            },
            PropertyConfig::Map(entries) => {
                for (key, value) in entries {
                    if RESERVED.contains(&key.as_str()) {
                        exn::bail!(ErrorKind::ReservedPropertyName(key));
                    }
                    declared.claim(&key)?;
                    match value {
                        PropertyValue::Undefined => declared.arguments.push(Argument::plain(key)),
                        PropertyValue::Default(default) => declared.arguments.push(Argument::with_default(key, default)),
                        PropertyValue::Descriptor(descriptor) => declared.describe(key, descriptor)?,
                    }
                }
            },
        }
        if declared.arguments.is_empty() {
            declared.arguments.push(Argument::plain(IMPLICIT_ARGUMENT));
        }
        Ok(declared)
    }

    /// Validates a property name and checks it is not declared twice.
    fn claim(&self, key: &str) -> Result<()> {
        errgen_ident::validate(key, Options::BARE)
            .or_raise(|| ErrorKind::InvalidArgument(format!("invalid property name `{key}`")))?;
        if self.arguments.iter().any(|arg| arg.name == key) || self.fixed.contains_key(key) {
            exn::bail!(ErrorKind::InvalidArgument(format!("property `{key}` declared twice")));
        }
        Ok(())
    }

    fn describe(&mut self, key: String, descriptor: PropertyDescriptor) -> Result<()> {
        if !descriptor.is_constructor_argument() {
            if INTRINSIC.contains(&key.as_str()) {
                exn::bail!(ErrorKind::InvalidArgument(format!("`{key}` cannot be a fixed property")));
            }
            let (_, spec) = descriptor.split_default();
            self.fixed.insert(key, FixedProperty::new(spec));
            return Ok(());
        }
        if descriptor.spec().is_accessor() {
            exn::bail!(ErrorKind::InvalidArgument(format!(
                "constructor argument `{key}` cannot have a getter or setter"
            )));
        }
        let (default, spec) = descriptor.split_default();
        let attributes = Attributes::resolve(&spec, true);
        if key == IMPLICIT_ARGUMENT {
            self.message_writable = Some(attributes.writable);
        }
        self.arguments.push(Argument {
            name: key,
            default,
            attributes,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::AccessorSpec;
    use crate::stack::FixedCapture;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::with_capture(FixedCapture::new(["errgen_factory::construct", "app::main"]))
    }

    #[test]
    fn test_implicit_message_argument() {
        let declared = Declaration::build(PropertyConfig::Absent).unwrap();
        assert_eq!(declared.arguments.len(), 1);
        assert_eq!(declared.arguments[0].name, "message");

        let declared =
            Declaration::build(PropertyConfig::map().descriptor("kind", PropertyDescriptor::fixed(AccessorSpec::new())))
                .unwrap();
        assert_eq!(declared.arguments[0].name, "message");
        assert!(declared.fixed.contains_key("kind"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Declaration::build(PropertyConfig::names(["a", "b", "a"])).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(msg) if msg.contains("`a`")));
    }

    #[test]
    fn test_reserved_names_only_in_mapping() {
        let err = Declaration::build(PropertyConfig::map().with("stack", json!(""))).unwrap_err();
        assert_eq!(*err, ErrorKind::ReservedPropertyName("stack".to_string()));
        assert!(Declaration::build(PropertyConfig::names(["_message"])).is_ok());
    }

    #[test]
    fn test_message_descriptor_controls_writability() {
        let declared = Declaration::build(
            PropertyConfig::map().descriptor("message", PropertyDescriptor::new(AccessorSpec::new().with_writable(false))),
        )
        .unwrap();
        assert_eq!(declared.message_writable, Some(false));
        assert_eq!(Declaration::build(PropertyConfig::Absent).unwrap().message_writable, None);
    }

    #[test]
    fn test_accessor_on_constructor_argument_rejected() {
        let config = PropertyConfig::map()
            .descriptor("code", PropertyDescriptor::new(AccessorSpec::new().with_getter(|_| json!(1))));
        assert!(matches!(*Declaration::build(config).unwrap_err(), ErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_fixed_intrinsic_rejected() {
        let config = PropertyConfig::map().descriptor("name", PropertyDescriptor::fixed(AccessorSpec::new()));
        assert!(matches!(*Declaration::build(config).unwrap_err(), ErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = registry();
        let first = registry.create_error_type("CachedError", ["a"], None).unwrap();
        let second = registry.create_error_type("CachedError", ["b", "c"], None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.arguments(), vec!["a"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.canonical_names(), vec!["CachedError".to_string()]);
    }

    #[test]
    fn test_insert_keeps_first_registration() {
        let registry = registry();
        let unregistered = |name: &str| {
            Arc::new(ErrorType {
                name: name.to_string(),
                canonical_name: name.to_string(),
                arguments: vec![Argument::plain("message")],
                fixed: BTreeMap::new(),
                base: None,
                message_writable: true,
                runtime: Arc::clone(&registry.runtime),
            })
        };
        let first = unregistered("RacedError");
        let (registered, inserted) = registry.insert(Arc::clone(&first));
        assert!(inserted);
        assert!(Arc::ptr_eq(&registered, &first));

        let (registered, inserted) = registry.insert(unregistered("RacedError"));
        assert!(!inserted);
        assert!(Arc::ptr_eq(&registered, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_native_base_normalised() {
        let registry = registry();
        let ty = registry.create_error_type("RootError", PropertyConfig::Absent, Some(ErrorType::native())).unwrap();
        assert!(ty.base().is_none());
        assert!(ty.is_subtype_of(ErrorType::native()));
    }

    #[test]
    fn test_message_writability_inherited() {
        let registry = registry();
        let base = registry
            .create_error_type(
                "FrozenError",
                PropertyConfig::map()
                    .descriptor("message", PropertyDescriptor::new(AccessorSpec::new().with_writable(false))),
                None,
            )
            .unwrap();
        let derived = registry.create_error_type("FrozenChildError", ["code"], Some(&base)).unwrap();
        assert!(!derived.message_writable());
    }

    #[test]
    fn test_apply_unknown_base() {
        let registry = registry();
        let config = Config {
            auto_update_stack: true,
            catalog: vec![TypeDecl::new("ChildError").with_base("MissingError")],
        };
        let err = registry.apply(&config).unwrap_err();
        assert!(matches!(*err, ErrorKind::Catalog(_)));
        assert!(registry.auto_update_stack());
        assert!(registry.is_empty());
    }
}
