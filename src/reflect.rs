//! Type introspection
//!
//! Rust has no runtime reflection, so constructible types are described up
//! front: each [`TypeDescriptor`] says whether the type can be instantiated,
//! how it is constructed (with no arguments, or through a constructor with a
//! declared parameter list) and which methods can be invoked on an instance.
//! The [`TypeCatalog`] maps type names to descriptors.

use crate::factory::Invokable;
use crate::param::{Args, Param};
use crate::provider::{type_key, Injectable, Service};
use crate::{ContainerError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// What sort of type a descriptor names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeKind {
    /// A concrete type that can be constructed
    #[default]
    Concrete,
    /// An abstract base; has methods but no instances of its own
    Abstract,
    /// A pure capability description
    Interface,
}

/// Type-erased no-argument construction primitive
type BareFn = Arc<dyn Fn() -> Service + Send + Sync>;

/// How a concrete type produces an instance
#[derive(Clone)]
pub enum Constructor {
    /// No declared constructor: produce a bare instance
    Bare(BareFn),
    /// A constructor with a declared parameter list
    Declared(Invokable),
}

/// Type-erased method body: receives the instance and resolved arguments
type MethodFn = Arc<dyn Fn(&Service, &Args) -> Result<Service> + Send + Sync>;

/// A method that can be invoked through the container
#[derive(Clone)]
pub struct Method {
    params: Arc<[Param]>,
    func: MethodFn,
}

impl Method {
    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Invoke on `instance` with already-resolved arguments
    #[inline]
    pub fn invoke(&self, instance: &Service, args: &Args) -> Result<Service> {
        (self.func)(instance, args)
    }
}

/// Description of a constructible type.
///
/// # Examples
///
/// ```rust
/// use service_container::{Container, Param, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Cls {
///     bar: String,
/// }
///
/// struct Greeter {
///     text: String,
/// }
///
/// let container = Container::new();
/// container
///     .register_type(TypeDescriptor::new("cls").bare(|| Cls { bar: "foo".into() }))
///     .register_type(TypeDescriptor::new("greeter").constructor(
///         vec![Param::class("cls", "cls"), Param::value("suffix").with_default("c".to_string())],
///         |args| {
///             let cls = args.get::<Cls>(0)?;
///             Ok(Greeter { text: format!("{}-{}", cls.bar, args.value::<String>(1)?) })
///         },
///     ));
///
/// let greeter = container.make_as::<Greeter>("greeter").unwrap();
/// assert_eq!(greeter.text, "foo-c");
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method, RandomState>,
}

impl TypeDescriptor {
    /// Describe a concrete type with no construction primitive yet
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Concrete)
    }

    /// Describe an abstract type
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    /// Describe an interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            constructor: None,
            methods: HashMap::default(),
        }
    }

    /// Describe `T` as a type without a declared constructor, built via `Default`
    pub fn of<T: Injectable + Default>() -> Self {
        Self::new(type_key::<T>()).bare(T::default)
    }

    /// Construct with no arguments
    pub fn bare<T, F>(mut self, make: F) -> Self
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor::Bare(Arc::new(move || {
            Arc::new(make()) as Service
        })));
        self
    }

    /// Construct through a constructor with the given parameters
    pub fn constructor<T, F>(self, params: Vec<Param>, make: F) -> Self
    where
        T: Injectable,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor_invokable(Invokable::new(params, make))
    }

    /// Construct through an existing invokable
    pub fn constructor_invokable(mut self, constructor: Invokable) -> Self {
        self.constructor = Some(Constructor::Declared(constructor));
        self
    }

    /// Add a method invoked on an instance of `T`.
    ///
    /// The instance is downcast to `T` before the body runs; the return value
    /// is wrapped as a [`Service`].
    pub fn method<T, R, F>(self, name: impl Into<String>, params: Vec<Param>, body: F) -> Self
    where
        T: Injectable,
        R: Injectable,
        F: Fn(&T, &Args) -> Result<R> + Send + Sync + 'static,
    {
        let method_name = name.into();
        let receiver = self.name.clone();
        self.method_erased(method_name, params, move |instance: &Service, args: &Args| {
            let this = instance.downcast_ref::<T>().ok_or_else(|| {
                ContainerError::creation_failed(
                    receiver.as_str(),
                    format!("method receiver is not a {}", std::any::type_name::<T>()),
                )
            })?;
            body(this, args).map(|value| Arc::new(value) as Service)
        })
    }

    /// Add a method over the type-erased instance
    pub fn method_erased<F>(mut self, name: impl Into<String>, params: Vec<Param>, body: F) -> Self
    where
        F: Fn(&Service, &Args) -> Result<Service> + Send + Sync + 'static,
    {
        self.methods.insert(
            name.into(),
            Method {
                params: params.into(),
                func: Arc::new(body),
            },
        );
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Concrete and has a construction primitive
    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete && self.constructor.is_some()
    }

    #[inline]
    pub fn constructor_ref(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    #[inline]
    pub fn method_ref(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    #[inline]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let constructor = match &self.constructor {
            None => "none",
            Some(Constructor::Bare(_)) => "bare",
            Some(Constructor::Declared(_)) => "declared",
        };
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &constructor)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of type descriptors keyed by type name.
///
/// Uses `DashMap` with `ahash`, like the binding registry.
pub struct TypeCatalog {
    types: DashMap<String, Arc<TypeDescriptor>, RandomState>,
}

impl TypeCatalog {
    #[inline]
    pub fn new() -> Self {
        Self {
            types: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Install or replace the descriptor for its type name
    #[inline]
    pub fn insert(&self, descriptor: TypeDescriptor) {
        self.types
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    /// Look up a descriptor
    #[inline]
    pub fn get(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(type_name).map(|d| Arc::clone(d.value()))
    }

    /// Look up a descriptor, failing with `UnknownType`
    pub fn require(&self, type_name: &str) -> Result<Arc<TypeDescriptor>> {
        self.get(type_name)
            .ok_or_else(|| ContainerError::unknown_type(type_name))
    }

    /// Look up a method's descriptor, failing with `UnknownType` or `UnknownMethod`
    pub fn method(&self, type_name: &str, method: &str) -> Result<Method> {
        let descriptor = self.require(type_name)?;
        descriptor
            .method_ref(method)
            .cloned()
            .ok_or_else(|| ContainerError::UnknownMethod {
                type_name: type_name.to_string(),
                method: method.to_string(),
            })
    }

    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    #[inline]
    pub fn remove(&self, type_name: &str) -> bool {
        self.types.remove(type_name).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All described type names
    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|r| r.key().clone()).collect()
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("count", &self.len())
            .finish()
    }
}

/// Receiver of `call_method`: a type to build, or an existing instance
#[derive(Clone)]
pub enum MethodTarget {
    /// Build a fresh instance of this type
    Type(String),
    /// Invoke on this instance, described by `type_name`
    Instance { type_name: String, instance: Service },
}

impl MethodTarget {
    pub fn instance(type_name: impl Into<String>, instance: Service) -> Self {
        MethodTarget::Instance {
            type_name: type_name.into(),
            instance,
        }
    }

    /// The type whose method table is consulted
    pub fn type_name(&self) -> &str {
        match self {
            MethodTarget::Type(name) => name,
            MethodTarget::Instance { type_name, .. } => type_name,
        }
    }
}

impl From<&str> for MethodTarget {
    fn from(type_name: &str) -> Self {
        MethodTarget::Type(type_name.to_string())
    }
}

impl From<String> for MethodTarget {
    fn from(type_name: String) -> Self {
        MethodTarget::Type(type_name)
    }
}

impl std::fmt::Debug for MethodTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodTarget::Type(name) => f.debug_tuple("Type").field(name).finish(),
            MethodTarget::Instance { type_name, .. } => f
                .debug_struct("Instance")
                .field("type_name", type_name)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Widget;

    #[test]
    fn test_instantiable_rules() {
        assert!(TypeDescriptor::of::<Widget>().is_instantiable());
        assert!(!TypeDescriptor::new("no_ctor").is_instantiable());
        assert!(!TypeDescriptor::abstract_type("base").bare(|| Widget).is_instantiable());
        assert!(!TypeDescriptor::interface("cap").is_instantiable());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = TypeCatalog::new();
        catalog.insert(TypeDescriptor::of::<Widget>());

        assert!(catalog.contains(type_key::<Widget>()));
        assert_eq!(catalog.len(), 1);
        assert!(matches!(
            catalog.require("missing"),
            Err(ContainerError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_method_lookup() {
        let catalog = TypeCatalog::new();
        catalog.insert(
            TypeDescriptor::of::<Widget>().method("spin", vec![], |_: &Widget, _| Ok(3_u8)),
        );

        let method = catalog.method(type_key::<Widget>(), "spin").unwrap();
        let instance: Service = Arc::new(Widget);
        let out = method.invoke(&instance, &Args::default()).unwrap();
        assert_eq!(*out.downcast::<u8>().unwrap(), 3);

        assert!(matches!(
            catalog.method(type_key::<Widget>(), "stop"),
            Err(ContainerError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_method_rejects_wrong_receiver() {
        let descriptor =
            TypeDescriptor::of::<Widget>().method("spin", vec![], |_: &Widget, _| Ok(()));
        let method = descriptor.method_ref("spin").unwrap();
        let wrong: Service = Arc::new(1_i32);

        assert!(matches!(
            method.invoke(&wrong, &Args::default()),
            Err(ContainerError::CreationFailed { .. })
        ));
    }
}
