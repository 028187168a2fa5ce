//! Dependency resolution container
//!
//! The `Container` is the composition root: it holds the binding registry,
//! the type catalog, and the recursive engine that turns a key, a factory
//! or a type name into a fully built service.

use crate::config::ContainerConfig;
use crate::factory::{Assignment, Binding, Factory, Invokable};
use crate::param::{Args, Env, Param, ParamKind};
use crate::provider::{type_key, Describe, Injectable, Service};
use crate::reflect::{Constructor, MethodTarget, TypeCatalog, TypeDescriptor};
use crate::registry::Registry;
use crate::{ContainerError, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Resolution Context
// =============================================================================

/// State of one top-level call, threaded through the whole recursive descent.
struct Resolution<'e> {
    /// Caller-supplied overrides for class-shaped parameters
    env: &'e Env,
    /// Type names whose constructors are currently resolving
    building: Vec<String>,
    /// Keys currently being made
    making: Vec<String>,
}

impl<'e> Resolution<'e> {
    fn new(env: &'e Env) -> Self {
        Self {
            env,
            building: Vec::new(),
            making: Vec::new(),
        }
    }
}

/// Dependency resolution container.
///
/// Registrations take `&self` and return `&Self` for chaining. Cloning is
/// cheap and clones share the same registry and type catalog, so a
/// container can be handed to every collaborator explicitly.
///
/// There is no internal locking around resolution as a whole: two threads
/// resolving the same singleton key at once may each build it, and the last
/// one to finish is cached.
///
/// # Examples
///
/// ```rust
/// use service_container::{service, Container, Invokable, Param, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Cls {
///     bar: String,
/// }
///
/// let container = Container::new();
/// container.register_type(TypeDescriptor::new("cls").bare(|| Cls { bar: "foo".into() }));
///
/// container.bind(
///     "foo",
///     Invokable::erased(vec![Param::class("ins", "cls")], |args| args.service(0)),
///     false,
/// );
/// assert_eq!(container.make_as::<Cls>("foo").unwrap().bar, "foo");
///
/// container.instance("value", service(123_i32));
/// assert_eq!(*container.make_as::<i32>("value").unwrap(), 123);
/// assert!(container.bound("foo"));
/// ```
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    types: Arc<TypeCatalog>,
    config: ContainerConfig,
}

impl Container {
    /// Create a new empty container with default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Create a container with explicit configuration.
    pub fn with_config(config: ContainerConfig) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            max_depth = config.max_depth,
            resolve_through_registry = config.resolve_through_registry,
            "Creating new container"
        );

        Self {
            registry: Arc::new(Registry::new()),
            types: Arc::new(TypeCatalog::new()),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The type catalog consulted when building type names
    #[inline]
    pub fn types(&self) -> &TypeCatalog {
        &self.types
    }

    // =========================================================================
    // Type Registration
    // =========================================================================

    /// Describe a constructible type.
    pub fn register_type(&self, descriptor: TypeDescriptor) -> &Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            type_name = descriptor.name(),
            kind = ?descriptor.kind(),
            instantiable = descriptor.is_instantiable(),
            "Registering type descriptor"
        );

        self.types.insert(descriptor);
        self
    }

    /// Describe a Rust type through its [`Describe`] impl.
    #[inline]
    pub fn register<T: Describe>(&self) -> &Self {
        self.register_type(T::describe())
    }

    // =========================================================================
    // Binding Registration
    // =========================================================================

    /// Install or overwrite the binding for `key`.
    ///
    /// The factory is not validated until it is built. A previously cached
    /// instance for `key` is kept, and keeps taking precedence.
    pub fn bind(&self, key: impl Into<String>, factory: impl Into<Factory>, singleton: bool) -> &Self {
        self.insert_binding(key.into(), Binding::new(factory.into(), singleton))
    }

    /// Bind a singleton: the factory runs at most once per cached instance.
    #[inline]
    pub fn single(&self, key: impl Into<String>, factory: impl Into<Factory>) -> &Self {
        self.bind(key, factory, true)
    }

    /// Bind `key` to itself as a constructible type name.
    pub fn bind_self(&self, key: impl Into<String>, singleton: bool) -> &Self {
        let key = key.into();
        let binding = Binding::to_self(&key, singleton);
        self.insert_binding(key, binding)
    }

    fn insert_binding(&self, key: String, binding: Binding) -> &Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            key = key.as_str(),
            factory = binding.factory.describe(),
            singleton = binding.singleton,
            binding_count = self.registry.binding_count() + 1,
            "Registering binding"
        );

        self.registry.bind(key, binding);
        self
    }

    /// Install a pre-built value, bypassing factories.
    ///
    /// Every later `make(key)` returns this exact value until it is removed
    /// or replaced.
    pub fn instance(&self, key: impl Into<String>, value: Service) -> &Self {
        let key = key.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            key = key.as_str(),
            "Registering instance"
        );

        self.registry.set_instance(key, value);
        self
    }

    /// True if `key` has a cached instance or a binding.
    #[inline]
    pub fn bound(&self, key: &str) -> bool {
        self.registry.contains(key)
    }

    /// Clear both the binding and the cached instance for `key`.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.registry.remove(key);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            key,
            removed,
            "Removing binding and cached instance"
        );

        removed
    }

    /// Number of registered bindings.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.binding_count()
    }

    /// True if no bindings or instances are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Keys that currently have a binding.
    pub fn bound_keys(&self) -> Vec<String> {
        self.registry.bound_keys()
    }

    /// Drop every binding and cached instance. Type descriptors stay.
    pub fn clear(&self) {
        #[cfg(feature = "logging")]
        let count = self.registry.binding_count();

        self.registry.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            bindings_removed = count,
            "Container cleared"
        );
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve a service by key.
    ///
    /// A cached instance is returned unchanged. Otherwise the bound factory
    /// is built, or the key itself is built as a type name when unbound.
    /// Singleton bindings cache their result.
    #[inline]
    pub fn make(&self, key: &str) -> Result<Service> {
        self.make_with(key, &Env::new())
    }

    /// Resolve a service and cache it regardless of the binding's flag.
    pub fn make_singleton(&self, key: &str) -> Result<Service> {
        let env = Env::new();
        self.make_inner(key, true, &mut Resolution::new(&env))
    }

    /// Resolve a service with environment overrides for nested parameters.
    ///
    /// With a non-empty `env` the result is never cached, even for a
    /// singleton binding, so later calls do not see the overrides.
    pub fn make_with(&self, key: &str, env: &Env) -> Result<Service> {
        self.make_inner(key, false, &mut Resolution::new(env))
    }

    /// Resolve a service and downcast it to `T`.
    pub fn make_as<T: Injectable>(&self, key: &str) -> Result<Arc<T>> {
        self.make(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::wrong_type::<T>(key))
    }

    /// Resolve the service registered under `T`'s type name.
    #[inline]
    pub fn make_type<T: Injectable>(&self) -> Result<Arc<T>> {
        self.make_as::<T>(type_key::<T>())
    }

    fn make_inner(&self, key: &str, force_singleton: bool, res: &mut Resolution<'_>) -> Result<Service> {
        if let Some(instance) = self.registry.instance(key) {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_container",
                key,
                location = "instances",
                "Service resolved from instance cache"
            );
            return Ok(instance);
        }

        if res.making.iter().any(|k| k == key) {
            return Err(ContainerError::circular(key, &res.making));
        }

        let (factory, singleton) = match self.registry.binding(key) {
            Some(binding) => (binding.factory, binding.singleton),
            None => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "service_container",
                    key,
                    "Key not bound, building it as a type name"
                );
                (Factory::Type(key.to_string()), false)
            }
        };

        res.making.push(key.to_string());
        let built = self.build_inner(&factory, res);
        res.making.pop();
        let object = built?;

        // Env-derived objects belong to this call only
        if (singleton || force_singleton) && res.env.is_empty() {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                key,
                forced = force_singleton && !singleton,
                "Caching singleton instance"
            );
            self.registry.set_instance(key, Arc::clone(&object));
        }

        Ok(object)
    }

    /// Build a factory: invoke an invokable, or construct a type by name.
    #[inline]
    pub fn build(&self, target: impl Into<Factory>) -> Result<Service> {
        self.build_with(target, &Env::new())
    }

    /// Build with environment overrides for nested parameters.
    pub fn build_with(&self, target: impl Into<Factory>, env: &Env) -> Result<Service> {
        let target = target.into();
        self.build_inner(&target, &mut Resolution::new(env))
    }

    fn build_inner(&self, target: &Factory, res: &mut Resolution<'_>) -> Result<Service> {
        match target {
            Factory::Invokable(invokable) => self.invoke_inner(invokable, res),
            Factory::Type(type_name) => self.construct(type_name, res),
        }
    }

    /// Construct a type from its descriptor.
    fn construct(&self, type_name: &str, res: &mut Resolution<'_>) -> Result<Service> {
        if res.building.iter().any(|t| t == type_name) {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                type_name,
                chain = ?res.building,
                "Circular dependency detected"
            );
            return Err(ContainerError::circular(type_name, &res.building));
        }

        let descriptor = self.types.require(type_name)?;
        let constructor = match descriptor.constructor_ref() {
            Some(constructor) if descriptor.is_instantiable() => constructor.clone(),
            _ => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "service_container",
                    type_name,
                    kind = ?descriptor.kind(),
                    "Type cannot be instantiated"
                );
                return Err(ContainerError::uninstantiable(type_name));
            }
        };

        match constructor {
            Constructor::Bare(make) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "service_container",
                    type_name,
                    "Constructing bare instance (no constructor)"
                );
                Ok(make())
            }
            Constructor::Declared(constructor) => {
                if res.building.len() >= self.config.max_depth {
                    return Err(ContainerError::DepthExceeded {
                        limit: self.config.max_depth,
                        type_name: type_name.to_string(),
                    });
                }

                #[cfg(feature = "logging")]
                trace!(
                    target: "service_container",
                    type_name,
                    depth = res.building.len(),
                    params = constructor.params().len(),
                    "Resolving constructor parameters"
                );

                res.building.push(type_name.to_string());
                let built = self.invoke_inner(&constructor, res);
                res.building.pop();
                built
            }
        }
    }

    fn invoke_inner(&self, invokable: &Invokable, res: &mut Resolution<'_>) -> Result<Service> {
        let args = self.resolve_params(invokable.params(), res)?;
        invokable.invoke(&args)
    }

    // =========================================================================
    // Invocation Methods
    // =========================================================================

    /// Invoke a callable with its parameters resolved from the container.
    #[inline]
    pub fn call_function(&self, callable: &Invokable) -> Result<Service> {
        self.call_function_with(callable, &Env::new())
    }

    /// Invoke a callable with environment overrides.
    pub fn call_function_with(&self, callable: &Invokable, env: &Env) -> Result<Service> {
        self.invoke_inner(callable, &mut Resolution::new(env))
    }

    /// Invoke a method with its parameters resolved from the container.
    ///
    /// For a type target the receiver is a freshly built instance; it is not
    /// looked up in, or stored into, the instance cache.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Container, TypeDescriptor};
    ///
    /// #[derive(Default)]
    /// struct Cls;
    ///
    /// let container = Container::new();
    /// container.register_type(
    ///     TypeDescriptor::new("cls")
    ///         .bare(Cls::default)
    ///         .method("action", vec![], |_: &Cls, _| Ok("zzz")),
    /// );
    ///
    /// let out = container.call_method("cls", "action").unwrap();
    /// assert_eq!(*out.downcast_ref::<&str>().unwrap(), "zzz");
    /// ```
    #[inline]
    pub fn call_method(&self, target: impl Into<MethodTarget>, method: &str) -> Result<Service> {
        self.call_method_with(target, method, &Env::new())
    }

    /// Invoke a method with environment overrides.
    pub fn call_method_with(
        &self,
        target: impl Into<MethodTarget>,
        method: &str,
        env: &Env,
    ) -> Result<Service> {
        let target = target.into();
        let descriptor = self.types.method(target.type_name(), method)?;

        #[cfg(feature = "logging")]
        trace!(
            target: "service_container",
            type_name = target.type_name(),
            method,
            "Invoking method"
        );

        let mut res = Resolution::new(env);
        let args = self.resolve_params(descriptor.params(), &mut res)?;
        let instance = match target {
            MethodTarget::Type(type_name) => self.construct(&type_name, &mut res)?,
            MethodTarget::Instance { instance, .. } => instance,
        };
        descriptor.invoke(&instance, &args)
    }

    // =========================================================================
    // Parameter Resolution
    // =========================================================================

    /// Resolve an ordered argument list for `params`.
    ///
    /// Plain parameters take their declared default. Class-shaped parameters
    /// take the `env` value for their type name verbatim when present, and
    /// are otherwise built recursively with the same `env`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Container, Env, Param};
    ///
    /// let container = Container::new();
    /// let env = Env::new().with("foo", "bar".to_string());
    ///
    /// let args = container
    ///     .get_dependencies(&[Param::class("cls", "foo"), Param::value("n").with_default(3_u8)], &env)
    ///     .unwrap();
    /// assert_eq!(args.value::<String>(0).unwrap(), "bar");
    /// assert_eq!(args.value::<u8>(1).unwrap(), 3);
    /// ```
    pub fn get_dependencies(&self, params: &[Param], env: &Env) -> Result<Args> {
        self.resolve_params(params, &mut Resolution::new(env))
    }

    fn resolve_params(&self, params: &[Param], res: &mut Resolution<'_>) -> Result<Args> {
        let mut values = Vec::with_capacity(params.len());

        for (position, param) in params.iter().enumerate() {
            let value = match param.kind() {
                ParamKind::Value => self.resolve_non_class(param, position)?,
                ParamKind::Class(type_name) => {
                    if let Some(value) = res.env.get(type_name) {
                        #[cfg(feature = "logging")]
                        trace!(
                            target: "service_container",
                            parameter = param.name(),
                            type_name = type_name.as_str(),
                            location = "env",
                            "Parameter resolved from environment override"
                        );
                        Arc::clone(value)
                    } else if self.config.resolve_through_registry {
                        self.make_inner(type_name, false, res)?
                    } else {
                        self.construct(type_name, res)?
                    }
                }
            };
            values.push(value);
        }

        Ok(Args::new(values))
    }

    /// The declared default of a plain parameter.
    pub fn resolve_non_class(&self, param: &Param, position: usize) -> Result<Service> {
        match param.default_value() {
            Some(default) => Ok(Arc::clone(default)),
            None => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "service_container",
                    parameter = param.name(),
                    position,
                    "Plain parameter has no default value"
                );
                Err(ContainerError::missing_default(param.name(), position))
            }
        }
    }

    // =========================================================================
    // Map Facade
    // =========================================================================

    /// True if `key` has a binding. Cached instances are not considered;
    /// use [`bound`](Self::bound) to check both.
    #[inline]
    pub fn exists(&self, key: &str) -> bool {
        self.registry.has_binding(key)
    }

    /// Same as [`make`](Self::make).
    #[inline]
    pub fn get(&self, key: &str) -> Result<Service> {
        self.make(key)
    }

    /// Bind an invokable as-is, or bind a plain value behind a constant
    /// zero-argument factory. Neither populates the instance cache.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Assignment>) -> &Self {
        self.bind(key, value.into().into_factory(), false)
    }

    /// Same as [`remove`](Self::remove).
    #[inline]
    pub fn unset(&self, key: &str) -> bool {
        self.remove(key)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.binding_count())
            .field("instances", &self.registry.instance_count())
            .field("types", &self.types.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Cls {
        bar: String,
    }

    fn cls_descriptor() -> TypeDescriptor {
        TypeDescriptor::new("cls").bare(|| Cls { bar: "foo".into() })
    }

    fn container_with_cls() -> Container {
        let container = Container::new();
        container.register_type(cls_descriptor());
        container
    }

    #[test]
    fn test_instance_takes_precedence_over_binding() {
        let container = container_with_cls();
        let value = service(123_i32);
        container.instance("value", Arc::clone(&value));
        container.bind("value", "cls", false);

        let a = container.make("value").unwrap();
        let b = container.make("value").unwrap();
        assert!(Arc::ptr_eq(&a, &value));
        assert!(Arc::ptr_eq(&b, &value));
    }

    #[test]
    fn test_single_invokes_factory_once() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.single(
            "counter",
            Invokable::new(vec![], |_| Ok(CALLS.fetch_add(1, Ordering::SeqCst))),
        );

        let a = container.make("counter").unwrap();
        let b = container.make("counter").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bind_builds_fresh_each_time() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.bind(
            "counter",
            Invokable::new(vec![], |_| Ok(CALLS.fetch_add(1, Ordering::SeqCst))),
            false,
        );

        let a = container.make_as::<u32>("counter").unwrap();
        let b = container.make_as::<u32>("counter").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(*a, *b);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_make_singleton_caches_non_singleton_binding() {
        let container = container_with_cls();
        container.bind("bar", "cls", false);

        let a = container.make_singleton("bar").unwrap();
        let b = container.make("bar").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_bound_lifecycle() {
        let container = container_with_cls();
        assert!(!container.bound("foo"));
        assert!(!container.bound("value"));

        container.bind("foo", "cls", false);
        container.instance("value", service(1_u8));
        assert!(container.bound("foo"));
        assert!(container.bound("value"));

        container.remove("foo");
        container.remove("value");
        assert!(!container.bound("foo"));
        assert!(!container.bound("value"));
    }

    #[test]
    fn test_unbound_key_is_built_as_type_name() {
        let container = container_with_cls();
        let cls = container.make_as::<Cls>("cls").unwrap();
        assert_eq!(cls.bar, "foo");
    }

    #[test]
    fn test_bind_to_type_name() {
        let container = container_with_cls();
        container.bind("bar", "cls", false);
        assert!(container.make_as::<Cls>("bar").is_ok());
    }

    #[test]
    fn test_bind_self() {
        let container = container_with_cls();
        container.bind_self("cls", true);

        let a = container.make("cls").unwrap();
        let b = container.make("cls").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_rebind_keeps_cached_instance() {
        let container = container_with_cls();
        container.single("svc", "cls");
        let first = container.make("svc").unwrap();

        container.bind("svc", Invokable::new(vec![], |_| Ok(0_u8)), false);
        let second = container.make("svc").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_uninstantiable_types() {
        let container = Container::new();
        container
            .register_type(TypeDescriptor::abstract_type("base").bare(Cls::default))
            .register_type(TypeDescriptor::interface("logger"))
            .register_type(TypeDescriptor::new("shapeless"));

        for name in ["base", "logger", "shapeless"] {
            assert_eq!(
                container.make(name).unwrap_err(),
                ContainerError::uninstantiable(name)
            );
        }
    }

    #[test]
    fn test_unknown_type() {
        let container = Container::new();
        assert_eq!(
            container.make("nope").unwrap_err(),
            ContainerError::unknown_type("nope")
        );
    }

    #[test]
    fn test_factory_error_propagates() {
        let container = Container::new();
        container.bind(
            "db",
            Invokable::erased(vec![], |_| Err(ContainerError::creation_failed("db", "down"))),
            true,
        );

        assert!(container.make("db").is_err());
        assert!(!container.registry.has_instance("db"));
    }

    #[test]
    fn test_missing_default_aborts_construction() {
        let container = Container::new();
        container.register_type(TypeDescriptor::new("needs_port").constructor(
            vec![Param::value("port")],
            |args| args.value::<u16>(0),
        ));

        assert_eq!(
            container.make("needs_port").unwrap_err(),
            ContainerError::missing_default("port", 0)
        );
    }

    #[test]
    fn test_get_dependencies_default_and_missing() {
        let container = Container::new();
        let env = Env::new();

        let args = container
            .get_dependencies(&[Param::value("foo").with_default("c".to_string())], &env)
            .unwrap();
        assert_eq!(args.value::<String>(0).unwrap(), "c");

        assert_eq!(
            container
                .get_dependencies(&[Param::value("foo")], &env)
                .unwrap_err(),
            ContainerError::missing_default("foo", 0)
        );
    }

    #[test]
    fn test_env_value_skips_build() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register_type(TypeDescriptor::new("expensive").bare(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Cls::default()
        }));

        let injected = service(Cls { bar: "env".into() });
        let env = Env::new().with_service("expensive", Arc::clone(&injected));
        let args = container
            .get_dependencies(&[Param::class("dep", "expensive")], &env)
            .unwrap();

        assert!(Arc::ptr_eq(&args[0], &injected));
        assert_eq!(BUILT.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_env_never_overrides_plain_parameters() {
        let container = Container::new();
        let env = Env::new().with("foo", "bar".to_string());

        let args = container
            .get_dependencies(&[Param::value("foo").with_default("c".to_string())], &env)
            .unwrap();
        assert_eq!(args.value::<String>(0).unwrap(), "c");
    }

    struct Mailer {
        logger: Arc<String>,
    }

    #[test]
    fn test_env_propagates_into_nested_constructors() {
        let container = Container::new();
        container
            .register_type(TypeDescriptor::interface("logger"))
            .register_type(TypeDescriptor::new("service").constructor(
                vec![Param::class("logger", "logger")],
                |args| Ok(Mailer { logger: args.get::<String>(0)? }),
            ));

        let params = [Param::class("svc", "service")];
        assert_eq!(
            container.get_dependencies(&params, &Env::new()).unwrap_err(),
            ContainerError::uninstantiable("logger")
        );

        let env = Env::new().with("logger", "stdout".to_string());
        let args = container.get_dependencies(&params, &env).unwrap();
        assert_eq!(*args.get::<Mailer>(0).unwrap().logger, "stdout");
    }

    #[test]
    fn test_env_scoped_singleton_is_not_cached() {
        let container = Container::new();
        container
            .register_type(TypeDescriptor::new("cfg").bare(|| "prod".to_string()))
            .register_type(TypeDescriptor::new("svc").constructor(
                vec![Param::class("cfg", "cfg")],
                |args| Ok(Mailer { logger: args.get::<String>(0)? }),
            ));
        container.bind_self("svc", true);

        let env = Env::new().with("cfg", "test-only".to_string());
        let scoped = container.make_with("svc", &env).unwrap();
        assert_eq!(*scoped.downcast_ref::<Mailer>().unwrap().logger, "test-only");
        assert!(!container.registry.has_instance("svc"));

        let later = container.make_as::<Mailer>("svc").unwrap();
        assert_eq!(*later.logger, "prod");
        assert!(Arc::ptr_eq(&container.make("svc").unwrap(), &(later as Service)));
    }

    #[test]
    fn test_env_scoped_nested_singleton_is_not_cached() {
        let config = ContainerConfig::new().resolve_through_registry(true);
        let container = Container::with_config(config);
        container
            .register_type(TypeDescriptor::new("cfg").bare(|| "prod".to_string()))
            .register_type(TypeDescriptor::new("svc").constructor(
                vec![Param::class("cfg", "cfg")],
                |args| Ok(Mailer { logger: args.get::<String>(0)? }),
            ))
            .register_type(TypeDescriptor::new("app").constructor(
                vec![Param::class("svc", "svc")],
                |args| args.get::<Mailer>(0),
            ));
        container.bind_self("svc", true);

        let env = Env::new().with("cfg", "test-only".to_string());
        container.make_with("app", &env).unwrap();
        assert!(!container.registry.has_instance("svc"));
        assert_eq!(*container.make_as::<Mailer>("svc").unwrap().logger, "prod");
    }

    #[test]
    fn test_cyclic_dependency_detected() {
        let container = Container::new();
        container
            .register_type(TypeDescriptor::new("a").constructor(
                vec![Param::class("b", "b")],
                |_| Ok(()),
            ))
            .register_type(TypeDescriptor::new("b").constructor(
                vec![Param::class("a", "a")],
                |_| Ok(()),
            ));

        assert_eq!(
            container.make("a").unwrap_err(),
            ContainerError::CyclicDependency {
                type_name: "a".into(),
                chain: "a -> b -> a".into(),
            }
        );
    }

    #[test]
    fn test_cyclic_keys_detected_through_registry() {
        let container = Container::with_config(ContainerConfig::new().resolve_through_registry(true));
        container.bind(
            "loop",
            Invokable::erased(vec![Param::class("again", "loop")], |args| args.service(0)),
            false,
        );

        assert!(matches!(
            container.make("loop"),
            Err(ContainerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let container = Container::with_config(ContainerConfig::new().max_depth(2));
        container
            .register_type(TypeDescriptor::new("t0").constructor(vec![Param::class("n", "t1")], |_| Ok(0)))
            .register_type(TypeDescriptor::new("t1").constructor(vec![Param::class("n", "t2")], |_| Ok(1)))
            .register_type(TypeDescriptor::new("t2").constructor(vec![Param::class("n", "t3")], |_| Ok(2)))
            .register_type(TypeDescriptor::new("t3").bare(Cls::default));

        assert_eq!(
            container.make("t0").unwrap_err(),
            ContainerError::DepthExceeded {
                limit: 2,
                type_name: "t2".into(),
            }
        );
        assert!(container.make("t2").is_ok());
        // A bare leaf needs no resolution and does not count toward the limit
        assert!(container.make("t1").is_ok());
    }

    #[test]
    fn test_direct_build_ignores_registry_by_default() {
        let container = container_with_cls();
        container.instance("cls", service(Cls { bar: "cached".into() }));

        let args = container
            .get_dependencies(&[Param::class("c", "cls")], &Env::new())
            .unwrap();
        assert_eq!(args.get::<Cls>(0).unwrap().bar, "foo");
    }

    #[test]
    fn test_resolve_through_registry_uses_instances() {
        let container = Container::with_config(ContainerConfig::new().resolve_through_registry(true));
        container.register_type(cls_descriptor());
        container.instance("cls", service(Cls { bar: "cached".into() }));

        let args = container
            .get_dependencies(&[Param::class("c", "cls")], &Env::new())
            .unwrap();
        assert_eq!(args.get::<Cls>(0).unwrap().bar, "cached");
    }

    #[test]
    fn test_call_method_on_instance() {
        let container = Container::new();
        container.register_type(
            TypeDescriptor::abstract_type("counter")
                .method("peek", vec![], |n: &u32, _| Ok(*n + 1)),
        );

        let out = container
            .call_method(MethodTarget::instance("counter", service(41_u32)), "peek")
            .unwrap();
        assert_eq!(*out.downcast::<u32>().unwrap(), 42);

        assert_eq!(
            container.call_method("counter", "peek").unwrap_err(),
            ContainerError::uninstantiable("counter")
        );
    }

    #[test]
    fn test_call_method_does_not_touch_instance_cache() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register_type(
            TypeDescriptor::new("cls")
                .bare(|| {
                    BUILT.fetch_add(1, Ordering::SeqCst);
                    Cls::default()
                })
                .method("action", vec![], |_: &Cls, _| Ok("zzz")),
        );
        container.instance("cls", service(Cls::default()));

        container.call_method("cls", "action").unwrap();
        container.call_method("cls", "action").unwrap();
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_method() {
        let container = container_with_cls();
        assert_eq!(
            container.call_method("cls", "missing").unwrap_err(),
            ContainerError::UnknownMethod {
                type_name: "cls".into(),
                method: "missing".into(),
            }
        );
    }

    #[test]
    fn test_facade_exists_checks_bindings_only() {
        let container = Container::new();
        container.instance("value", service(123_i32));

        assert!(!container.exists("value"));
        assert!(container.bound("value"));
        assert_eq!(*container.get("value").unwrap().downcast::<i32>().unwrap(), 123);
    }

    #[test]
    fn test_facade_set_wraps_plain_value() {
        let container = Container::new();
        let value = service("config".to_string());
        container.set("config", Arc::clone(&value));

        assert!(container.exists("config"));
        assert!(!container.registry.has_instance("config"));
        let a = container.get("config").unwrap();
        let b = container.get("config").unwrap();
        assert!(Arc::ptr_eq(&a, &value));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_facade_set_binds_invokable() {
        let container = Container::new();
        container.set("answer", Invokable::new(vec![], |_| Ok(42_u64)));
        assert_eq!(*container.make_as::<u64>("answer").unwrap(), 42);
    }

    #[test]
    fn test_facade_unset_falls_back_to_type_name() {
        let container = container_with_cls();
        container.single("cls", Invokable::new(vec![], |_| Ok(Cls { bar: "bound".into() })));
        assert_eq!(container.make_as::<Cls>("cls").unwrap().bar, "bound");

        assert!(container.unset("cls"));
        assert!(!container.bound("cls"));
        assert_eq!(container.make_as::<Cls>("cls").unwrap().bar, "foo");
    }

    fn repeat_bar() -> Invokable {
        Invokable::new(
            vec![Param::class("c", "cls"), Param::value("n").with_default(2_usize)],
            |args| Ok(args.get::<Cls>(0)?.bar.repeat(args.value::<usize>(1)?)),
        )
    }

    #[test]
    fn test_call_function_resolves_declared_params() {
        let container = container_with_cls();
        let out = container.call_function(&repeat_bar()).unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "foofoo");
        assert!(!container.bound("cls"));
    }

    #[test]
    fn test_call_function_with_env() {
        let container = container_with_cls();
        let env = Env::new().with("cls", Cls { bar: "ab".into() });
        let out = container.call_function_with(&repeat_bar(), &env).unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "abab");
    }

    #[test]
    fn test_make_as_wrong_type() {
        let container = Container::new();
        container.instance("value", service(1_i32));
        assert_eq!(
            container.make_as::<String>("value").unwrap_err(),
            ContainerError::wrong_type::<String>("value")
        );
    }

    #[test]
    fn test_clones_share_state() {
        let container = container_with_cls();
        let handle = container.clone();
        handle.bind("bar", "cls", true);

        assert!(container.bound("bar"));
        let a = container.make("bar").unwrap();
        let b = handle.make("bar").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
