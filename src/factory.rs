//! Factory types for creating service instances
//!
//! A binding's factory is either an [`Invokable`] (a callable that declares
//! its own parameters) or the name of a constructible type to build from its
//! descriptor.

use crate::param::{Args, Param};
use crate::provider::{Injectable, Service};
use crate::Result;
use std::sync::Arc;

/// Type-erased factory function
type InvokeFn = Arc<dyn Fn(&Args) -> Result<Service> + Send + Sync>;

/// A callable value with a declared parameter list.
///
/// Cloning is cheap: the parameter list and function are shared.
#[derive(Clone)]
pub struct Invokable {
    params: Arc<[Param]>,
    func: InvokeFn,
}

impl Invokable {
    /// Create from a function returning a typed value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Container, Invokable, Param};
    ///
    /// let greet = Invokable::new(vec![Param::value("name").with_default("world".to_string())], |args| {
    ///     Ok(format!("hello {}", args.value::<String>(0)?))
    /// });
    ///
    /// let container = Container::new();
    /// let out = container.call_function(&greet).unwrap();
    /// assert_eq!(out.downcast_ref::<String>().unwrap(), "hello world");
    /// ```
    pub fn new<T, F>(params: Vec<Param>, func: F) -> Self
    where
        T: Injectable,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            params: params.into(),
            func: Arc::new(move |args: &Args| func(args).map(|value| Arc::new(value) as Service)),
        }
    }

    /// Create from a function that returns a [`Service`] verbatim
    pub fn erased<F>(params: Vec<Param>, func: F) -> Self
    where
        F: Fn(&Args) -> Result<Service> + Send + Sync + 'static,
    {
        Self {
            params: params.into(),
            func: Arc::new(func),
        }
    }

    /// Zero-argument factory returning the same value on every call
    pub fn constant(value: Service) -> Self {
        Self::erased(Vec::new(), move |_| Ok(Arc::clone(&value)))
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Invoke with an already-resolved argument list
    #[inline]
    pub fn invoke(&self, args: &Args) -> Result<Service> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for Invokable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invokable")
            .field("params", &self.params)
            .finish()
    }
}

/// How a binding produces its service
#[derive(Clone, Debug)]
pub enum Factory {
    /// Invoke this callable through the dependency-injecting call path
    Invokable(Invokable),
    /// Build this type from its descriptor
    Type(String),
}

impl Factory {
    /// Label used in logs and errors
    pub fn describe(&self) -> &str {
        match self {
            Factory::Invokable(_) => "<invokable>",
            Factory::Type(name) => name,
        }
    }
}

impl From<Invokable> for Factory {
    fn from(invokable: Invokable) -> Self {
        Factory::Invokable(invokable)
    }
}

impl From<&str> for Factory {
    fn from(type_name: &str) -> Self {
        Factory::Type(type_name.to_string())
    }
}

impl From<String> for Factory {
    fn from(type_name: String) -> Self {
        Factory::Type(type_name)
    }
}

/// A registered binding: the factory plus its singleton flag
#[derive(Clone, Debug)]
pub struct Binding {
    pub factory: Factory,
    pub singleton: bool,
}

impl Binding {
    #[inline]
    pub fn new(factory: Factory, singleton: bool) -> Self {
        Self { factory, singleton }
    }

    /// A binding that builds its own key as a type name
    #[inline]
    pub fn to_self(key: &str, singleton: bool) -> Self {
        Self::new(Factory::Type(key.to_string()), singleton)
    }
}

/// Right-hand side of the map facade's `set`.
///
/// Invokables are bound as-is; any other value is wrapped in a constant
/// zero-argument factory.
#[derive(Clone, Debug)]
pub enum Assignment {
    Invokable(Invokable),
    Value(Service),
}

impl Assignment {
    /// Turn the assignment into the factory that gets bound
    pub fn into_factory(self) -> Factory {
        match self {
            Assignment::Invokable(invokable) => Factory::Invokable(invokable),
            Assignment::Value(value) => Factory::Invokable(Invokable::constant(value)),
        }
    }
}

impl From<Invokable> for Assignment {
    fn from(invokable: Invokable) -> Self {
        Assignment::Invokable(invokable)
    }
}

impl From<Service> for Assignment {
    fn from(value: Service) -> Self {
        Assignment::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContainerError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_invokable_wraps_typed_result() {
        let factory = Invokable::new(vec![], |_| Ok(42_u32));
        let out = factory.invoke(&Args::default()).unwrap();
        assert_eq!(*out.downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn test_invokable_propagates_failure() {
        let factory = Invokable::erased(vec![], |_| {
            Err(ContainerError::creation_failed("db", "connection refused"))
        });
        assert!(matches!(
            factory.invoke(&Args::default()),
            Err(ContainerError::CreationFailed { .. })
        ));
    }

    #[test]
    fn test_constant_returns_same_value() {
        let value: Service = Arc::new(5_i64);
        let factory = Invokable::constant(Arc::clone(&value));

        let a = factory.invoke(&Args::default()).unwrap();
        let b = factory.invoke(&Args::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &value));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_invokable_runs_every_call() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let factory = Invokable::new(vec![], |_| Ok(CALLS.fetch_add(1, Ordering::SeqCst)));
        factory.invoke(&Args::default()).unwrap();
        factory.invoke(&Args::default()).unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_assignment_wraps_plain_values() {
        let value: Service = Arc::new("v");
        match Assignment::from(Arc::clone(&value)).into_factory() {
            Factory::Invokable(invokable) => {
                assert!(invokable.params().is_empty());
                let out = invokable.invoke(&Args::default()).unwrap();
                assert!(Arc::ptr_eq(&out, &value));
            }
            Factory::Type(_) => panic!("plain value must become an invokable"),
        }
    }
}
