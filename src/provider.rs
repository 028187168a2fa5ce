//! Provider traits for dependency injection
//!
//! These traits define what values can live in the container and how Rust
//! types describe their own construction.

use crate::TypeDescriptor;
use std::any::Any;
use std::sync::Arc;

/// A type-erased, shareable service value.
///
/// Everything the container stores or hands out is a `Service`: cached
/// instances, declared defaults, environment overrides and build results.
/// Identity is `Arc::ptr_eq`.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Marker trait for types that can be stored in the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Wrap a value as a [`Service`].
///
/// # Examples
///
/// ```rust
/// use service_container::{service, Container};
///
/// let container = Container::new();
/// container.instance("value", service(123_i32));
/// assert_eq!(*container.make_as::<i32>("value").unwrap(), 123);
/// ```
#[inline]
pub fn service<T: Injectable>(value: T) -> Service {
    Arc::new(value)
}

/// The type name under which `T` is described and requested.
#[inline]
pub fn type_key<T: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<T>()
}

/// A Rust type that can describe how it is constructed.
///
/// This is the registration-time stand-in for runtime reflection: the
/// descriptor lists the constructor's parameters (class-shaped or plain,
/// with defaults) and the type's invokable methods.
///
/// # Examples
///
/// ```rust
/// use service_container::{type_key, Container, Describe, Param, TypeDescriptor};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Clock;
///
/// impl Describe for Clock {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::of::<Clock>()
///     }
/// }
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
///
/// impl Describe for Scheduler {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::new(type_key::<Scheduler>()).constructor(
///             vec![Param::of::<Clock>("clock")],
///             |args| Ok(Scheduler { clock: args.get::<Clock>(0)? }),
///         )
///     }
/// }
///
/// let container = Container::new();
/// container.register::<Clock>().register::<Scheduler>();
///
/// let scheduler = container.make_type::<Scheduler>().unwrap();
/// # let _ = &scheduler.clock;
/// ```
pub trait Describe: Injectable + Sized {
    /// Build the descriptor for this type
    fn describe() -> TypeDescriptor;
}
