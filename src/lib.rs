//! # Service Container - Binding Registry and Recursive Resolution
//!
//! A composition-root container: register once how each service is
//! produced, then request services by key without repeating wiring.
//!
//! ## Features
//!
//! - **Bindings** - key to factory, optionally singleton
//! - **Instances** - pre-built values that short-circuit resolution
//! - **Recursive construction** - constructor and method parameters are
//!   resolved from their declared shape, all the way down the graph
//! - **Environment overrides** - inject a pre-built value for any
//!   class-shaped parameter anywhere in one call's graph
//! - **Cycle detection** - circular graphs fail instead of overflowing
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_container::{service, Container, Invokable, Param, TypeDescriptor};
//!
//! #[derive(Default)]
//! struct Cls {
//!     bar: String,
//! }
//!
//! let container = Container::new();
//! container.register_type(TypeDescriptor::new("cls").bare(|| Cls { bar: "foo".into() }));
//!
//! // A factory whose parameter is built from its declared type
//! container.bind(
//!     "foo",
//!     Invokable::erased(vec![Param::class("ins", "cls")], |args| args.service(0)),
//!     false,
//! );
//! assert_eq!(container.make_as::<Cls>("foo").unwrap().bar, "foo");
//!
//! // Pre-built value
//! container.instance("value", service(123_i32));
//! assert_eq!(*container.make_as::<i32>("value").unwrap(), 123);
//!
//! // Bind to a type name
//! container.bind("bar", "cls", false);
//! assert!(container.make_as::<Cls>("bar").is_ok());
//! ```
//!
//! ## Describing Types
//!
//! There is no runtime reflection, so each constructible type declares its
//! constructor's parameters up front, either by hand with
//! [`TypeDescriptor`] or with [`Describe`] (and `#[derive(Constructible)]`
//! under the `derive` feature).
//!
//! ```rust
//! use service_container::{Container, Env, Param, TypeDescriptor};
//!
//! #[derive(Default)]
//! struct Cls {
//!     bar: String,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_type(TypeDescriptor::new("cls").bare(|| Cls { bar: "foo".into() }))
//!     .register_type(TypeDescriptor::new("abc").bare(|| ()).method(
//!         "ca",
//!         vec![Param::class("cls", "cls"), Param::value("foo").with_default("c".to_string())],
//!         |_: &(), args| {
//!             Ok(format!("{}-{}", args.get::<Cls>(0)?.bar, args.value::<String>(1)?))
//!         },
//!     ));
//!
//! let out = container.call_method("abc", "ca").unwrap();
//! assert_eq!(out.downcast_ref::<String>().unwrap(), "foo-c");
//!
//! // Override the class-shaped parameter for this call only
//! let env = Env::new().with("cls", Cls { bar: "bar".into() });
//! let out = container.call_method_with("abc", "ca", &env).unwrap();
//! assert_eq!(out.downcast_ref::<String>().unwrap(), "bar-c");
//! ```

// Lets derive output use `::service_container` paths inside this crate too
extern crate self as service_container;

mod config;
mod container;
mod error;
mod factory;
#[cfg(feature = "logging")]
pub mod logging;
mod param;
mod provider;
mod reflect;
mod registry;

pub use config::*;
pub use container::*;
pub use error::*;
pub use factory::*;
pub use param::*;
pub use provider::*;
pub use reflect::*;
pub use registry::Registry;

#[cfg(feature = "derive")]
pub use service_container_derive::Constructible;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, Container, ContainerConfig, ContainerError, Describe, Env, Factory, Injectable,
        Invokable, MethodTarget, Param, Result, Service, TypeDescriptor, service, type_key,
    };
    pub use std::sync::Arc;
}
