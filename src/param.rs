//! Parameter descriptors, resolved argument lists and environment overrides

use crate::provider::{type_key, Injectable, Service};
use crate::{ContainerError, Result};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a parameter is a plain value or names a constructible type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain value parameter, satisfied only by its declared default
    Value,
    /// Class-shaped parameter naming the type to build
    Class(String),
}

/// Descriptor for one formal parameter of a constructor, method or factory.
///
/// The parameter's position is its index in the owning list.
#[derive(Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Service>,
}

impl Param {
    /// A plain value parameter
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Value,
            default: None,
        }
    }

    /// A class-shaped parameter resolved by building `type_name`
    pub fn class(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Class(type_name.into()),
            default: None,
        }
    }

    /// A class-shaped parameter for the Rust type `T`
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self::class(name, type_key::<T>())
    }

    /// Declare a default value.
    ///
    /// Defaults are only consulted for plain parameters.
    pub fn with_default<T: Injectable>(self, default: T) -> Self {
        self.with_default_service(Arc::new(default))
    }

    /// Declare an already type-erased default value
    pub fn with_default_service(mut self, default: Service) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// The type name if the parameter is class-shaped
    #[inline]
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            ParamKind::Class(name) => Some(name),
            ParamKind::Value => None,
        }
    }

    #[inline]
    pub fn default_value(&self) -> Option<&Service> {
        self.default.as_ref()
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Ordered argument list produced by dependency resolution.
///
/// Arguments are positional and match the parameter order exactly.
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<Service>,
}

impl Args {
    pub fn new(values: Vec<Service>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The type-erased argument at `position`
    pub fn service(&self, position: usize) -> Result<Service> {
        self.values
            .get(position)
            .cloned()
            .ok_or(ContainerError::ArgumentIndex {
                position,
                len: self.values.len(),
            })
    }

    /// The argument at `position`, downcast to `T`
    pub fn get<T: Injectable>(&self, position: usize) -> Result<Arc<T>> {
        self.service(position)?
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch::<T>(position))
    }

    /// A clone of the argument at `position`
    pub fn value<T: Injectable + Clone>(&self, position: usize) -> Result<T> {
        let service = self.service(position)?;
        service
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ContainerError::type_mismatch::<T>(position))
    }

    #[inline]
    pub fn as_slice(&self) -> &[Service] {
        &self.values
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Service> {
        self.values
    }
}

impl std::ops::Deref for Args {
    type Target = [Service];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl From<Vec<Service>> for Args {
    fn from(values: Vec<Service>) -> Self {
        Self::new(values)
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args").field("len", &self.len()).finish()
    }
}

/// Environment override map: class type name to the value to inject verbatim.
///
/// Scoped to a single top-level call and threaded unchanged through every
/// nested constructor resolution of that call.
#[derive(Clone, Default)]
pub struct Env {
    overrides: HashMap<String, Service, RandomState>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override and continue the chain
    pub fn with<T: Injectable>(self, type_name: impl Into<String>, value: T) -> Self {
        self.with_service(type_name, Arc::new(value))
    }

    /// Add a type-erased override and continue the chain
    pub fn with_service(mut self, type_name: impl Into<String>, value: Service) -> Self {
        self.overrides.insert(type_name.into(), value);
        self
    }

    /// Insert an override in place
    pub fn insert(&mut self, type_name: impl Into<String>, value: Service) {
        self.overrides.insert(type_name.into(), value);
    }

    #[inline]
    pub fn get(&self, type_name: &str) -> Option<&Service> {
        self.overrides.get(type_name)
    }

    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.overrides.contains_key(type_name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("types", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}
