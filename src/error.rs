//! Error types for dependency resolution

use thiserror::Error;

/// Errors that can occur while registering, building or invoking services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// The named type is abstract, an interface, or has no construction primitive
    #[error("Type cannot be instantiated: {type_name}")]
    Uninstantiable { type_name: String },

    /// A plain parameter has no declared default value
    #[error("Parameter `{parameter}` at position {position} has no default value")]
    MissingDefault { parameter: String, position: usize },

    /// A type (or key) was requested again while it was still being resolved
    #[error("Circular dependency detected while resolving {type_name}: {chain}")]
    CyclicDependency { type_name: String, chain: String },

    /// Nested construction went deeper than the configured limit
    #[error("Resolution depth limit of {limit} exceeded while building {type_name}")]
    DepthExceeded { limit: usize, type_name: String },

    /// No type descriptor is registered under this name
    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    /// The type descriptor has no method with this name
    #[error("Type {type_name} has no method `{method}`")]
    UnknownMethod { type_name: String, method: String },

    /// A resolved argument did not have the type the factory asked for
    #[error("Argument at position {position} is not a {expected}")]
    TypeMismatch {
        position: usize,
        expected: &'static str,
    },

    /// A factory asked for an argument past the end of its argument list
    #[error("Argument position {position} out of range (received {len} arguments)")]
    ArgumentIndex { position: usize, len: usize },

    /// A resolved service was not of the type the caller asked for
    #[error("Service {key} is not a {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
    },

    /// A factory reported its own failure
    #[error("Failed to create {target}: {reason}")]
    CreationFailed { target: String, reason: String },
}

impl ContainerError {
    /// Create an Uninstantiable error
    #[inline]
    pub fn uninstantiable(type_name: impl Into<String>) -> Self {
        Self::Uninstantiable {
            type_name: type_name.into(),
        }
    }

    /// Create a MissingDefault error
    #[inline]
    pub fn missing_default(parameter: impl Into<String>, position: usize) -> Self {
        Self::MissingDefault {
            parameter: parameter.into(),
            position,
        }
    }

    /// Create a CyclicDependency error from the in-progress chain
    pub fn circular(type_name: impl Into<String>, in_progress: &[String]) -> Self {
        let type_name = type_name.into();
        let mut chain = in_progress.join(" -> ");
        if !chain.is_empty() {
            chain.push_str(" -> ");
        }
        chain.push_str(&type_name);
        Self::CyclicDependency { type_name, chain }
    }

    /// Create an UnknownType error
    #[inline]
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// The service resolved for `key` is not a `T`
    #[inline]
    pub fn wrong_type<T: 'static>(key: impl Into<String>) -> Self {
        Self::WrongType {
            key: key.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Type mismatch for an argument expected to be `T`
    #[inline]
    pub fn type_mismatch<T: 'static>(position: usize) -> Self {
        Self::TypeMismatch {
            position,
            expected: std::any::type_name::<T>(),
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, ContainerError>;
