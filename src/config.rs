//! Container configuration

/// Default limit on nested constructions within one top-level call
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Resolution settings for a [`Container`](crate::Container).
///
/// # Examples
///
/// ```rust
/// use service_container::{Container, ContainerConfig};
///
/// let container = Container::with_config(
///     ContainerConfig::new()
///         .max_depth(16)
///         .resolve_through_registry(true),
/// );
/// assert_eq!(container.config().max_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Deepest chain of declared constructors resolving at once before
    /// `DepthExceeded`. Bare types need no resolution and do not count.
    pub max_depth: usize,
    /// Resolve class-shaped parameters with `make` (honouring bindings and
    /// cached instances) instead of building the named type directly
    pub resolve_through_registry: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            resolve_through_registry: false,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nested construction limit
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Route class-shaped parameters through the registry
    pub fn resolve_through_registry(mut self, enabled: bool) -> Self {
        self.resolve_through_registry = enabled;
        self
    }
}
