//! Logging setup for service-container
//!
//! The container emits every event under the `service_container` target:
//! registrations, removals and singleton caching at `DEBUG`, one event per
//! resolved parameter at `TRACE`. This module only installs a subscriber;
//! applications that already have one can ignore it.
//!
//! # Features
//!
//! - `logging` - Emit events through `tracing` (default)
//! - `logging-json` - Allow installing a JSON subscriber
//! - `logging-pretty` - Allow installing a human-readable subscriber
//!
//! # Example
//!
//! ```rust,ignore
//! use service_container::logging::{self, LogFormat};
//!
//! // JSON if logging-json is enabled, otherwise pretty
//! logging::init();
//!
//! // Application at INFO, resolution decisions at TRACE
//! logging::builder()
//!     .level(tracing::Level::INFO)
//!     .trace_resolution()
//!     .format(LogFormat::Compact)
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event the container emits
pub const LOG_TARGET: &str = "service_container";

/// Subscriber output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
}

/// Configures and installs the global subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    base: Option<Level>,
    container: Option<Level>,
    format: LogFormat,
    env_override: bool,
    source_location: bool,
    thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            base: Some(Level::DEBUG),
            container: None,
            format: LogFormat::default(),
            env_override: false,
            source_location: false,
            thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum level for every target
    pub fn level(mut self, level: Level) -> Self {
        self.base = Some(level);
        self
    }

    /// Level for container events, independent of the base level
    pub fn container_level(mut self, level: Level) -> Self {
        self.container = Some(level);
        self
    }

    /// Show per-parameter resolution events
    pub fn trace_resolution(self) -> Self {
        self.container_level(Level::TRACE)
    }

    /// Drop everything that is not a container event
    pub fn container_only(mut self) -> Self {
        self.base = None;
        if self.container.is_none() {
            self.container = Some(Level::DEBUG);
        }
        self
    }

    /// Prefer `RUST_LOG` over the configured levels when it is set
    pub fn from_env(mut self) -> Self {
        self.env_override = true;
        self
    }

    /// Include file and line of each event
    pub fn with_source_location(mut self) -> Self {
        self.source_location = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.thread_ids = true;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// `EnvFilter` directive for the configured levels, e.g.
    /// `INFO,service_container=TRACE`
    pub fn directive(&self) -> String {
        let base = self.base.map(|level| level.to_string());
        let container = self
            .container
            .map(|level| format!("{LOG_TARGET}={level}"));

        match (base, container) {
            (Some(base), Some(container)) => format!("{base},{container}"),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => "off".to_string(),
        }
    }

    /// Install the subscriber globally.
    ///
    /// Does nothing if a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = match EnvFilter::try_from_default_env() {
            Ok(from_env) if self.env_override => from_env,
            _ => EnvFilter::new(self.directive()),
        };

        let layer = fmt::layer()
            .with_target(true)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_ids);

        let subscriber = tracing_subscriber::registry().with(filter);
        let _ = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => subscriber.with(layer.json()).try_init(),
            // JSON output needs the logging-json feature
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => subscriber.with(layer.pretty()).try_init(),
            LogFormat::Pretty => subscriber.with(layer.pretty()).try_init(),
            LogFormat::Compact => subscriber.with(layer.compact()).try_init(),
        };
    }

    /// No subscriber feature enabled: events stay with whatever the
    /// application installed
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// JSON when `logging-json` is enabled, otherwise pretty. `RUST_LOG` wins
/// when set.
pub fn init() {
    let format = if cfg!(feature = "logging-json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    builder().format(format).from_env().init();
}

pub fn init_json() {
    builder().format(LogFormat::Json).init();
}

pub fn init_pretty() {
    builder().format(LogFormat::Pretty).init();
}

/// Container events only, including per-parameter resolution
pub fn init_container_only() {
    builder()
        .trace_resolution()
        .container_only()
        .format(LogFormat::Compact)
        .init();
}
