//! Logging utilities and configuration for catalog-probe.
//!
//! Logs are structured `tracing` events. The CLI writes them to stderr so that
//! stdout carries nothing but JSON results.

/// Runtime logging switches for the service layer.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to log every remote catalog request
    pub log_catalog_requests: bool,
    /// Whether to log per-column profiling details
    pub log_profiling_details: bool,
    /// Maximum length for logged field values (filters, raw payload excerpts)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_catalog_requests: true,
            log_profiling_details: false,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            log_catalog_requests: true,
            log_profiling_details: true,
            max_field_length: 1024,
        }
    }
}

/// Logs a catalog operation at info level when request logging is enabled.
#[macro_export]
macro_rules! log_catalog_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_catalog_requests {
            tracing::info!($($arg)*);
        }
    };
}

/// Logs profiling details at debug level when enabled.
#[macro_export]
macro_rules! log_profiling {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_profiling_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, respecting char boundaries.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for binaries.
pub mod setup {
    use tracing::Level;

    /// Configuration for the global tracing subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside this crate
        pub level: Level,
        /// Log level for catalog-probe components specifically
        pub probe_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                probe_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::INFO,
                probe_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_probe_level(mut self, level: Level) -> Self {
            self.probe_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},catalog_probe={}",
                    self.level.as_str().to_lowercase(),
                    self.probe_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs the global subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the configured levels.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use catalog_probe::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
