//! Structured logging setup.
//!
//! - `LOG_FORMAT`: `json` (default) or `text` / `pretty`
//! - `RUST_LOG`: filter directives (default: [`DEFAULT_DIRECTIVES`])
//! - `LOG_SERVICE_NAME`: `service` field on the startup event (default: `osm-mcp-server`)
//!
//! Logs go to stderr.

use tracing::info;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::handlers::SERVER_NAME;

/// Connection-level chatter from the HTTP client stack stays at `warn`.
pub const DEFAULT_DIRECTIVES: &str = "info,hyper_util=warn,reqwest=warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output for local development.
    Text,
}

impl LogFormat {
    /// Unknown values fall back to `Json`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub directives: String,
    pub service: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            directives: DEFAULT_DIRECTIVES.to_string(),
            service: SERVER_NAME.to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            format: get("LOG_FORMAT").map(|v| LogFormat::parse(&v)).unwrap_or(defaults.format),
            directives: get("RUST_LOG").unwrap_or(defaults.directives),
            service: get("LOG_SERVICE_NAME").unwrap_or(defaults.service),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

/// Install the global tracing subscriber. Fails if one is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Text => {
            registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr);

            registry.with(json_layer).try_init()?;
        }
    }

    info!(
        service = %config.service,
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "logging initialized"
    );
    Ok(())
}
