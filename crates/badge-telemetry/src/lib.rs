//! # Badge Telemetry
//!
//! Structured logging and Prometheus metrics for the badge registry.
//!
//! ## Usage
//!
//! The host process calls [`init_telemetry`] once at startup, before it opens
//! a registry service, and holds the guard until shutdown. The registry
//! crate only records into the metrics defined here; it never installs a
//! subscriber itself.
//!
//! ```rust,ignore
//! use badge_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
//!
//! fn main() -> Result<(), TelemetryError> {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//!     // logs and metrics are now collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BR_SERVICE_NAME` | `badge-registry` | Service name in logs |
//! | `BR_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `BR_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `BR_JSON_LOGS` | `false` | JSON log lines |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, record_rejection, register_metrics, HistogramTimer, MetricsHandle,
    ACTIVE_BADGES, DRAINED, FEES_COLLECTED, JOURNAL_APPENDS, REGISTRATIONS, REJECTED_OPERATIONS,
    UNREGISTRATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and logging.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "shutting down telemetry");
    }
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
