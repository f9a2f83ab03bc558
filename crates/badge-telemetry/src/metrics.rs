//! Prometheus metrics for the badge registry.
//!
//! All metrics follow the naming convention: `badge_registry_<metric>_<unit>`.
//! Amounts are in wei and recorded as `f64`, so very large values lose
//! precision.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts,
    HistogramVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Badges created
    pub static ref REGISTRATIONS: Counter = Counter::new(
        "badge_registry_registrations_total",
        "Total number of badges registered"
    ).expect("metric creation failed");

    /// Badges retired by the admin
    pub static ref UNREGISTRATIONS: Counter = Counter::new(
        "badge_registry_unregistrations_total",
        "Total number of badges unregistered"
    ).expect("metric creation failed");

    /// Rejected calls by operation and error kind
    pub static ref REJECTED_OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("badge_registry_rejected_operations_total", "Rejected operations"),
        &["operation", "kind"]
    ).expect("metric creation failed");

    /// Registration fees credited
    pub static ref FEES_COLLECTED: Counter = Counter::new(
        "badge_registry_fees_collected_wei_total",
        "Registration fees credited, in wei"
    ).expect("metric creation failed");

    /// Funds paid out by drain
    pub static ref DRAINED: Counter = Counter::new(
        "badge_registry_drained_wei_total",
        "Funds drained to the admin, in wei"
    ).expect("metric creation failed");

    /// Badges currently active
    pub static ref ACTIVE_BADGES: Gauge = Gauge::new(
        "badge_registry_active_badges",
        "Number of active badges"
    ).expect("metric creation failed");

    /// Journal records written
    pub static ref JOURNAL_APPENDS: Counter = Counter::new(
        "badge_registry_journal_appends_total",
        "Records appended to the command journal"
    ).expect("metric creation failed");

    /// Time spent applying a mutating operation
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "badge_registry_operation_duration_seconds",
            "Time spent in a mutating operation, journal included"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");
}

/// Handle returned once metrics are registered.
#[derive(Debug)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors registered.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// A second call fails with `MetricsInit`.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(REGISTRATIONS.clone()),
        Box::new(UNREGISTRATIONS.clone()),
        Box::new(REJECTED_OPERATIONS.clone()),
        Box::new(FEES_COLLECTED.clone()),
        Box::new(DRAINED.clone()),
        Box::new(ACTIVE_BADGES.clone()),
        Box::new(JOURNAL_APPENDS.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    let registered = metrics.len();
    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a rejected call.
pub fn record_rejection(operation: &str, kind: &str) {
    REJECTED_OPERATIONS
        .with_label_values(&[operation, kind])
        .inc();
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Start a timer for one operation of `OPERATION_DURATION`.
    pub fn for_operation(operation: &str) -> Self {
        Self::new(&OPERATION_DURATION.with_label_values(&[operation]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
