//! Prometheus metrics for relay-service.
//!
//! Provides HTTP and relay-specific metrics for observability.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Registry and every metric registered in it, created together.
struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    relay_requests_total: IntCounterVec,
    relay_upstream_latency_seconds: HistogramVec,
    relay_upstream_errors_total: IntCounterVec,
    lore_loads_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize all metrics. Later and concurrent calls reuse the first set.
pub fn init_metrics() {
    METRICS.get_or_init(build_metrics);
}

fn build_metrics() -> Metrics {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    // outcome: ok, malformed_request, lore_error, upstream_error
    let relay_requests = IntCounterVec::new(
        Opts::new("relay_requests_total", "Total relay requests by outcome"),
        &["outcome"],
    )
    .expect("Failed to create relay_requests_total metric");

    let upstream_latency = HistogramVec::new(
        HistogramOpts::new(
            "relay_upstream_latency_seconds",
            "Generation API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["model"],
    )
    .expect("Failed to create relay_upstream_latency_seconds metric");

    let upstream_errors = IntCounterVec::new(
        Opts::new(
            "relay_upstream_errors_total",
            "Total generation API errors",
        ),
        &["error_type"],
    )
    .expect("Failed to create relay_upstream_errors_total metric");

    let lore_loads = IntCounterVec::new(
        Opts::new("lore_loads_total", "Lore load attempts"),
        &["source", "result"],
    )
    .expect("Failed to create lore_loads_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(relay_requests.clone()))
        .expect("Failed to register relay_requests_total");
    registry
        .register(Box::new(upstream_latency.clone()))
        .expect("Failed to register relay_upstream_latency_seconds");
    registry
        .register(Box::new(upstream_errors.clone()))
        .expect("Failed to register relay_upstream_errors_total");
    registry
        .register(Box::new(lore_loads.clone()))
        .expect("Failed to register lore_loads_total");

    tracing::info!("Prometheus metrics initialized");

    Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds: http_request_duration,
        relay_requests_total: relay_requests,
        relay_upstream_latency_seconds: upstream_latency,
        relay_upstream_errors_total: upstream_errors,
        lore_loads_total: lore_loads,
    }
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        let status = status.to_string();
        m.http_requests_total
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        m.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record the outcome of a relay request.
pub fn record_relay_outcome(outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.relay_requests_total.with_label_values(&[outcome]).inc();
    }
}

/// Record generation API latency.
pub fn record_upstream_latency(model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.relay_upstream_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
    }
}

/// Record a generation API error.
pub fn record_upstream_error(error_type: &str) {
    if let Some(m) = METRICS.get() {
        m.relay_upstream_errors_total
            .with_label_values(&[error_type])
            .inc();
    }
}

/// Record a lore load attempt.
pub fn record_lore_load(source: &str, result: &str) {
    if let Some(m) = METRICS.get() {
        m.lore_loads_total.with_label_values(&[source, result]).inc();
    }
}
