/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Metrics Module
//!
//! This module provides Prometheus metrics for the SDAM manager.
//! It exposes metrics about HTTP requests, fan-out dispatches, and the
//! number of connected agents.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global Prometheus registry for all manager metrics
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// HTTP request counter
/// Labels: endpoint, method, status
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "sdam_http_requests_total",
        "Total number of HTTP requests by endpoint and status",
    );
    let counter = CounterVec::new(opts, &["endpoint", "method", "status"])
        .expect("Failed to create HTTP requests counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register HTTP requests counter");
    counter
});

/// Total number of requests dispatched to edge agents through the fan-out layer
pub static FANOUT_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "sdam_fanout_requests_total",
        "Total number of requests dispatched to edge agents",
    )
    .expect("Failed to create fan-out requests counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register fan-out requests counter");
    counter
});

/// Fan-out dispatch latency histogram (full dispatch, all members joined)
pub static FANOUT_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "sdam_fanout_duration_seconds",
        "Fan-out dispatch latency distribution in seconds",
    )
    .buckets(vec![
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
    ]);
    let histogram = Histogram::with_opts(opts).expect("Failed to create fan-out histogram");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("Failed to register fan-out histogram");
    histogram
});

/// Number of agents currently marked as connected
pub static CONNECTED_AGENTS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "sdam_connected_agents",
        "Number of agents currently marked as connected",
    )
    .expect("Failed to create connected agents gauge");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("Failed to register connected agents gauge");
    gauge
});

/// Records one HTTP request handled by the manager.
pub fn track_http_request(endpoint: &str, method: &str, status: &str) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[endpoint, method, status])
        .inc();
}

/// Records one completed fan-out dispatch of `member_count` requests.
pub fn observe_fanout(member_count: usize, elapsed_seconds: f64) {
    FANOUT_REQUESTS_TOTAL.inc_by(member_count as u64);
    FANOUT_DURATION_SECONDS.observe(elapsed_seconds);
}

/// Updates the connected-agents gauge.
pub fn set_connected_agents(count: i64) {
    CONNECTED_AGENTS.set(count);
}

/// Renders all registered metrics in the Prometheus text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        return format!("# failed to encode metrics: {}\n", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
