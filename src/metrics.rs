//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::time::Duration;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Listing Metrics
    pub static ref LISTING_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_listing_requests_total", "Total number of listing requests"),
        &["backend", "listing", "status"]
    ).expect("metric can be created");
    pub static ref LISTING_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "banscomms_listing_duration_seconds",
            "Listing request duration in seconds"
        ).buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["backend", "listing"]
    ).expect("metric can be created");

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_db_queries_total", "Total number of backend database queries"),
        &["operation", "backend"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "banscomms_db_query_duration_seconds",
            "Backend database query duration in seconds"
        ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation", "backend"]
    ).expect("metric can be created");

    // Count Metrics
    pub static ref COUNT_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_count_failures_total", "Total number of count queries that degraded to zero"),
        &["backend"]
    ).expect("metric can be created");

    // Identity Metrics
    pub static ref IDENTITY_LOOKUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_identity_lookups_total", "Total number of identity batch lookups"),
        &["status"]
    ).expect("metric can be created");
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("banscomms_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Record one backend database query.
pub fn observe_db_query(operation: &str, backend: &str, elapsed: Duration) {
    DB_QUERIES_TOTAL
        .with_label_values(&[operation, backend])
        .inc();
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, backend])
        .observe(elapsed.as_secs_f64());
}

/// Record one listing request.
pub fn observe_listing(backend: &str, listing: &str, status: &str, elapsed: Duration) {
    LISTING_REQUESTS_TOTAL
        .with_label_values(&[backend, listing, status])
        .inc();
    LISTING_DURATION_SECONDS
        .with_label_values(&[backend, listing])
        .observe(elapsed.as_secs_f64());
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LISTING_REQUESTS_TOTAL.clone()))
        .expect("LISTING_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LISTING_DURATION_SECONDS.clone()))
        .expect("LISTING_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(DB_QUERIES_TOTAL.clone()))
        .expect("DB_QUERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("DB_QUERY_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(COUNT_FAILURES_TOTAL.clone()))
        .expect("COUNT_FAILURES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(IDENTITY_LOOKUPS_TOTAL.clone()))
        .expect("IDENTITY_LOOKUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_HITS_TOTAL.clone()))
        .expect("CACHE_HITS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_MISSES_TOTAL.clone()))
        .expect("CACHE_MISSES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
