//! Prometheus metrics for refsearch
//!
//! Counters and histograms describing search sessions. They are updated by
//! the search engines whether or not they were registered; registration only
//! makes them visible through [`gather_metrics`].

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Once;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Search sessions started, symbol and literal
    pub static ref SESSIONS_STARTED: Counter = Counter::with_opts(
        Opts::new(
            "refsearch_sessions_started_total",
            "Total number of search sessions started"
        )
    ).expect("Failed to create SESSIONS_STARTED counter");

    pub static ref DOCUMENTS_SEARCHED: Counter = Counter::with_opts(
        Opts::new(
            "refsearch_documents_searched_total",
            "Total number of documents whose search finished"
        )
    ).expect("Failed to create DOCUMENTS_SEARCHED counter");

    pub static ref DOCUMENT_FAILURES: Counter = Counter::with_opts(
        Opts::new(
            "refsearch_document_failures_total",
            "Total number of documents whose search failed"
        )
    ).expect("Failed to create DOCUMENT_FAILURES counter");

    pub static ref REFERENCES_FOUND: Counter = Counter::with_opts(
        Opts::new(
            "refsearch_references_found_total",
            "Total number of reference sites reported"
        )
    ).expect("Failed to create REFERENCES_FOUND counter");

    /// Wall time of a whole session in seconds
    pub static ref SESSION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "refsearch_session_latency_seconds",
            "Search session latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0])
    ).expect("Failed to create SESSION_LATENCY histogram");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Safe to call more than once; only the first call registers.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(SESSIONS_STARTED.clone()))
            .expect("Failed to register SESSIONS_STARTED");
        REGISTRY
            .register(Box::new(DOCUMENTS_SEARCHED.clone()))
            .expect("Failed to register DOCUMENTS_SEARCHED");
        REGISTRY
            .register(Box::new(DOCUMENT_FAILURES.clone()))
            .expect("Failed to register DOCUMENT_FAILURES");
        REGISTRY
            .register(Box::new(REFERENCES_FOUND.clone()))
            .expect("Failed to register REFERENCES_FOUND");
        REGISTRY
            .register(Box::new(SESSION_LATENCY.clone()))
            .expect("Failed to register SESSION_LATENCY");
    });
}

/// Gather all metrics and encode them in Prometheus text format.
///
/// Returns an empty string if encoding fails.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics contained invalid UTF-8: {}", e);
        String::new()
    })
}
