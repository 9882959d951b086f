//! Prometheus metrics for the relay
//!
//! Provides centralized metrics collection for monitoring:
//! - Outbound delivery attempts and outcomes
//! - Subscriber fan-out
//! - Acknowledgement writes
//! - In-flight event processing per language

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, IntCounterVec, IntGaugeVec, TextEncoder, opts, register_int_counter_vec,
    register_int_gauge_vec,
};

// ============================================================================
// Delivery Metrics
// ============================================================================

/// Send attempts made against the messaging platform (by language)
pub static DELIVERY_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_delivery_attempts_total",
            "Total number of send attempts made against the messaging platform"
        ),
        &["lang"]
    )
    .expect("Failed to register DELIVERY_ATTEMPTS_TOTAL metric")
});

/// Deliveries by final outcome ("delivered", "exhausted", "cancelled") and target kind
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_deliveries_total",
            "Total number of finished deliveries by outcome"
        ),
        &["lang", "target", "outcome"]
    )
    .expect("Failed to register DELIVERIES_TOTAL metric")
});

/// Rate-limit replies received from the messaging platform
pub static RATE_LIMITED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_rate_limited_total",
            "Total number of rate-limit replies from the messaging platform"
        ),
        &["lang"]
    )
    .expect("Failed to register RATE_LIMITED_TOTAL metric")
});

// ============================================================================
// Pipeline Metrics
// ============================================================================

/// Events skipped because their payload lacks the content marker
pub static MALFORMED_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_malformed_events_total",
            "Total number of events skipped as malformed"
        ),
        &["lang"]
    )
    .expect("Failed to register MALFORMED_EVENTS_TOTAL metric")
});

/// Subscribers resolved for fan-out
pub static FANOUT_RECIPIENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_fanout_recipients_total",
            "Total number of subscribers resolved for fan-out"
        ),
        &["lang"]
    )
    .expect("Failed to register FANOUT_RECIPIENTS_TOTAL metric")
});

/// Subscriber lookups that failed and were treated as an empty set
pub static FANOUT_LOOKUP_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_fanout_lookup_failures_total",
            "Total number of failed subscriber lookups"
        ),
        &["lang"]
    )
    .expect("Failed to register FANOUT_LOOKUP_FAILURES_TOTAL metric")
});

/// Acknowledgement writes that failed
pub static ACK_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "relay_ack_failures_total",
            "Total number of failed message id writes"
        ),
        &["lang"]
    )
    .expect("Failed to register ACK_FAILURES_TOTAL metric")
});

/// Events currently being processed
pub static IN_FLIGHT_EVENTS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        opts!(
            "relay_in_flight_events",
            "Number of events dispatched but not yet finished"
        ),
        &["lang"]
    )
    .expect("Failed to register IN_FLIGHT_EVENTS metric")
});

// ============================================================================
// Metrics Collection
// ============================================================================

/// Gather all registered metrics and encode as Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
