use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, opts, register_int_counter_vec};

/// Records received from a partition
pub static KAFKA_CONSUME_SUCCESS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "kafka_consume_success_total",
            "Total number of successfully consumed Kafka messages"
        ),
        &["lang"]
    )
    .expect("Failed to register kafka_consume_success_total metric")
});

/// Partition read errors
pub static KAFKA_CONSUME_FAILURE: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "kafka_consume_failure_total",
            "Total number of Kafka consumer errors"
        ),
        &["lang"]
    )
    .expect("Failed to register kafka_consume_failure_total metric")
});

pub static KAFKA_COMMIT_SUCCESS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "kafka_commit_success_total",
            "Total number of offset commits handed to Kafka"
        ),
        &["lang"]
    )
    .expect("Failed to register kafka_commit_success_total metric")
});

pub static KAFKA_COMMIT_FAILURE: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "kafka_commit_failure_total",
            "Total number of rejected offset commits"
        ),
        &["lang"]
    )
    .expect("Failed to register kafka_commit_failure_total metric")
});
