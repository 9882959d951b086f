// ============================================================================
// Kafka Configuration
// ============================================================================

use crate::constants::*;
use crate::parse_var;

/// Kafka connection and topic settings for the relay consumers
#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Comma-separated list of Kafka brokers (e.g., "kafka1:9092,kafka2:9092")
    pub brokers: String,
    /// Group id under which partition offsets are committed
    pub consumer_group: String,
    /// Topic carrying Spanish-language events
    pub es_topic: String,
    /// Topic carrying Russian-language events
    pub ru_topic: String,
    /// The single partition consumed from each topic
    pub partition: i32,
    /// SSL/TLS enabled
    pub ssl_enabled: bool,
    /// SASL mechanism (e.g., "SCRAM-SHA-256", "PLAIN")
    pub sasl_mechanism: Option<String>,
    /// SASL username
    pub sasl_username: Option<String>,
    /// SASL password
    pub sasl_password: Option<String>,
}

impl KafkaConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            brokers: std::env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| DEFAULT_KAFKA_BROKERS.to_string()),
            consumer_group: std::env::var("KAFKA_CONSUMER_GROUP")
                .unwrap_or_else(|_| DEFAULT_CONSUMER_GROUP.to_string()),
            es_topic: std::env::var("KAFKA_ES_TOPIC")
                .unwrap_or_else(|_| DEFAULT_ES_TOPIC.to_string()),
            ru_topic: std::env::var("KAFKA_RU_TOPIC")
                .unwrap_or_else(|_| DEFAULT_RU_TOPIC.to_string()),
            partition: parse_var("KAFKA_PARTITION", 0)?,
            ssl_enabled: parse_var("KAFKA_SSL_ENABLED", false)?,
            sasl_mechanism: std::env::var("KAFKA_SASL_MECHANISM").ok(),
            sasl_username: std::env::var("KAFKA_SASL_USERNAME").ok(),
            sasl_password: std::env::var("KAFKA_SASL_PASSWORD").ok(),
        })
    }
}
