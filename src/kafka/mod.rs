// Kafka side of the relay: one manually assigned partition per language
// topic, read in order, offsets committed by the topic consumer.

pub mod config;
pub mod consumer;
pub mod metrics;
pub mod types;

pub use config::create_client_config;
pub use consumer::KafkaPartitionConsumer;
pub use types::resolve_start_offset;
