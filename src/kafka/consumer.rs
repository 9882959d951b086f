use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::{Message, Offset, TopicPartitionList};
use relay_config::KafkaConfig;
use relay_error::{RelayError, RelayResult};
use std::time::Duration;
use tracing::{error, info};

use super::config::create_client_config;
use super::metrics;
use super::types::resolve_start_offset;
use crate::context::traits::PartitionSource;
use crate::message::{Event, Language};

/// How long startup waits for the broker to report committed offsets
const COMMITTED_OFFSETS_TIMEOUT: Duration = Duration::from_secs(10);

fn kafka_error(context: &str, e: KafkaError) -> RelayError {
    RelayError::Kafka(format!("{context}: {e}"))
}

/// Reader for the single partition of one language topic.
///
/// The partition is assigned manually rather than through group
/// rebalancing; the group id only namespaces the committed offsets.
/// Auto commit is off, offsets are committed by the topic consumer.
pub struct KafkaPartitionConsumer {
    consumer: StreamConsumer,
    topic: String,
    partition: i32,
    lang: Language,
}

impl KafkaPartitionConsumer {
    /// Connect, look up the committed offset and assign the partition.
    ///
    /// Fails when the broker cannot be reached; callers treat that as fatal.
    pub fn connect(config: &KafkaConfig, lang: Language) -> RelayResult<Self> {
        let topic = lang.topic(config).to_string();
        let partition = config.partition;

        info!(
            lang = lang.as_str(),
            brokers = %config.brokers,
            topic = %topic,
            partition,
            group = %config.consumer_group,
            "Initializing Kafka consumer"
        );

        let consumer: StreamConsumer = create_client_config(config)
            .set("group.id", &config.consumer_group)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("fetch.wait.max.ms", "500")
            .set("session.timeout.ms", "30000")
            .create()
            .map_err(|e| kafka_error("failed to create consumer", e))?;

        let mut wanted = TopicPartitionList::new();
        wanted.add_partition(&topic, partition);
        let committed = consumer
            .committed_offsets(wanted, COMMITTED_OFFSETS_TIMEOUT)
            .map_err(|e| kafka_error("failed to read committed offset", e))?;

        let stored = committed
            .find_partition(&topic, partition)
            .map(|entry| entry.offset())
            .unwrap_or(Offset::Invalid);
        let start = resolve_start_offset(stored);

        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&topic, partition, start)
            .map_err(|e| kafka_error("invalid start offset", e))?;
        consumer
            .assign(&assignment)
            .map_err(|e| kafka_error("failed to assign partition", e))?;

        info!(
            lang = lang.as_str(),
            topic = %topic,
            partition,
            committed = ?stored,
            start = ?start,
            "Kafka consumer assigned"
        );

        Ok(Self {
            consumer,
            topic,
            partition,
            lang,
        })
    }
}

#[async_trait]
impl PartitionSource for KafkaPartitionConsumer {
    async fn recv(&self) -> RelayResult<Event> {
        match self.consumer.recv().await {
            Ok(message) => {
                metrics::KAFKA_CONSUME_SUCCESS
                    .with_label_values(&[self.lang.as_str()])
                    .inc();

                let payload = message
                    .payload()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default();

                Ok(Event {
                    offset: message.offset(),
                    payload,
                })
            }
            Err(e) => {
                metrics::KAFKA_CONSUME_FAILURE
                    .with_label_values(&[self.lang.as_str()])
                    .inc();
                error!(lang = self.lang.as_str(), topic = %self.topic, error = %e, "Kafka consumer error");
                Err(kafka_error("consumer error", e))
            }
        }
    }

    async fn commit(&self, next_offset: i64) -> RelayResult<()> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&self.topic, self.partition, Offset::Offset(next_offset))
            .map_err(|e| kafka_error("invalid commit offset", e))?;

        match self.consumer.commit(&offsets, CommitMode::Async) {
            Ok(()) => {
                metrics::KAFKA_COMMIT_SUCCESS
                    .with_label_values(&[self.lang.as_str()])
                    .inc();
                Ok(())
            }
            Err(e) => {
                metrics::KAFKA_COMMIT_FAILURE
                    .with_label_values(&[self.lang.as_str()])
                    .inc();
                Err(kafka_error("failed to commit offset", e))
            }
        }
    }
}
