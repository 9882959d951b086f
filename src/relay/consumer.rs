// ============================================================================
// Topic Consumer
// ============================================================================
//
// Reads one partition in offset order and hands every event to the pipeline.
// The offset is committed as soon as the event is dispatched, not when its
// delivery finishes: the queue side is at-least-once, the outbound send is
// at-most-once.
//
// Shutdown is checked at the top of every iteration and raced against the
// blocking receive, the dispatch wait and the error backoff. It stops
// reading only: events already dispatched keep delivering through the drain.
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::traits::PartitionSource;
use crate::message::Language;
use crate::relay::pipeline::EventPipeline;

/// Pause after a partition read error before reading again
pub const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Counters reported when the consumer stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub consumed: u64,
    pub receive_errors: u64,
    pub commit_failures: u64,
    pub abandoned: usize,
}

pub struct TopicConsumer {
    lang: Language,
    source: Arc<dyn PartitionSource>,
    pipeline: EventPipeline,
    shutdown: CancellationToken,
    drain_timeout: Duration,
    last_committed: Option<i64>,
    stats: ConsumerStats,
}

impl TopicConsumer {
    pub fn new(
        source: Arc<dyn PartitionSource>,
        pipeline: EventPipeline,
        shutdown: CancellationToken,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            lang: pipeline.lang(),
            source,
            pipeline,
            shutdown,
            drain_timeout,
            last_committed: None,
            stats: ConsumerStats::default(),
        }
    }

    /// Consume until shutdown, then drain in-flight events
    pub async fn run(mut self) -> ConsumerStats {
        let lang = self.lang.as_str();
        let shutdown = self.shutdown.clone();
        info!(lang, "Topic consumer started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.source.recv() => received,
            };

            let event = match received {
                Ok(event) => event,
                Err(e) => {
                    self.stats.receive_errors += 1;
                    error!(lang, error = %e, error_code = e.error_code(), "Consumer error");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                    continue;
                }
            };

            let offset = event.offset;
            self.stats.consumed += 1;
            debug!(lang, offset, "Received event");

            let dispatched = tokio::select! {
                _ = shutdown.cancelled() => None,
                dispatched = self.pipeline.dispatch(event) => Some(dispatched),
            };

            match dispatched {
                // not started, so not committed; it is read again after restart
                None => break,
                Some(Err(e)) => {
                    error!(lang, offset, error = %e, "Failed to dispatch event");
                    break;
                }
                Some(Ok(())) => self.commit(offset + 1).await,
            }
        }

        info!(lang, consumed = self.stats.consumed, "Topic consumer stopping");
        self.stats.abandoned = self.pipeline.drain(self.drain_timeout).await;
        info!(lang, "Topic consumer stopped");

        self.stats
    }

    /// Commit `next_offset` unless an equal or later offset is already stored
    async fn commit(&mut self, next_offset: i64) {
        if self.last_committed.is_some_and(|last| last >= next_offset) {
            return;
        }

        match self.source.commit(next_offset).await {
            Ok(()) => self.last_committed = Some(next_offset),
            Err(e) => {
                self.stats.commit_failures += 1;
                warn!(
                    lang = self.lang.as_str(),
                    next_offset,
                    error = %e,
                    "Failed to commit offset"
                );
            }
        }
    }
}
