// ============================================================================
// RelayContext - shared wiring for the per-language pipelines
// ============================================================================

pub mod traits;

use relay_config::Config;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::message::Language;
use crate::relay::{AcknowledgementSink, DeliveryEngine, EventPipeline, FanoutResolver, RetryPolicy};
pub use traits::{DeliveryRecorder, MessageSender, PartitionSource, SubscriberDirectory};

/// Collaborators and configuration shared by every consumer
///
/// Nothing in here is mutable; the two language pipelines built from one
/// context share no state beyond these read-only handles.
#[derive(Clone)]
pub struct RelayContext {
    pub config: Arc<Config>,
    pub sender: Arc<dyn MessageSender>,
    pub directory: Arc<dyn SubscriberDirectory>,
    pub recorder: Arc<dyn DeliveryRecorder>,
}

impl RelayContext {
    pub fn new(
        config: Arc<Config>,
        sender: Arc<dyn MessageSender>,
        directory: Arc<dyn SubscriberDirectory>,
        recorder: Arc<dyn DeliveryRecorder>,
    ) -> Self {
        Self {
            config,
            sender,
            directory,
            recorder,
        }
    }

    /// Build the processing pipeline for one language
    ///
    /// Deliveries get a fresh cancel token that only the pipeline's drain
    /// fires; the consumer's shutdown token never reaches them.
    pub fn pipeline(&self, lang: Language) -> EventPipeline {
        let delivery_cancel = CancellationToken::new();
        let delivery = Arc::new(DeliveryEngine::new(
            self.sender.clone(),
            RetryPolicy::from(&self.config.delivery),
            self.config.logging.clone(),
            delivery_cancel.clone(),
        ));
        let fanout = Arc::new(FanoutResolver::new(
            self.directory.clone(),
            delivery.clone(),
            self.config.delivery.fanout_concurrency,
        ));
        let ack = Arc::new(AcknowledgementSink::new(self.recorder.clone()));

        EventPipeline::new(
            lang,
            lang.channel(&self.config.telegram),
            delivery,
            fanout,
            ack,
            self.config.delivery.max_in_flight,
            delivery_cancel,
        )
    }
}
