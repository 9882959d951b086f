// ============================================================================
// Capability Traits
// ============================================================================
//
// Each external collaborator of the relay is reached through one of these
// traits. Implementations are constructed once at startup and injected into
// the pipeline stages; tests substitute in-memory doubles.
//
// ============================================================================

use async_trait::async_trait;
use relay_error::RelayResult;

use crate::message::{Event, Language};
use crate::telegram::BotClient;

/// One topic partition read in offset order
#[async_trait]
pub trait PartitionSource: Send + Sync {
    /// Wait for the next record
    async fn recv(&self) -> RelayResult<Event>;

    /// Store `next_offset` as the position to resume from
    async fn commit(&self, next_offset: i64) -> RelayResult<()>;
}

/// Outbound message send on the messaging platform
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to `chat_id`, returning the platform message id
    async fn send_message(&self, chat_id: i64, text: &str) -> RelayResult<i64>;
}

/// Subscriber lookup for fan-out
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn subscribers(&self, tag: &str, lang: Language) -> RelayResult<Vec<i64>>;
}

/// Bookkeeping of platform message ids for delivered content
#[async_trait]
pub trait DeliveryRecorder: Send + Sync {
    async fn record_message_id(
        &self,
        message_id: i64,
        content_id: &str,
        lang: Language,
    ) -> RelayResult<()>;
}

#[async_trait]
impl MessageSender for BotClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> RelayResult<i64> {
        BotClient::send_message(self, chat_id, text).await
    }
}
