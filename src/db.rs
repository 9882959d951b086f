use async_trait::async_trait;
use relay_db::DbPool;
use relay_error::RelayResult;

use crate::context::traits::{DeliveryRecorder, SubscriberDirectory};
use crate::message::Language;

/// MySQL-backed implementation of the persistence capabilities
#[derive(Clone)]
pub struct RelayStore {
    pool: DbPool,
}

impl RelayStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberDirectory for RelayStore {
    async fn subscribers(&self, tag: &str, lang: Language) -> RelayResult<Vec<i64>> {
        relay_db::get_subscribers(&self.pool, tag, lang.as_str()).await
    }
}

#[async_trait]
impl DeliveryRecorder for RelayStore {
    async fn record_message_id(
        &self,
        message_id: i64,
        content_id: &str,
        lang: Language,
    ) -> RelayResult<()> {
        relay_db::set_message_id(&self.pool, message_id, content_id, lang.as_str()).await
    }
}
