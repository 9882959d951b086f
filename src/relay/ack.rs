//! Acknowledgement sink: stores the platform message id of a successful
//! primary-channel delivery. Best effort; failures are logged and counted.

use relay_metrics::ACK_FAILURES_TOTAL;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::traits::DeliveryRecorder;
use crate::message::Language;

pub struct AcknowledgementSink {
    recorder: Arc<dyn DeliveryRecorder>,
}

impl AcknowledgementSink {
    pub fn new(recorder: Arc<dyn DeliveryRecorder>) -> Self {
        Self { recorder }
    }

    /// Returns whether the record was written
    pub async fn record(&self, message_id: i64, content_id: &str, lang: Language) -> bool {
        match self
            .recorder
            .record_message_id(message_id, content_id, lang)
            .await
        {
            Ok(()) => {
                debug!(
                    lang = lang.as_str(),
                    content_id, message_id, "Recorded Telegram message id"
                );
                true
            }
            Err(e) => {
                ACK_FAILURES_TOTAL.with_label_values(&[lang.as_str()]).inc();
                warn!(
                    lang = lang.as_str(),
                    content_id,
                    message_id,
                    error = %e,
                    "Failed to record Telegram message id"
                );
                false
            }
        }
    }
}
