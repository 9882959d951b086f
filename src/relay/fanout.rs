// ============================================================================
// Fan-out Resolver
// ============================================================================
//
// Sends an event's body to every subscriber of its tag. The subscriber set is
// looked up once per event and never cached. Each recipient is an independent
// delivery with the same retry law as the primary channel; one recipient
// failing does not affect the others.
//
// ============================================================================

use futures_util::stream::{self, StreamExt};
use relay_metrics::{FANOUT_LOOKUP_FAILURES_TOTAL, FANOUT_RECIPIENTS_TOTAL};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::traits::SubscriberDirectory;
use crate::message::{DeliveryTarget, Language};
use crate::relay::delivery::DeliveryEngine;

/// Counts for one fan-out run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
    pub resolved: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct FanoutResolver {
    directory: Arc<dyn SubscriberDirectory>,
    delivery: Arc<DeliveryEngine>,
    concurrency: usize,
}

impl FanoutResolver {
    pub fn new(
        directory: Arc<dyn SubscriberDirectory>,
        delivery: Arc<DeliveryEngine>,
        concurrency: usize,
    ) -> Self {
        Self {
            directory,
            delivery,
            concurrency: concurrency.max(1),
        }
    }

    /// Subscribers of `tag` in `lang`.
    ///
    /// A failed lookup is logged and treated as "no subscribers".
    pub async fn resolve(&self, tag: &str, lang: Language) -> Vec<i64> {
        match self.directory.subscribers(tag, lang).await {
            Ok(chats) => {
                let mut seen = HashSet::with_capacity(chats.len());
                chats.into_iter().filter(|chat| seen.insert(*chat)).collect()
            }
            Err(e) => {
                FANOUT_LOOKUP_FAILURES_TOTAL
                    .with_label_values(&[lang.as_str()])
                    .inc();
                warn!(
                    lang = lang.as_str(),
                    tag,
                    error = %e,
                    error_code = e.error_code(),
                    "Failed to get subscribers"
                );
                Vec::new()
            }
        }
    }

    /// Deliver `body` to every subscriber of `tag`
    pub async fn fan_out(&self, tag: &str, lang: Language, body: &str) -> FanoutReport {
        let recipients = self.resolve(tag, lang).await;
        let mut report = FanoutReport {
            resolved: recipients.len(),
            ..FanoutReport::default()
        };

        if recipients.is_empty() {
            debug!(lang = lang.as_str(), tag, "No subscribers for tag");
            return report;
        }

        FANOUT_RECIPIENTS_TOTAL
            .with_label_values(&[lang.as_str()])
            .inc_by(recipients.len() as u64);

        let outcomes: Vec<bool> = stream::iter(recipients)
            .map(|chat_id| {
                let target = DeliveryTarget::subscriber(chat_id, lang);
                async move { self.delivery.deliver(body, &target).await.is_delivered() }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        report.delivered = outcomes.iter().filter(|ok| **ok).count();
        report.failed = outcomes.len() - report.delivered;

        info!(
            lang = lang.as_str(),
            tag,
            resolved = report.resolved,
            delivered = report.delivered,
            failed = report.failed,
            "Fan-out finished"
        );

        report
    }
}
