// ============================================================================
// Delivery Engine
// ============================================================================
//
// Sends one message body to one target with bounded retry.
//
// Attempt k (1-based, at most `max_attempts`):
// - success              -> return the platform message id, no further sleep
// - rate limited, k < max -> sleep k * retry_step, try again
// - anything else         -> log error and body, sleep k * cooldown_step,
//                            give up
//
// The give-up cooldown keeps a failing pipeline from hammering the platform
// with the next event; it is part of the outbound rate shaping.
//
// Delivery never returns an error to the caller: the outcome says what
// happened and every outcome is logged here.
//
// The cancel token is owned by the event pipeline, not the process-wide
// shutdown token. It fires only when a drain runs past its deadline, so
// events that were already committed keep delivering while the consumer
// stops.
//
// ============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use relay_config::{DeliveryConfig, LoggingConfig};
use relay_metrics::{DELIVERIES_TOTAL, DELIVERY_ATTEMPTS_TOTAL, RATE_LIMITED_TOTAL};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::context::traits::MessageSender;
use crate::message::{DeliveryTarget, TargetKind};
use crate::utils::subscriber_label;

/// Textual form of the platform's throttling reply
static RATE_LIMIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"retry after \d+ \(429\)").expect("valid rate limit pattern"));

/// Whether a send error is the platform asking us to slow down
pub fn is_rate_limited(error: &str) -> bool {
    RATE_LIMIT_PATTERN.is_match(error)
}

/// Retry schedule for a single delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_step: Duration,
    pub cooldown_step: Duration,
}

impl RetryPolicy {
    /// Delay before retrying after a rate-limited attempt
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_step * attempt
    }

    /// Delay applied when delivery gives up at `attempt`
    pub fn cooldown(&self, attempt: u32) -> Duration {
        self.cooldown_step * attempt
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_step: Duration::from_secs(config.retry_step_secs),
            cooldown_step: Duration::from_secs(config.cooldown_step_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DeliveryConfig::default())
    }
}

/// Final state of one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { message_id: i64, attempts: u32 },
    Exhausted { attempts: u32, error: String },
    /// The drain deadline passed before the delivery finished
    Cancelled { attempts: u32 },
}

impl DeliveryOutcome {
    pub fn message_id(&self) -> Option<i64> {
        match self {
            DeliveryOutcome::Delivered { message_id, .. } => Some(*message_id),
            _ => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts, .. }
            | DeliveryOutcome::Exhausted { attempts, .. }
            | DeliveryOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Exhausted { .. } => "exhausted",
            DeliveryOutcome::Cancelled { .. } => "cancelled",
        }
    }
}

pub struct DeliveryEngine {
    sender: Arc<dyn MessageSender>,
    policy: RetryPolicy,
    logging: LoggingConfig,
    cancel: CancellationToken,
}

impl DeliveryEngine {
    pub fn new(
        sender: Arc<dyn MessageSender>,
        policy: RetryPolicy,
        logging: LoggingConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sender,
            policy,
            logging,
            cancel,
        }
    }

    /// Send `body` to `target`, retrying on rate limits
    pub async fn deliver(&self, body: &str, target: &DeliveryTarget) -> DeliveryOutcome {
        let outcome = self.run_attempts(body, target).await;

        if let DeliveryOutcome::Cancelled { attempts } = outcome {
            warn!(
                lang = target.lang.as_str(),
                target = target.kind.as_str(),
                recipient = %self.recipient_label(target),
                attempts,
                "Delivery cancelled before completion"
            );
            warn!(lang = target.lang.as_str(), body = %body, "Undelivered message");
        }

        DELIVERIES_TOTAL
            .with_label_values(&[target.lang.as_str(), target.kind.as_str(), outcome.label()])
            .inc();

        outcome
    }

    async fn run_attempts(&self, body: &str, target: &DeliveryTarget) -> DeliveryOutcome {
        let lang = target.lang.as_str();
        let recipient = self.recipient_label(target);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if self.cancel.is_cancelled() {
                return DeliveryOutcome::Cancelled {
                    attempts: attempt - 1,
                };
            }

            DELIVERY_ATTEMPTS_TOTAL.with_label_values(&[lang]).inc();

            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return DeliveryOutcome::Cancelled { attempts: attempt };
                }
                result = self.sender.send_message(target.chat_id, body) => result,
            };

            let error = match result {
                Ok(message_id) => {
                    info!(
                        lang,
                        target = target.kind.as_str(),
                        recipient = %recipient,
                        message_id,
                        attempt,
                        "Message sent to Telegram"
                    );
                    return DeliveryOutcome::Delivered {
                        message_id,
                        attempts: attempt,
                    };
                }
                Err(e) => e.to_string(),
            };

            let rate_limited = is_rate_limited(&error);
            if rate_limited {
                RATE_LIMITED_TOTAL.with_label_values(&[lang]).inc();
            }

            if rate_limited && attempt < self.policy.max_attempts {
                let delay = self.policy.retry_delay(attempt);
                warn!(
                    lang,
                    target = target.kind.as_str(),
                    recipient = %recipient,
                    attempt,
                    error = %error,
                    "Failed to send message to Telegram, retrying in {} seconds...",
                    delay.as_secs()
                );
                if !self.pause(delay).await {
                    return DeliveryOutcome::Cancelled { attempts: attempt };
                }
                continue;
            }

            warn!(
                lang,
                target = target.kind.as_str(),
                recipient = %recipient,
                attempts = attempt,
                error = %error,
                "Failed to send message to Telegram after {} attempts",
                attempt
            );
            warn!(lang, body = %body, "Undelivered message");

            self.pause(self.policy.cooldown(attempt)).await;
            return DeliveryOutcome::Exhausted {
                attempts: attempt,
                error,
            };
        }
    }

    /// Sleep unless delivery is cancelled first; returns false when cancelled.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn recipient_label(&self, target: &DeliveryTarget) -> String {
        match target.kind {
            TargetKind::Channel => target.chat_id.to_string(),
            TargetKind::Subscriber => subscriber_label(target.chat_id, &self.logging),
        }
    }
}
