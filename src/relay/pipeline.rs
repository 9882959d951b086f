// ============================================================================
// Event Pipeline
// ============================================================================
//
// Per-event processing for one language:
//
//   parse -> primary channel delivery -> acknowledgement
//         \-> fan-out to tag subscribers (concurrently with the primary)
//
// Events are processed on their own tasks so the consumer never waits for
// delivery. The number of events in flight is bounded by a semaphore; when
// the bound is reached `dispatch` waits for a permit, which is what pushes
// back on the consumer.
//
// Deliveries share a cancel token owned by the pipeline. `drain` fires it
// only once its deadline has passed, so events that were committed before
// shutdown still get their sends.
//
// ============================================================================

use relay_error::RelayError;
use relay_metrics::{IN_FLIGHT_EVENTS, MALFORMED_EVENTS_TOTAL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

use crate::message::{DeliveryTarget, Event, Language};
use crate::relay::ack::AcknowledgementSink;
use crate::relay::delivery::{DeliveryEngine, DeliveryOutcome};
use crate::relay::fanout::{FanoutReport, FanoutResolver};
use crate::relay::parser::parse_event;

/// How long cancelled deliveries get to unwind before their tasks are aborted
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// What happened to one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReport {
    pub offset: i64,
    /// None when the payload was malformed
    pub content_id: Option<String>,
    pub primary: Option<DeliveryOutcome>,
    /// None when the event carried no tag
    pub fanout: Option<FanoutReport>,
    pub acknowledged: bool,
}

impl EventReport {
    fn skipped(offset: i64) -> Self {
        Self {
            offset,
            content_id: None,
            primary: None,
            fanout: None,
            acknowledged: false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.content_id.is_none()
    }
}

struct Stages {
    lang: Language,
    channel_id: i64,
    delivery: Arc<DeliveryEngine>,
    fanout: Arc<FanoutResolver>,
    ack: Arc<AcknowledgementSink>,
}

impl Stages {
    /// Process `event` inside a span carrying its offset and content id, so
    /// delivery, fan-out and acknowledgement logs can be tied back to it
    async fn process(&self, event: Event) -> EventReport {
        let span = info_span!(
            "event",
            lang = self.lang.as_str(),
            offset = event.offset,
            content_id = field::Empty,
        );
        self.process_in_span(event).instrument(span).await
    }

    async fn process_in_span(&self, event: Event) -> EventReport {
        let lang = self.lang.as_str();

        let parsed = match parse_event(&event.payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                MALFORMED_EVENTS_TOTAL.with_label_values(&[lang]).inc();
                e.log();
                warn!(
                    lang,
                    offset = event.offset,
                    payload = %event.payload,
                    "Skipping malformed event"
                );
                return EventReport::skipped(event.offset);
            }
        };
        Span::current().record("content_id", field::display(&parsed.content_id));

        debug!(
            lang,
            offset = event.offset,
            content_id = %parsed.content_id,
            tag = ?parsed.tag,
            "Processing event"
        );

        let primary = async {
            let target = DeliveryTarget::channel(self.channel_id, self.lang);
            let outcome = self.delivery.deliver(&parsed.body, &target).await;

            let acknowledged = match outcome.message_id() {
                Some(message_id) => {
                    info!(
                        lang,
                        channel = self.channel_id,
                        content_id = %parsed.content_id,
                        message_id,
                        "Message sent to Telegram channel"
                    );
                    self.ack
                        .record(message_id, &parsed.content_id, self.lang)
                        .await
                }
                None => false,
            };
            (outcome, acknowledged)
        };

        let fanout = async {
            match parsed.tag.as_deref() {
                Some(tag) => Some(self.fanout.fan_out(tag, self.lang, &parsed.body).await),
                None => None,
            }
        };

        let ((outcome, acknowledged), fanout) = tokio::join!(primary, fanout);

        EventReport {
            offset: event.offset,
            content_id: Some(parsed.content_id),
            primary: Some(outcome),
            fanout,
            acknowledged,
        }
    }
}

/// Keeps the in-flight gauge honest even when a task is aborted
struct InFlightGuard(Language);

impl InFlightGuard {
    fn enter(lang: Language) -> Self {
        IN_FLIGHT_EVENTS.with_label_values(&[lang.as_str()]).inc();
        Self(lang)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        IN_FLIGHT_EVENTS.with_label_values(&[self.0.as_str()]).dec();
    }
}

pub struct EventPipeline {
    stages: Arc<Stages>,
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    delivery_cancel: CancellationToken,
}

impl EventPipeline {
    /// `delivery_cancel` must be the token `delivery` was built with
    pub fn new(
        lang: Language,
        channel_id: i64,
        delivery: Arc<DeliveryEngine>,
        fanout: Arc<FanoutResolver>,
        ack: Arc<AcknowledgementSink>,
        max_in_flight: usize,
        delivery_cancel: CancellationToken,
    ) -> Self {
        Self {
            stages: Arc::new(Stages {
                lang,
                channel_id,
                delivery,
                fanout,
                ack,
            }),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            tasks: JoinSet::new(),
            delivery_cancel,
        }
    }

    pub fn lang(&self) -> Language {
        self.stages.lang
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Process an event inline
    pub async fn process(&self, event: Event) -> EventReport {
        self.stages.process(event).await
    }

    /// Start processing `event` on its own task.
    ///
    /// Returns once the task is spawned, waiting first for a free slot when
    /// the in-flight limit is reached. Cancel safe: if the wait is abandoned
    /// the event is not started.
    pub async fn dispatch(&mut self, event: Event) -> Result<(), RelayError> {
        self.reap();

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RelayError::Unknown(e.into()))?;

        let stages = self.stages.clone();
        self.tasks.spawn(async move {
            let _permit = permit;
            let _guard = InFlightGuard::enter(stages.lang);
            stages.process(event).await;
        });

        Ok(())
    }

    /// Wait for in-flight events, giving up after `timeout`.
    ///
    /// Deliveries keep running until the deadline. Past it their cancel
    /// token fires, which logs every unsent body, and tasks that still have
    /// not finished after a short grace are aborted.
    ///
    /// Returns the number of events that were abandoned.
    pub async fn drain(&mut self, timeout: Duration) -> usize {
        let lang = self.stages.lang.as_str();
        if self.tasks.is_empty() {
            return 0;
        }

        info!(lang, in_flight = self.tasks.len(), "Draining in-flight events");

        if join_all(&mut self.tasks, lang, timeout).await {
            return 0;
        }

        let abandoned = self.tasks.len();
        warn!(lang, abandoned, "Drain timed out, cancelling in-flight deliveries");
        self.delivery_cancel.cancel();

        if !join_all(&mut self.tasks, lang, CANCEL_GRACE).await {
            warn!(lang, remaining = self.tasks.len(), "Aborting in-flight events");
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
        abandoned
    }

    /// Collect finished tasks so the set does not grow without bound
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                error!(lang = self.stages.lang.as_str(), error = %e, "Event task failed");
            }
        }
    }
}

/// Join every task in `tasks`; false if `timeout` passed first
async fn join_all(tasks: &mut JoinSet<()>, lang: &str, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, async {
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(lang, error = %e, "Event task failed");
            }
        }
    })
    .await
    .is_ok()
}
