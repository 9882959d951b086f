//! In-memory collaborators for pipeline tests.

use async_trait::async_trait;
use relay_config::LoggingConfig;
use relay_error::{RelayError, RelayResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::context::traits::{DeliveryRecorder, MessageSender, SubscriberDirectory};
use crate::message::Language;

pub fn test_logging() -> LoggingConfig {
    LoggingConfig {
        enable_user_identifiers: false,
        hash_salt: "test-salt-that-is-super-secret".to_string(),
    }
}

/// Sender that replays a script, then succeeds with increasing ids.
/// Chats listed in `failing` always get a non-retryable error.
/// A call is recorded once its `delay` has elapsed.
pub struct ScriptedSender {
    script: Mutex<VecDeque<RelayResult<i64>>>,
    failing: HashSet<i64>,
    calls: Mutex<Vec<(i64, String)>>,
    next_id: AtomicI64,
    delay: Duration,
}

impl ScriptedSender {
    pub fn new(script: Vec<RelayResult<i64>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_for(chats: &[i64]) -> Self {
        Self {
            failing: chats.iter().copied().collect(),
            ..Self::new(Vec::new())
        }
    }

    pub fn rate_limited(retry_after: u64) -> RelayError {
        RelayError::Telegram {
            code: 429,
            description: format!("Too Many Requests: retry after {retry_after}"),
            retry_after: Some(retry_after),
        }
    }

    pub fn calls(&self) -> Vec<(i64, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn chats(&self) -> Vec<i64> {
        self.calls().into_iter().map(|(chat, _)| chat).collect()
    }
}

#[async_trait]
impl MessageSender for ScriptedSender {
    async fn send_message(&self, chat_id: i64, text: &str) -> RelayResult<i64> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls.lock().unwrap().push((chat_id, text.to_string()));

        if self.failing.contains(&chat_id) {
            return Err(RelayError::Telegram {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
                retry_after: None,
            });
        }

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

/// Subscriber lookup backed by a map keyed on (tag, lang)
#[derive(Default)]
pub struct MemoryDirectory {
    subscribers: HashMap<(String, Language), Vec<i64>>,
    fail: bool,
    lookups: Mutex<Vec<(String, Language)>>,
}

impl MemoryDirectory {
    pub fn with(mut self, tag: &str, lang: Language, chats: &[i64]) -> Self {
        self.subscribers
            .insert((tag.to_string(), lang), chats.to_vec());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<(String, Language)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriberDirectory for MemoryDirectory {
    async fn subscribers(&self, tag: &str, lang: Language) -> RelayResult<Vec<i64>> {
        self.lookups.lock().unwrap().push((tag.to_string(), lang));
        if self.fail {
            return Err(RelayError::Decode("subscriber list unavailable".to_string()));
        }
        Ok(self
            .subscribers
            .get(&(tag.to_string(), lang))
            .cloned()
            .unwrap_or_default())
    }
}

/// Recorder that keeps every acknowledgement in memory
#[derive(Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<(i64, String, Language)>>,
    fail: bool,
}

impl MemoryRecorder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<(i64, String, Language)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryRecorder for MemoryRecorder {
    async fn record_message_id(
        &self,
        message_id: i64,
        content_id: &str,
        lang: Language,
    ) -> RelayResult<()> {
        if self.fail {
            return Err(RelayError::Decode("procedure failed".to_string()));
        }
        self.records
            .lock()
            .unwrap()
            .push((message_id, content_id.to_string(), lang));
        Ok(())
    }
}

/// Fields recorded on spans named `span_name`, plus how many events were
/// emitted inside such a span versus outside of it
#[derive(Clone, Default)]
pub struct SpanCapture {
    span_name: &'static str,
    fields: Arc<Mutex<Vec<(String, String)>>>,
    inside: Arc<Mutex<Vec<String>>>,
    outside: Arc<Mutex<Vec<String>>>,
}

impl SpanCapture {
    pub fn new(span_name: &'static str) -> Self {
        Self {
            span_name,
            ..Self::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<String> {
        self.fields
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }

    /// Messages of events emitted inside the span
    pub fn inside(&self) -> Vec<String> {
        self.inside.lock().unwrap().clone()
    }

    /// Messages of events emitted outside the span
    pub fn outside(&self) -> Vec<String> {
        self.outside.lock().unwrap().clone()
    }
}

struct FieldVisitor<'a> {
    fields: &'a mut Vec<(String, String)>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{value:?}")));
    }
}

impl<S> Layer<S> for SpanCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if attrs.metadata().name() == self.span_name {
            let mut fields = self.fields.lock().unwrap();
            attrs.record(&mut FieldVisitor {
                fields: &mut fields,
            });
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        if ctx
            .span(id)
            .is_some_and(|span| span.name() == self.span_name)
        {
            let mut fields = self.fields.lock().unwrap();
            values.record(&mut FieldVisitor {
                fields: &mut fields,
            });
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = Vec::new();
        event.record(&mut FieldVisitor {
            fields: &mut fields,
        });
        let message = fields
            .into_iter()
            .find(|(name, _)| name == "message")
            .map(|(_, value)| value)
            .unwrap_or_default();

        let in_span = ctx
            .event_scope(event)
            .is_some_and(|mut scope| scope.any(|span| span.name() == self.span_name));
        if in_span {
            self.inside.lock().unwrap().push(message);
        } else {
            self.outside.lock().unwrap().push(message);
        }
    }
}
