//! Relay path: topic consumer, event parser, delivery engine, fan-out and
//! acknowledgement.

pub mod ack;
pub mod consumer;
pub mod delivery;
pub mod fanout;
pub mod parser;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub use ack::AcknowledgementSink;
pub use consumer::{ConsumerStats, TopicConsumer};
pub use delivery::{DeliveryEngine, DeliveryOutcome, RetryPolicy, is_rate_limited};
pub use fanout::{FanoutReport, FanoutResolver};
pub use parser::parse_event;
pub use pipeline::{EventPipeline, EventReport};
