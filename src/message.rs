use relay_config::{KafkaConfig, TelegramConfig};
use std::fmt;

/// Language partition of the relay; each language has its own topic and channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Es,
    Ru,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Es, Language::Ru];

    /// Language code as stored by the persistence layer
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::Ru => "ru",
        }
    }

    pub fn topic(self, kafka: &KafkaConfig) -> &str {
        match self {
            Language::Es => &kafka.es_topic,
            Language::Ru => &kafka.ru_topic,
        }
    }

    /// Destination channel that receives every event of this language
    pub fn channel(self, telegram: &TelegramConfig) -> i64 {
        match self {
            Language::Es => telegram.es_channel,
            Language::Ru => telegram.ru_channel,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record read from a topic partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub offset: i64,
    pub payload: String,
}

/// Metadata and text extracted from an event payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub content_id: String,
    pub tag: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// The fixed per-language destination channel
    Channel,
    /// A subscriber's private chat
    Subscriber,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Channel => "channel",
            TargetKind::Subscriber => "subscriber",
        }
    }
}

/// Where a message body is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub chat_id: i64,
    pub lang: Language,
    pub kind: TargetKind,
}

impl DeliveryTarget {
    pub fn channel(chat_id: i64, lang: Language) -> Self {
        Self {
            chat_id,
            lang,
            kind: TargetKind::Channel,
        }
    }

    pub fn subscriber(chat_id: i64, lang: Language) -> Self {
        Self {
            chat_id,
            lang,
            kind: TargetKind::Subscriber,
        }
    }
}
