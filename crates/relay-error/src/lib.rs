use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

/// Error taxonomy of the relay
///
/// Only configuration and connection failures at startup are fatal to the
/// process; everything raised while processing an event is contained to the
/// stage that produced it and logged.
#[derive(Error, Debug)]
pub enum RelayError {
    // ===== Input Errors =====
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    // ===== Messaging Platform Errors =====
    /// Bot API replied `ok: false`. Rendered as `telegram: <description> (<code>)`,
    /// so a throttled send reads `telegram: Too Many Requests: retry after 5 (429)`.
    #[error("telegram: {description} ({code})")]
    Telegram {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // ===== Serialization Errors =====
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Database & Storage Errors =====
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Message Queue & Kafka Errors =====
    #[error("Kafka error: {0}")]
    Kafka(String),

    // ===== Configuration Errors =====
    #[error("Configuration error: {0}")]
    Config(String),

    // ===== Unknown/Generic Errors =====
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl RelayError {
    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::MalformedEvent(_) => "MALFORMED_EVENT",
            RelayError::Telegram { code: 429, .. } => "RATE_LIMITED",
            RelayError::Telegram { .. } => "TELEGRAM_ERROR",
            RelayError::Http(_) => "EXTERNAL_SERVICE_ERROR",
            RelayError::Json(_) => "JSON_ERROR",
            RelayError::Database(_) => "DATABASE_ERROR",
            RelayError::Decode(_) => "DECODE_ERROR",
            RelayError::Io(_) => "IO_ERROR",
            RelayError::Kafka(_) => "KAFKA_ERROR",
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Errors that describe the input rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(self, RelayError::MalformedEvent(_) | RelayError::Decode(_))
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let code = self.error_code();

        if self.is_input_error() {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Rejected input"
            );
        } else if matches!(self, RelayError::Telegram { code: 429, .. }) {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Messaging platform throttled the request"
            );
        } else {
            tracing::error!(
                error = %self,
                error_code = %code,
                "Relay error occurred"
            );
        }
    }
}
