// ============================================================================
// Configuration Constants
// ============================================================================

pub(crate) const DEFAULT_HEALTH_PORT: u16 = 8081;

// Kafka
pub(crate) const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
pub(crate) const DEFAULT_CONSUMER_GROUP: &str = "consumerGroup";
pub(crate) const DEFAULT_ES_TOPIC: &str = "esInfobot";
pub(crate) const DEFAULT_RU_TOPIC: &str = "ruInfobot";

// Telegram
pub(crate) const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub(crate) const DEFAULT_TELEGRAM_REQUEST_TIMEOUT_SECS: u64 = 30;

// Delivery
// Attempt k waits k * step after a rate-limit reply; the give-up cooldown is k * cooldown step.
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub(crate) const DEFAULT_RETRY_STEP_SECS: u64 = 2;
pub(crate) const DEFAULT_COOLDOWN_STEP_SECS: u64 = 1;
pub(crate) const DEFAULT_MAX_IN_FLIGHT: usize = 64;
pub(crate) const DEFAULT_FANOUT_CONCURRENCY: usize = 8;
pub(crate) const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 30;

// Database pool
pub(crate) const DEFAULT_DB_HOST: &str = "localhost:3306";
pub(crate) const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub(crate) const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_DB_IDLE_TIMEOUT_SECS: u64 = 600;

pub(crate) const PLACEHOLDER_HASH_SALT: &str = "default-salt-please-change";
