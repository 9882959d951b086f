// ============================================================================
// Delivery Configuration
// ============================================================================

use crate::constants::*;
use crate::parse_var;

/// Retry, concurrency and shutdown tunables for the relay pipeline
#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    /// Send attempts per target, including the first one
    pub max_attempts: u32,
    /// Backoff step after a rate-limit reply (attempt k waits k * step)
    pub retry_step_secs: u64,
    /// Flat cooldown step applied when a delivery gives up (k * step)
    pub cooldown_step_secs: u64,
    /// Upper bound on events processed concurrently per consumer
    pub max_in_flight: usize,
    /// Concurrent subscriber sends per event
    pub fanout_concurrency: usize,
    /// How long shutdown waits for in-flight events to finish
    pub drain_timeout_secs: u64,
}

impl DeliveryConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            max_attempts: parse_var("DELIVERY_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            retry_step_secs: parse_var("DELIVERY_RETRY_STEP_SECS", DEFAULT_RETRY_STEP_SECS)?,
            cooldown_step_secs: parse_var(
                "DELIVERY_COOLDOWN_STEP_SECS",
                DEFAULT_COOLDOWN_STEP_SECS,
            )?,
            max_in_flight: parse_var("DELIVERY_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?,
            fanout_concurrency: parse_var(
                "DELIVERY_FANOUT_CONCURRENCY",
                DEFAULT_FANOUT_CONCURRENCY,
            )?,
            drain_timeout_secs: parse_var(
                "SHUTDOWN_DRAIN_TIMEOUT_SECS",
                DEFAULT_DRAIN_TIMEOUT_SECS,
            )?,
        };

        if config.max_attempts == 0 {
            anyhow::bail!("DELIVERY_MAX_ATTEMPTS must be at least 1");
        }
        if config.max_in_flight == 0 || config.fanout_concurrency == 0 {
            anyhow::bail!("DELIVERY_MAX_IN_FLIGHT and DELIVERY_FANOUT_CONCURRENCY must be positive");
        }

        Ok(config)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_step_secs: DEFAULT_RETRY_STEP_SECS,
            cooldown_step_secs: DEFAULT_COOLDOWN_STEP_SECS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
            drain_timeout_secs: DEFAULT_DRAIN_TIMEOUT_SECS,
        }
    }
}
