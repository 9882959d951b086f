// ============================================================================
// Relay Worker
// ============================================================================
//
// Relays the "es" and "ru" event topics into their Telegram channels and to
// the subscribers of each event's tag.
//
// Startup (any failure here exits the process):
// 1. Load configuration and initialize tracing
// 2. Connect to MySQL and check the tag routine
// 3. Check the bot token with getMe
// 4. Assign one Kafka partition per language
//
// Runtime:
// - One topic consumer per language, sharing nothing but read-only handles
// - /health and /metrics on HEALTH_PORT
// - SIGTERM/SIGINT cancel a shared token; consumers stop reading, drain
//   in-flight events for up to SHUTDOWN_DRAIN_TIMEOUT_SECS and exit
//
// ============================================================================

use anyhow::{Context, Result};
use infobot_relay::context::RelayContext;
use infobot_relay::db::RelayStore;
use infobot_relay::kafka::KafkaPartitionConsumer;
use infobot_relay::message::Language;
use infobot_relay::relay::TopicConsumer;
use infobot_relay::run_http_server;
use infobot_relay::telegram::BotClient;
use relay_config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let config = Arc::new(config);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Relay Worker Starting ===");
    info!("Kafka Brokers: {}", config.kafka.brokers);
    info!("Kafka Consumer Group: {}", config.kafka.consumer_group);
    info!("Connecting to database at: {}", config.db.url_safe());

    let pool = relay_db::create_pool(&config.db)
        .await
        .context("Failed to connect to database")?;
    let tags = relay_db::read_tags(&pool, 1, true, Language::Ru.as_str())
        .await
        .context("Database startup check failed")?;
    info!(tags = tags.len(), "Connected to database");

    let bot = BotClient::new(&config.telegram).context("Failed to create Telegram client")?;
    let me = bot
        .get_me()
        .await
        .context("Failed to authorize Telegram bot")?;
    info!(
        "Authorized on account {}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let store = Arc::new(RelayStore::new(pool.clone()));
    let ctx = RelayContext::new(
        config.clone(),
        Arc::new(bot),
        store.clone(),
        store,
    );

    let drain_timeout = Duration::from_secs(config.delivery.drain_timeout_secs);
    let mut consumers = JoinSet::new();
    for lang in Language::ALL {
        let source = KafkaPartitionConsumer::connect(&config.kafka, lang)
            .with_context(|| format!("Failed to start Kafka consumer for {}", lang))?;
        let consumer = TopicConsumer::new(
            Arc::new(source),
            ctx.pipeline(lang),
            shutdown.clone(),
            drain_timeout,
        );
        consumers.spawn(async move { (lang, consumer.run().await) });
    }

    let http_server = tokio::spawn(run_http_server(
        config.health_port,
        pool.clone(),
        shutdown.clone(),
    ));

    while let Some(finished) = consumers.join_next().await {
        match finished {
            Ok((lang, stats)) => info!(
                lang = lang.as_str(),
                consumed = stats.consumed,
                receive_errors = stats.receive_errors,
                commit_failures = stats.commit_failures,
                abandoned = stats.abandoned,
                "Consumer finished"
            ),
            Err(e) => error!(error = %e, "Consumer task failed"),
        }
        // one consumer ending takes the other one down with it
        shutdown.cancel();
    }

    match http_server.await {
        Ok(Err(e)) => error!("HTTP server failed: {}", e),
        Err(e) => error!("HTTP server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    pool.close().await;
    info!("=== Relay Worker Stopped ===");
    Ok(())
}

/// Cancel `shutdown` on SIGTERM or Ctrl-C
async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, initiating graceful shutdown...");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("SIGINT received, initiating graceful shutdown...");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler, using Ctrl-C only");
                tokio::signal::ctrl_c().await.ok();
                info!("SIGINT received, initiating graceful shutdown...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, initiating graceful shutdown...");
    }
    shutdown.cancel();
}
