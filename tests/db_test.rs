// ============================================================================
// Database Routine Tests
// ============================================================================
//
// Exercise the stored routines against a real MySQL schema.
//
// Run with: cargo test --test db_test -- --ignored
// (requires the infobot schema and DB_HOST/DB_NAME/DB_USER/DB_PASSWORD)
//
// ============================================================================

use infobot_relay::context::SubscriberDirectory;
use infobot_relay::db::RelayStore;
use infobot_relay::message::Language;
use relay_config::DbConfig;
use relay_db::DbPool;
use serial_test::serial;
use std::env;

async fn test_pool() -> DbPool {
    let config = DbConfig {
        host: env::var("DB_HOST").unwrap_or_else(|_| "127.0.0.1:3306".to_string()),
        name: env::var("DB_NAME").unwrap_or_else(|_| "infobot_test".to_string()),
        user: env::var("DB_USER").unwrap_or_else(|_| "root".to_string()),
        password: env::var("DB_PASSWORD").unwrap_or_default(),
        max_connections: 2,
        acquire_timeout_secs: 5,
        idle_timeout_secs: 60,
    };
    relay_db::create_pool(&config)
        .await
        .expect("Failed to connect to test database")
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_read_tags_startup_check() {
    let pool = test_pool().await;

    let tags = relay_db::read_tags(&pool, 1, true, "ru").await.unwrap();

    assert!(tags.len() <= 1);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_toggle_category_makes_user_a_subscriber() {
    let pool = test_pool().await;
    let user_id = 900_000_001;

    relay_db::create_user(&pool, user_id, "relay_test", "Relay", "Test", "ru")
        .await
        .unwrap();
    let tag = relay_db::read_tags(&pool, 1, true, "ru")
        .await
        .unwrap()
        .into_iter()
        .next()
        .expect("schema has no tags");

    let store = RelayStore::new(pool.clone());
    let before = store
        .subscribers(&tag.id.to_string(), Language::Ru)
        .await
        .unwrap();

    relay_db::manage_categories(&pool, user_id, Some(tag.id))
        .await
        .unwrap();
    let after = store
        .subscribers(&tag.id.to_string(), Language::Ru)
        .await
        .unwrap();

    assert_ne!(before.contains(&user_id), after.contains(&user_id));

    // toggle back
    relay_db::manage_categories(&pool, user_id, Some(tag.id))
        .await
        .unwrap();
}
