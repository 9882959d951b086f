//! # Relay Database
//!
//! MySQL access for the relay. All business logic lives in stored routines
//! owned by the database; this crate only binds arguments and decodes results.

use relay_config::DbConfig;
use relay_error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::time::Duration;

/// Database connection pool type
pub type DbPool = Pool<MySql>;

/// Category tag as returned by `ib_tg_ReadTags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub value: String,
}

/// Create a MySQL connection pool
pub async fn create_pool(db_config: &DbConfig) -> RelayResult<DbPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(db_config.idle_timeout_secs)))
        .test_before_acquire(true)
        .connect(&db_config.url())
        .await?;

    Ok(pool)
}

/// List category tags for a language
///
/// `active_only` restricts the result to main (menu-visible) tags.
pub async fn read_tags(
    pool: &DbPool,
    limit: u32,
    active_only: bool,
    lang: &str,
) -> RelayResult<Vec<Tag>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT ib_tg_ReadTags(?, ?, ?)")
        .bind(limit)
        .bind(active_only)
        .bind(lang)
        .fetch_one(pool)
        .await?;

    parse_tags(raw.as_deref().unwrap_or("[]"))
}

/// Register a bot user (idempotent on the database side)
pub async fn create_user(
    pool: &DbPool,
    user_id: i64,
    username: &str,
    first_name: &str,
    last_name: &str,
    lang: &str,
) -> RelayResult<()> {
    sqlx::query("CALL ib_tg_CreateUser(?, ?, ?, ?, ?)")
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(lang)
        .execute(pool)
        .await?;

    Ok(())
}

/// Read or toggle a user's category subscriptions
///
/// Without `tag_id` the current categories are returned as the JSON document
/// produced by the routine. With `tag_id` the subscription is toggled and an
/// empty string is returned.
pub async fn manage_categories(
    pool: &DbPool,
    user_id: i64,
    tag_id: Option<i64>,
) -> RelayResult<String> {
    match tag_id {
        None => {
            let categories: Option<String> =
                sqlx::query_scalar("CALL ib_tg_ManageCategories(?, NULL)")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?;
            Ok(categories.unwrap_or_default())
        }
        Some(tag_id) => {
            sqlx::query("CALL ib_tg_ManageCategories(?, ?)")
                .bind(user_id)
                .bind(tag_id)
                .execute(pool)
                .await?;
            Ok(String::new())
        }
    }
}

/// Resolve the chat ids subscribed to `tag_id` in `lang`
pub async fn get_subscribers(pool: &DbPool, tag_id: &str, lang: &str) -> RelayResult<Vec<i64>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT ib_tg_GetSubscribers(?, ?)")
        .bind(tag_id)
        .bind(lang)
        .fetch_one(pool)
        .await?;

    parse_subscriber_ids(raw.as_deref().unwrap_or(""))
}

/// Store the platform message id of a relayed post
pub async fn set_message_id(
    pool: &DbPool,
    message_id: i64,
    content_id: &str,
    lang: &str,
) -> RelayResult<()> {
    let content_id = parse_content_id(content_id)?;

    sqlx::query("CALL SetTgMsg(?, ?, ?)")
        .bind(lang)
        .bind(content_id)
        .bind(message_id)
        .execute(pool)
        .await?;

    tracing::debug!(content_id, message_id, lang, "Stored platform message id");
    Ok(())
}

/// Decode the comma-joined id list returned by `ib_tg_GetSubscribers`.
/// An empty string means no subscribers.
pub fn parse_subscriber_ids(raw: &str) -> RelayResult<Vec<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|id| {
            id.trim()
                .parse::<i64>()
                .map_err(|_| RelayError::Decode(format!("invalid subscriber id {:?}", id)))
        })
        .collect()
}

/// Decode the JSON tag list returned by `ib_tg_ReadTags`
pub fn parse_tags(raw: &str) -> RelayResult<Vec<Tag>> {
    Ok(serde_json::from_str(raw)?)
}

/// Content ids travel as text in events but are integers in the database
pub fn parse_content_id(content_id: &str) -> RelayResult<i64> {
    content_id
        .parse()
        .map_err(|_| RelayError::Decode(format!("invalid content id {:?}", content_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_subscriber_list() {
        assert!(parse_subscriber_ids("").unwrap().is_empty());
        assert!(parse_subscriber_ids("  ").unwrap().is_empty());
    }

    #[test]
    fn test_subscriber_list() {
        assert_eq!(
            parse_subscriber_ids("101,202, 303").unwrap(),
            vec![101, 202, 303]
        );
    }

    #[test]
    fn test_subscriber_list_rejects_garbage() {
        let err = parse_subscriber_ids("101,abc").unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));

        assert!(parse_subscriber_ids("101,,202").is_err());
    }

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(r#"[{"id":7,"value":"Politics"},{"id":9,"value":"Sport"}]"#).unwrap();
        assert_eq!(
            tags,
            vec![
                Tag { id: 7, value: "Politics".to_string() },
                Tag { id: 9, value: "Sport".to_string() },
            ]
        );

        assert!(parse_tags("[]").unwrap().is_empty());
        assert!(matches!(parse_tags("not json"), Err(RelayError::Json(_))));
    }

    #[test]
    fn test_parse_content_id() {
        assert_eq!(parse_content_id("42").unwrap(), 42);
        assert!(parse_content_id("42a").is_err());
    }
}
