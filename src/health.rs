use relay_db::DbPool;
use relay_error::RelayResult;

/// Liveness of the relay's dependencies that can be checked cheaply
pub async fn health_check(pool: &DbPool) -> RelayResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}
