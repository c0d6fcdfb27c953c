use crate::error::DbError;
use configuration::settings::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::time::Instant;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The database often comes up after the service does, so connection
/// failures are retried up to `connection.attempts` times. Each attempt
/// is padded out to the configured interval against a monotonic clock:
/// when connecting fails quickly, the loop sleeps the remainder before
/// trying again.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let url = settings.connection_url()?;
    let interval = settings.connection.interval();

    for attempt in 1..=settings.connection.attempts {
        let started = Instant::now();
        match create_pool(&url, settings).await {
            Ok(pool) => {
                tracing::debug!("Successfully connected to database");
                return Ok(pool);
            }
            Err(error) => {
                tracing::debug!(%error, attempt, "Database is not ready yet");
                tokio::time::sleep(interval.saturating_sub(started.elapsed())).await;
            }
        }
    }

    Err(DbError::RetriesExhausted {
        attempts: settings.connection.attempts,
    })
}

async fn create_pool(url: &str, settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .min_connections(settings.pool.min_size)
        .max_connections(settings.pool.max_size)
        .acquire_timeout(settings.connection.interval())
        .connect(url)
        .await
}

/// Drops and recreates the `public` schema, erasing every object in it.
///
/// This is the destructive counterpart to migrating: test environments
/// use it to reset a database to a blank slate. The migration engine
/// itself never deletes its revision bookkeeping; only this does.
pub async fn clear_schema(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    sqlx::query("DROP SCHEMA public CASCADE")
        .execute(&mut *conn)
        .await?;
    sqlx::query("CREATE SCHEMA public")
        .execute(&mut *conn)
        .await?;
    Ok(())
}
