//! Database pool setup.
//!
//! Postgres in deployed profiles, SQLite for local runs and tests.

use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use tokio::time::sleep;

use crate::config::AppConfig;

const MAX_CONNECT_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database after {attempts} attempts: {source}")]
    ConnectionFailed { attempts: u32, source: DbErr },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

fn connect_options(cfg: &AppConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(cfg.database_url.trim());
    options
        .max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    options
}

/// Opens the connection pool, retrying failed connects with doubling delays.
///
/// ```no_run
/// use oauth_config::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let db = init_pool(&AppConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.trim().is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let options = connect_options(cfg);
    let mut delay = FIRST_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match Database::connect(options.clone()).await {
            Ok(conn) => {
                log::info!("Connected to database on attempt {attempt}");
                return Ok(conn);
            }
            Err(source) if attempt >= MAX_CONNECT_ATTEMPTS => {
                log::error!("Giving up on database connection: {source}");
                return Err(DatabaseError::ConnectionFailed {
                    attempts: attempt,
                    source,
                }
                .into());
            }
            Err(err) => {
                log::warn!("Database connection attempt {attempt} failed: {err}; retrying in {delay:?}");
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Runs `SELECT 1` against the pool.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    db.query_one(Statement::from_string(backend, "SELECT 1"))
        .await
        .context("Database health check failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_url_is_a_configuration_error() {
        let config = AppConfig {
            database_url: "  ".to_string(),
            ..Default::default()
        };

        let err = init_pool(&config).await.unwrap_err();
        assert!(matches!(
            err.downcast::<DatabaseError>(),
            Ok(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn health_check_passes_on_sqlite() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Default::default()
        };

        let db = init_pool(&config).await.unwrap();
        health_check(&db).await.unwrap();
    }
}
