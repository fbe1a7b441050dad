//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with migrations applied, plus helpers
//! for the fixture rows OAuth configs hang off.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use oauth_config::crypto::CryptoKey;
use oauth_config::models::{role, service};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::sync::Arc;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// Foreign keys stay enforced so cascades behave as they do on Postgres.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Fixed key for tests
#[allow(dead_code)]
pub fn test_crypto_key() -> CryptoKey {
    CryptoKey::new(vec![0x42; 32]).expect("valid test key")
}

/// Inserts a role and returns its ID.
#[allow(dead_code)]
pub async fn insert_role(db: &DatabaseConnection, name: &str, is_active: bool) -> Result<i32> {
    let model = role::ActiveModel {
        name: Set(name.to_string()),
        is_active: Set(is_active),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

/// Inserts an OAuth-type service and returns its ID.
#[allow(dead_code)]
pub async fn insert_service(db: &DatabaseConnection, name: &str) -> Result<i32> {
    let model = service::ActiveModel {
        name: Set(name.to_string()),
        service_type: Set(format!("oauth_{}", name)),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}
