//! OAuth config repository for database operations
//!
//! Create and update take the raw JSON map from the API, run it through
//! validation and type coercion, encrypt the client secret and write the row.
//! Reads decrypt the secret back into an [`OAuthConfig`]. The per-app role
//! map lives in its own table and is written in the same transaction as the
//! config row.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::{Map, Value};

use super::RepositoryError;
use crate::crypto::{CryptoKey, decrypt_client_secret, encrypt_client_secret};
use crate::error::is_unique_violation;
use crate::fields::OAuthConfigField;
use crate::models::oauth_config::{self, Entity as OAuthConfigEntity};
use crate::models::service_app_role_map::{self, Entity as ServiceAppRoleMap};
use crate::models::{Service, role};
use crate::record::{AppRoleMapping, OAuthConfig, OAuthConfigPayload};
use crate::schema::app_role_map::APP_ROLE_MAP_FIELD;
use crate::validation::ValidationError;

/// Repository for OAuth config database operations
#[derive(Debug, Clone)]
pub struct OAuthConfigRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Key used for client secret encryption
    pub crypto_key: CryptoKey,
}

impl OAuthConfigRepository {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    /// Creates the OAuth config for `service_id`.
    ///
    /// Fails with [`RepositoryError::UnknownService`] when the service row is
    /// missing and [`RepositoryError::AlreadyExists`] when it already has a
    /// config.
    pub async fn create(
        &self,
        service_id: i32,
        config: &Map<String, Value>,
    ) -> Result<OAuthConfig, RepositoryError> {
        let payload = OAuthConfigPayload::from_map(config, true)?;

        if Service::find_by_id(service_id).one(&*self.db).await?.is_none() {
            return Err(RepositoryError::UnknownService { service_id });
        }
        self.ensure_roles_active(&payload).await?;
        if OAuthConfigEntity::find_by_id(service_id)
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(RepositoryError::AlreadyExists { service_id });
        }

        let record = OAuthConfig::from_payload(service_id, payload);
        let ciphertext = encrypt_client_secret(&self.crypto_key, service_id, &record.client_secret)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let active = oauth_config::ActiveModel {
            service_id: Set(service_id),
            default_role: Set(record.default_role),
            client_id: Set(record.client_id.clone()),
            client_secret_ciphertext: Set(ciphertext),
            redirect_url: Set(record.redirect_url.clone()),
            icon_class: Set(record.icon_class.clone()),
            custom_provider: Set(record.custom_provider),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let txn = self.db.begin().await?;
        OAuthConfigEntity::insert(active)
            .exec(&txn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepositoryError::AlreadyExists { service_id }
                } else {
                    RepositoryError::Database(err)
                }
            })?;
        replace_app_role_map(&txn, service_id, &record.app_role_map).await?;
        txn.commit().await?;

        tracing::info!(
            service_id,
            custom_provider = record.custom_provider,
            app_roles = record.app_role_map.len(),
            "OAuth config created"
        );
        Ok(record)
    }

    /// Replaces the OAuth config of `service_id`.
    ///
    /// The payload must be complete; required fields are checked the same
    /// way as on create. Leaving out `app_role_map` keeps the stored map.
    pub async fn update(
        &self,
        service_id: i32,
        config: &Map<String, Value>,
    ) -> Result<OAuthConfig, RepositoryError> {
        let payload = OAuthConfigPayload::from_map(config, false)?;

        let existing = OAuthConfigEntity::find_by_id(service_id)
            .one(&*self.db)
            .await?
            .ok_or(RepositoryError::NotFound { service_id })?;
        self.ensure_roles_active(&payload).await?;

        let keep_app_role_map = payload.app_role_map.is_none();
        let mut record = OAuthConfig::from_payload(service_id, payload);
        if keep_app_role_map {
            record.app_role_map = load_app_role_map(&*self.db, service_id).await?;
        }
        let ciphertext = encrypt_client_secret(&self.crypto_key, service_id, &record.client_secret)?;

        let mut active = existing.into_active_model();
        active.default_role = Set(record.default_role);
        active.client_id = Set(record.client_id.clone());
        active.client_secret_ciphertext = Set(ciphertext);
        active.redirect_url = Set(record.redirect_url.clone());
        active.icon_class = Set(record.icon_class.clone());
        active.custom_provider = Set(record.custom_provider);
        active.updated_at = Set(Utc::now().into());

        let txn = self.db.begin().await?;
        active.update(&txn).await?;
        if !keep_app_role_map {
            replace_app_role_map(&txn, service_id, &record.app_role_map).await?;
        }
        txn.commit().await?;

        tracing::info!(service_id, keep_app_role_map, "OAuth config updated");
        Ok(record)
    }

    /// Finds the OAuth config of `service_id`, decrypting its client secret
    pub async fn find_by_service_id(
        &self,
        service_id: i32,
    ) -> Result<Option<OAuthConfig>, RepositoryError> {
        let Some(model) = OAuthConfigEntity::find_by_id(service_id)
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let client_secret =
            decrypt_client_secret(&self.crypto_key, service_id, &model.client_secret_ciphertext)
                .map_err(|err| {
                    // Log without the ciphertext
                    tracing::error!(service_id, "Client secret decryption failed");
                    RepositoryError::Crypto(err)
                })?;
        let app_role_map = load_app_role_map(&*self.db, service_id).await?;

        Ok(Some(OAuthConfig {
            service_id: model.service_id,
            default_role: model.default_role,
            client_id: model.client_id,
            client_secret,
            redirect_url: model.redirect_url,
            icon_class: model.icon_class,
            custom_provider: model.custom_provider,
            app_role_map,
        }))
    }

    /// Like [`Self::find_by_service_id`], but a missing row is an error
    pub async fn get(&self, service_id: i32) -> Result<OAuthConfig, RepositoryError> {
        self.find_by_service_id(service_id)
            .await?
            .ok_or(RepositoryError::NotFound { service_id })
    }

    /// Deletes the OAuth config of `service_id` together with its role map
    pub async fn delete_by_service_id(&self, service_id: i32) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let result = OAuthConfigEntity::delete_by_id(service_id)
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound { service_id });
        }
        replace_app_role_map(&txn, service_id, &[]).await?;
        txn.commit().await?;

        tracing::info!(service_id, "OAuth config deleted");
        Ok(())
    }

    /// Every role the payload points at must exist and be active, the same
    /// set the schema picklist offers.
    async fn ensure_roles_active(&self, payload: &OAuthConfigPayload) -> Result<(), RepositoryError> {
        let mappings = payload.app_role_map.as_deref().unwrap_or_default();
        let wanted: BTreeSet<i32> = payload
            .default_role
            .into_iter()
            .chain(mappings.iter().map(|mapping| mapping.role_id))
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }

        let active: BTreeSet<i32> = role::Entity::find()
            .filter(role::Column::Id.is_in(wanted.iter().copied()))
            .filter(role::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();

        let mut errors = BTreeMap::new();
        if payload.default_role.is_some_and(|id| !active.contains(&id)) {
            errors.insert(
                OAuthConfigField::DefaultRole.name().to_string(),
                vec!["The selected default role is invalid.".to_string()],
            );
        }
        let bad_mappings: Vec<String> = mappings
            .iter()
            .filter(|mapping| !active.contains(&mapping.role_id))
            .map(|mapping| format!("The selected role for app {} is invalid.", mapping.app_id))
            .collect();
        if !bad_mappings.is_empty() {
            errors.insert(APP_ROLE_MAP_FIELD.to_string(), bad_mappings);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors).into())
        }
    }
}

async fn load_app_role_map<C: ConnectionTrait>(
    db: &C,
    service_id: i32,
) -> Result<Vec<AppRoleMapping>, RepositoryError> {
    let rows = ServiceAppRoleMap::find()
        .filter(service_app_role_map::Column::ServiceId.eq(service_id))
        .order_by_asc(service_app_role_map::Column::AppId)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| AppRoleMapping {
            app_id: row.app_id,
            role_id: row.role_id,
        })
        .collect())
}

/// Swaps the stored role map of `service_id` for `mappings`.
async fn replace_app_role_map<C: ConnectionTrait>(
    db: &C,
    service_id: i32,
    mappings: &[AppRoleMapping],
) -> Result<(), RepositoryError> {
    ServiceAppRoleMap::delete_many()
        .filter(service_app_role_map::Column::ServiceId.eq(service_id))
        .exec(db)
        .await?;

    if mappings.is_empty() {
        return Ok(());
    }
    let rows = mappings.iter().map(|mapping| service_app_role_map::ActiveModel {
        service_id: Set(service_id),
        app_id: Set(mapping.app_id),
        role_id: Set(mapping.role_id),
    });
    ServiceAppRoleMap::insert_many(rows).exec(db).await?;
    Ok(())
}
