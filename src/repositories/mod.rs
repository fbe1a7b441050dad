//! # Repository Layer
//!
//! SeaORM access for the OAuth config and role tables. Client secrets are
//! encrypted on the way in and decrypted on the way out, so callers only see
//! [`crate::record::OAuthConfig`].

use sea_orm::DbErr;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::validation::ValidationError;

pub mod oauth_config;
pub mod role;

pub use oauth_config::OAuthConfigRepository;
pub use role::RoleRepository;

/// Errors returned by repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no OAuth config for service {service_id}")]
    NotFound { service_id: i32 },
    #[error("OAuth config for service {service_id} already exists")]
    AlreadyExists { service_id: i32 },
    #[error("service {service_id} does not exist")]
    UnknownService { service_id: i32 },
    #[error("client secret crypto failure: {0}")]
    Crypto(#[from] CryptoError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}
