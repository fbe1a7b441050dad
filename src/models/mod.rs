//! # Data Models
//!
//! SeaORM entities for the tables this service reads and writes, plus the
//! service information payload.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod oauth_config;
pub mod role;
pub mod service;
pub mod service_app_role_map;

pub use oauth_config::Entity as OAuthConfigEntity;
pub use role::Entity as Role;
pub use service::Entity as Service;
pub use service_app_role_map::Entity as ServiceAppRoleMap;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
