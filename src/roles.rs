//! Role lookup seam.
//!
//! The schema describer needs the roles an admin may pick as the default
//! role. Where they come from is up to the caller; the production
//! implementation is [`crate::repositories::RoleRepository`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An active role offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub id: i32,
    pub name: String,
}

impl From<crate::models::role::Model> for RoleSummary {
    fn from(model: crate::models::role::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Source of the currently active roles.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// Error returned by the underlying store; callers receive it unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists every active role. Implementations must not cache between calls.
    async fn list_active_roles(&self) -> Result<Vec<RoleSummary>, Self::Error>;
}
