//! Role repository for database operations

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::models::role::{self, Entity as Role};
use crate::roles::{RoleLookup, RoleSummary};

/// Repository for role database operations
#[derive(Debug, Clone)]
pub struct RoleRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl RoleRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleLookup for RoleRepository {
    type Error = DbErr;

    async fn list_active_roles(&self) -> Result<Vec<RoleSummary>, DbErr> {
        let roles = Role::find()
            .filter(role::Column::IsActive.eq(true))
            .order_by_asc(role::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(roles.into_iter().map(RoleSummary::from).collect())
    }
}
