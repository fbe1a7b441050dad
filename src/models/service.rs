//! Service entity model
//!
//! A configured service of the platform. OAuth-type services own exactly one
//! row in `oauth_config`, removed with the service.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    /// Service type, e.g. `oauth_github`
    #[sea_orm(column_name = "type")]
    pub service_type: String,

    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::oauth_config::Entity")]
    OAuthConfig,
}

impl Related<super::oauth_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OAuthConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
