//! OAuth config entity model
//!
//! One row per OAuth-type service. The client secret column stores
//! ciphertext produced by [`crate::crypto::encrypt_client_secret`].

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use super::role::Entity as Role;
use super::service::Entity as Service;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "oauth_config")]
pub struct Model {
    /// Owning service (primary key, 1:1)
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: i32,

    /// Role assigned to users logging in through this service
    pub default_role: Option<i32>,

    pub client_id: String,

    /// AES-256-GCM ciphertext of the client secret
    #[sea_orm(column_name = "client_secret")]
    pub client_secret_ciphertext: Vec<u8>,

    pub redirect_url: String,

    pub icon_class: Option<String>,

    pub custom_provider: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Service",
        from = "Column::ServiceId",
        to = "super::service::Column::Id",
        on_delete = "Cascade"
    )]
    Service,
    #[sea_orm(
        belongs_to = "Role",
        from = "Column::DefaultRole",
        to = "super::role::Column::Id",
        on_delete = "SetNull"
    )]
    DefaultRole,
}

impl Related<Service> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<Role> for Entity {
    fn to() -> RelationDef {
        Relation::DefaultRole.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
