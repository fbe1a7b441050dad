//! Migration to create the service_app_role_map table.
//!
//! Per-app role overrides for users logging in through a service. At most one
//! row per (service, app); rows go away with the service or the role.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceAppRoleMap::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ServiceAppRoleMap::ServiceId).integer().not_null())
                    .col(ColumnDef::new(ServiceAppRoleMap::AppId).integer().not_null())
                    .col(ColumnDef::new(ServiceAppRoleMap::RoleId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(ServiceAppRoleMap::ServiceId)
                            .col(ServiceAppRoleMap::AppId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_app_role_map_service_id")
                            .from(ServiceAppRoleMap::Table, ServiceAppRoleMap::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_app_role_map_role_id")
                            .from(ServiceAppRoleMap::Table, ServiceAppRoleMap::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceAppRoleMap::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceAppRoleMap {
    Table,
    ServiceId,
    AppId,
    RoleId,
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
}
