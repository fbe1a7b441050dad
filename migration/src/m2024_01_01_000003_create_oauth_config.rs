//! Migration to create the oauth_config table.
//!
//! One row per OAuth-type service. The client secret column holds AES-GCM
//! ciphertext, never the plaintext secret.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OAuthConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OAuthConfig::ServiceId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OAuthConfig::DefaultRole).integer().null())
                    .col(ColumnDef::new(OAuthConfig::ClientId).text().not_null())
                    .col(ColumnDef::new(OAuthConfig::ClientSecret).binary().not_null())
                    .col(ColumnDef::new(OAuthConfig::RedirectUrl).text().not_null())
                    .col(ColumnDef::new(OAuthConfig::IconClass).text().null())
                    .col(
                        ColumnDef::new(OAuthConfig::CustomProvider)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OAuthConfig::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OAuthConfig::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_oauth_config_service_id")
                            .from(OAuthConfig::Table, OAuthConfig::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_oauth_config_default_role")
                            .from(OAuthConfig::Table, OAuthConfig::DefaultRole)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OAuthConfig::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OAuthConfig {
    #[sea_orm(iden = "oauth_config")]
    Table,
    ServiceId,
    DefaultRole,
    ClientId,
    ClientSecret,
    RedirectUrl,
    IconClass,
    CustomProvider,
    CreatedAt,
    UpdatedAt,
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
