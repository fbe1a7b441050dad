//! Database migrations for the OAuth configuration service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_01_01_000001_create_roles;
mod m2024_01_01_000002_create_services;
mod m2024_01_01_000003_create_oauth_config;
mod m2024_01_01_000004_create_service_app_role_map;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_01_01_000001_create_roles::Migration),
            Box::new(m2024_01_01_000002_create_services::Migration),
            Box::new(m2024_01_01_000003_create_oauth_config::Migration),
            Box::new(m2024_01_01_000004_create_service_app_role_map::Migration),
        ]
    }
}
