//! # OAuth Config Service Library
//!
//! Per-service OAuth 2.0 client configuration: the stored record, its
//! validation, the admin UI schema describing it, and the HTTP API around
//! them.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod fields;
pub mod handlers;
pub mod models;
pub mod record;
pub mod repositories;
pub mod roles;
pub mod schema;
pub mod server;
pub mod telemetry;
pub mod validation;
pub use migration;
