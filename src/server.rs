//! # Server Configuration
//!
//! Router assembly, shared state and the OpenAPI document.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::repositories::{OAuthConfigRepository, RoleRepository};
use crate::schema::{AppRoleMapSchema, DefaultAppRoleMapSchema};
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub crypto_key: CryptoKey,
    /// Source of the trailing app-role-map schema block
    pub app_role_map: Arc<dyn AppRoleMapSchema>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection, crypto_key: CryptoKey) -> Self {
        Self {
            config,
            db: Arc::new(db),
            crypto_key,
            app_role_map: Arc::new(DefaultAppRoleMapSchema),
        }
    }

    pub fn oauth_configs(&self) -> OAuthConfigRepository {
        OAuthConfigRepository::new(Arc::clone(&self.db), self.crypto_key.clone())
    }

    pub fn roles(&self) -> RoleRepository {
        RoleRepository::new(Arc::clone(&self.db))
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/oauth-config/schema",
            get(handlers::schema::describe_oauth_config_schema),
        )
        .route(
            "/services/{service_id}/oauth-config",
            get(handlers::oauth_config::get_oauth_config)
                .post(handlers::oauth_config::create_oauth_config)
                .put(handlers::oauth_config::update_oauth_config)
                .delete(handlers::oauth_config::delete_oauth_config),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::health))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
    crypto_key: CryptoKey,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), db, crypto_key);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::schema::describe_oauth_config_schema,
        crate::handlers::oauth_config::get_oauth_config,
        crate::handlers::oauth_config::create_oauth_config,
        crate::handlers::oauth_config::update_oauth_config,
        crate::handlers::oauth_config::delete_oauth_config,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::record::OAuthConfigView,
            crate::record::AppRoleMapping,
            crate::schema::SchemaEntry,
            crate::schema::FieldSchemaEntry,
            crate::schema::SchemaFieldType,
            crate::schema::PicklistValue,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "OAuth Config API",
        description = "Admin API for per-service OAuth 2.0 client configuration",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
