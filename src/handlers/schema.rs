//! # Schema API Handler

use axum::{extract::State, response::Json};

use crate::auth::OperatorAuth;
use crate::error::ApiError;
use crate::schema::{SchemaEntry, describe_schema};
use crate::server::AppState;

/// Describe the OAuth config fields for the admin UI
///
/// Returns one entry per configurable field followed by the app-role-map
/// block. The default role picklist reflects the roles active right now.
#[utoipa::path(
    get,
    path = "/oauth-config/schema",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Field schema, app-role-map block last", body = Vec<SchemaEntry>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "oauth-config"
)]
pub async fn describe_oauth_config_schema(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<Vec<SchemaEntry>>, ApiError> {
    let schema = describe_schema(&state.roles(), state.app_role_map.as_ref()).await?;
    Ok(Json(schema))
}
