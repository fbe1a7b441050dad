//! # OAuth Config API Handlers
//!
//! CRUD for the OAuth config owned by a service. Request bodies are taken as
//! a raw JSON object so validation can report every missing field at once.
//! Responses always use the read view, which never includes the client secret.

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde_json::{Map, Value};

use crate::auth::OperatorAuth;
use crate::error::ApiError;
use crate::record::{FieldVisibility, OAuthConfigView};
use crate::server::AppState;

/// Get the OAuth config of a service
#[utoipa::path(
    get,
    path = "/services/{service_id}/oauth-config",
    security(("bearer_auth" = [])),
    params(("service_id" = i32, Path, description = "Owning service ID")),
    responses(
        (status = 200, description = "OAuth config without the client secret", body = OAuthConfigView),
        (status = 400, description = "Service ID is not an integer", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Service has no OAuth config", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "oauth-config"
)]
pub async fn get_oauth_config(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<OAuthConfigView>, ApiError> {
    let Path(service_id) = path?;
    let config = state.oauth_configs().get(service_id).await?;
    Ok(Json(config.to_view(FieldVisibility::Read)))
}

/// Create the OAuth config of a service
#[utoipa::path(
    post,
    path = "/services/{service_id}/oauth-config",
    security(("bearer_auth" = [])),
    params(("service_id" = i32, Path, description = "Owning service ID")),
    request_body(content = Value, description = "client_id, client_secret and redirect_url are required"),
    responses(
        (status = 201, description = "OAuth config created", body = OAuthConfigView),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Service already has an OAuth config", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "oauth-config"
)]
pub async fn create_oauth_config(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<OAuthConfigView>), ApiError> {
    let Path(service_id) = path?;
    let Json(config) = payload?;
    let created = state.oauth_configs().create(service_id, &config).await?;
    Ok((
        StatusCode::CREATED,
        Json(created.to_view(FieldVisibility::Read)),
    ))
}

/// Replace the OAuth config of a service
#[utoipa::path(
    put,
    path = "/services/{service_id}/oauth-config",
    security(("bearer_auth" = [])),
    params(("service_id" = i32, Path, description = "Owning service ID")),
    request_body(content = Value, description = "Complete config; required fields as on create"),
    responses(
        (status = 200, description = "OAuth config updated", body = OAuthConfigView),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Service has no OAuth config", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "oauth-config"
)]
pub async fn update_oauth_config(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<OAuthConfigView>, ApiError> {
    let Path(service_id) = path?;
    let Json(config) = payload?;
    let updated = state.oauth_configs().update(service_id, &config).await?;
    Ok(Json(updated.to_view(FieldVisibility::Read)))
}

/// Delete the OAuth config of a service
#[utoipa::path(
    delete,
    path = "/services/{service_id}/oauth-config",
    security(("bearer_auth" = [])),
    params(("service_id" = i32, Path, description = "Owning service ID")),
    responses(
        (status = 204, description = "OAuth config deleted"),
        (status = 400, description = "Service ID is not an integer", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Service has no OAuth config", body = ApiError)
    ),
    tag = "oauth-config"
)]
pub async fn delete_oauth_config(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(service_id) = path?;
    state.oauth_configs().delete_by_service_id(service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
