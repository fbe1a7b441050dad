//! # Error Handling
//!
//! Every failure leaving the HTTP layer is an [`ApiError`], rendered as
//! `application/problem+json` and stamped with the request's trace ID.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::repositories::RepositoryError;
use crate::telemetry;
use crate::validation::ValidationError;

const PROBLEM_JSON: &str = "application/problem+json";

/// Problem response body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Stable machine-readable code, e.g. `VALIDATION_FAILED`
    pub code: Box<str>,
    pub message: Box<str>,
    /// Per-field messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Some(Self::trace_id_for_response()),
        }
    }

    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// The request's trace ID, or a short `corr-` ID when none is in scope.
    fn trace_id_for_response() -> Box<str> {
        match telemetry::current_trace_id() {
            Some(trace_id) => trace_id.into_boxed_str(),
            None => {
                let generated = uuid::Uuid::new_v4().simple().to_string();
                format!("corr-{}", &generated[..8]).into_boxed_str()
            }
        }
    }
}

/// Returns true when the database rejected a write because of a unique or primary key.
pub fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::{DbErr, RuntimeErr};

    // Postgres unique_violation, SQLite PRIMARYKEY and UNIQUE constraint codes
    const UNIQUE_CODES: [&str; 3] = ["23505", "1555", "2067"];

    let (DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))) = error
    else {
        return false;
    };

    sqlx_err.as_database_error().is_some_and(|db_error| {
        db_error.is_unique_violation()
            || db_error
                .code()
                .is_some_and(|code| UNIQUE_CODES.contains(&code.as_ref()))
    })
}

/// Coarse error categories with a fixed status and code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorType {
    #[error("Bad Request")]
    BadRequest,
    #[error("Not Found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    pub fn status_code(self) -> StatusCode {
        self.parts().0
    }

    pub fn error_code(self) -> &'static str {
        self.parts().1
    }

    fn parts(self) -> (StatusCode, &'static str) {
        match self {
            ErrorType::BadRequest => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            ErrorType::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorType::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorType::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
            ErrorType::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        }
    }

    fn with_message(self, message: &str) -> ApiError {
        ApiError::new(self.status_code(), self.error_code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut response = (status, axum::Json(self)).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        response
    }
}

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        error_type.with_message(&error_type.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        let details = serde_json::to_value(&error.errors).unwrap_or_default();
        error
            .kind()
            .with_message(&error.message)
            .with_details(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let reason = match &rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "Request body must be a JSON object",
            JsonRejection::MissingJsonContentType(_) => {
                "Expected 'Content-Type: application/json'"
            }
            _ => "Request body could not be read",
        };
        tracing::debug!(error = %rejection, "Rejected request body");

        ErrorType::BadRequest
            .with_message(reason)
            .with_details(json!({ "body": [rejection.body_text()] }))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected path parameters");

        ErrorType::BadRequest
            .with_message("Path parameters are not valid")
            .with_details(json!({ "path": [rejection.body_text()] }))
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation");
            return ErrorType::Conflict.with_message("Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => {
                ErrorType::NotFound.with_message(&format!("Record not found: {}", record))
            }
            sea_orm::DbErr::Conn(err) => {
                tracing::error!(error = ?err, "Database connection error");
                ErrorType::ServiceUnavailable.with_message("Database service unavailable")
            }
            other => {
                tracing::error!(error = ?other, "Database error");
                ErrorType::InternalServerError.with_message("Database error occurred")
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Validation(err) => err.into(),
            RepositoryError::NotFound { service_id } => ErrorType::NotFound
                .with_message(&format!("No OAuth config for service {}", service_id)),
            RepositoryError::AlreadyExists { service_id } => ErrorType::Conflict.with_message(
                &format!("OAuth config for service {} already exists", service_id),
            ),
            RepositoryError::UnknownService { service_id } => validation_error(
                "Validation failed.",
                json!({ "service_id": [format!("Service {} does not exist.", service_id)] }),
            ),
            RepositoryError::Crypto(err) => {
                tracing::error!(error = %err, "Client secret crypto failure");
                ErrorType::InternalServerError.into()
            }
            RepositoryError::Database(err) => err.into(),
        }
    }
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ErrorType::BadRequest
        .with_message(message)
        .with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_error_type_mapping() {
        let not_found: ApiError = ErrorType::NotFound.into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.code, Box::from("NOT_FOUND"));
        assert_eq!(not_found.message, Box::from("Not Found"));

        let unavailable: ApiError = ErrorType::ServiceUnavailable.into();
        assert_eq!(unavailable.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_from_validation_error_keeps_field_messages() {
        let mut errors = BTreeMap::new();
        errors.insert(
            "client_secret".to_string(),
            vec!["The client secret field is required.".to_string()],
        );
        let api_error: ApiError = ValidationError::new(errors).into();

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(api_error.message, Box::from("Validation failed."));
        assert_eq!(
            api_error.details,
            Some(Box::new(json!({
                "client_secret": ["The client secret field is required."]
            })))
        );
    }

    #[test]
    fn test_from_repository_errors() {
        let api_error: ApiError = RepositoryError::NotFound { service_id: 4 }.into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert!(api_error.message.contains('4'));

        let api_error: ApiError = RepositoryError::AlreadyExists { service_id: 4 }.into();
        assert_eq!(api_error.status, StatusCode::CONFLICT);

        let api_error: ApiError = RepositoryError::UnknownService { service_id: 9 }.into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert!(api_error.details.unwrap().get("service_id").is_some());

        let api_error: ApiError =
            RepositoryError::Crypto(crate::crypto::CryptoError::InvalidFormat).into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.message.contains("format"));
    }

    #[test]
    fn test_response_is_problem_json() {
        let response = ErrorType::Conflict.with_message("taken").into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), PROBLEM_JSON);
    }

    #[test]
    fn test_trace_id_falls_back_to_correlation_id() {
        let error = ErrorType::InternalServerError.with_message("boom");

        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[tokio::test]
    async fn test_trace_id_taken_from_request_scope() {
        let context = telemetry::TraceContext {
            trace_id: "req-42".to_string(),
        };
        let error = telemetry::with_trace_context(context, async {
            ErrorType::NotFound.with_message("gone")
        })
        .await;

        assert_eq!(error.trace_id.as_deref(), Some("req-42"));
    }

    #[test]
    fn test_record_not_found_maps_to_404() {
        let api_error: ApiError = sea_orm::DbErr::RecordNotFound("oauth_config".to_string()).into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert!(api_error.message.contains("oauth_config"));
    }

    #[test]
    fn test_unauthorized_helper() {
        let auth_error = unauthorized(None);
        assert_eq!(auth_error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(auth_error.message, Box::from("Authentication required"));

        let custom = unauthorized(Some("Invalid token"));
        assert_eq!(custom.message, Box::from("Invalid token"));
    }
}
