//! # Authentication
//!
//! Operator bearer authentication for the admin endpoints. Any token listed
//! in `OAUTHCFG_OPERATOR_TOKENS` is accepted; comparison is constant time.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// Proof that the auth middleware accepted the request. Handlers take it as
/// an extractor so an unprotected route cannot reach them by mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAuth;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.config)
    }
}

/// Why a request was turned away. Only the message reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingHeader,
    UnreadableHeader,
    NotBearer,
    UnknownToken,
}

impl Rejection {
    fn message(self) -> &'static str {
        match self {
            Self::MissingHeader => "Missing Authorization header",
            Self::UnreadableHeader => "Invalid Authorization header",
            Self::NotBearer => "Authorization header must use Bearer scheme",
            Self::UnknownToken => "Invalid bearer token",
        }
    }
}

fn authenticate(headers: &HeaderMap, accepted: &[String]) -> Result<OperatorAuth, Rejection> {
    let value = headers.get(AUTHORIZATION).ok_or(Rejection::MissingHeader)?;
    let value = value.to_str().map_err(|_| Rejection::UnreadableHeader)?;
    let presented = value.strip_prefix("Bearer ").ok_or(Rejection::NotBearer)?;

    // Fold over every token so timing does not reveal which one matched.
    let matched = accepted.iter().fold(subtle::Choice::from(0), |found, token| {
        found | presented.as_bytes().ct_eq(token.as_bytes())
    });
    if bool::from(matched) {
        Ok(OperatorAuth)
    } else {
        Err(Rejection::UnknownToken)
    }
}

/// Route layer guarding the admin API.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match authenticate(request.headers(), &config.operator_tokens) {
        Ok(auth) => {
            tracing::debug!(path = %request.uri().path(), "Operator authenticated");
            request.extensions_mut().insert(auth);
            Ok(next.run(request).await)
        }
        Err(rejection) => {
            tracing::warn!(reason = ?rejection, path = %request.uri().path(), "Request rejected");
            Err(unauthorized(Some(rejection.message())))
        }
    }
}

impl<S: Sync> FromRequestParts<S> for OperatorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        parts
            .extensions
            .get::<OperatorAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Operator authentication required")))
    }
}
