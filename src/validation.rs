//! Required-field validation for OAuth configuration payloads.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ErrorType;
use crate::fields::OAuthConfigField;

/// Payload rejected because one or more fields failed validation.
///
/// `errors` maps each failing field name to its messages.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            message: "Validation failed.".to_string(),
            errors,
        }
    }

    /// Validation failures always surface as a bad request.
    pub fn kind(&self) -> ErrorType {
        ErrorType::BadRequest
    }

    /// Names of the fields that failed, in sorted order.
    pub fn failed_fields(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }
}

/// Checks that `client_id`, `client_secret` and `redirect_url` are present and non-empty.
///
/// Updates are held to the same rule as creates: a partial update that omits
/// a required field is rejected. Keys that are not configuration fields are
/// ignored.
pub fn validate_config(config: &Map<String, Value>, create: bool) -> Result<(), ValidationError> {
    let mut errors = BTreeMap::new();

    for field in OAuthConfigField::REQUIRED {
        let name = field.name();
        if config.get(name).is_none_or(is_blank) {
            errors.insert(name.to_string(), vec![required_message(name)]);
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    let error = ValidationError::new(errors);
    tracing::debug!(
        create,
        fields = ?error.failed_fields(),
        "OAuth config failed validation"
    );
    Err(error)
}

fn required_message(name: &str) -> String {
    format!("The {} field is required.", name.replace('_', " "))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
