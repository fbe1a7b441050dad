//! The OAuth configuration record as the rest of the crate sees it.
//!
//! [`OAuthConfig`] holds the decrypted record. Serialization always goes
//! through [`OAuthConfig::to_view`] with an explicit [`FieldVisibility`], so
//! the client secret can only leave the process through a write view.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::fields::OAuthConfigField;
use crate::schema::app_role_map::APP_ROLE_MAP_FIELD;
use crate::validation::{ValidationError, validate_config};

/// OAuth client secret held in memory; wiped on drop and redacted in `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

/// Which side of the API boundary a view is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldVisibility {
    /// Responses to reads; sensitive fields are omitted.
    Read,
    /// Values headed for storage or another trusted writer; everything included.
    Write,
}

/// Role given to users logging in to one app through the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppRoleMapping {
    pub app_id: i32,
    pub role_id: i32,
}

/// Decrypted OAuth configuration for one service.
///
/// `app_role_map` is sorted by `app_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub service_id: i32,
    pub default_role: Option<i32>,
    pub client_id: String,
    pub client_secret: ClientSecret,
    pub redirect_url: String,
    pub icon_class: Option<String>,
    pub custom_provider: bool,
    pub app_role_map: Vec<AppRoleMapping>,
}

/// Serialized form of an [`OAuthConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OAuthConfigView {
    /// Owning service
    pub service_id: i32,
    /// Role assigned to users logging in through this service
    pub default_role: Option<i32>,
    /// Public client identifier issued by the provider
    pub client_id: String,
    /// Only present in write views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Redirect target after a successful login
    pub redirect_url: String,
    /// Icon shown for this service
    pub icon_class: Option<String>,
    /// Whether a custom provider is used for this OAuth type
    pub custom_provider: bool,
    /// Per-app role overrides, ordered by app
    pub app_role_map: Vec<AppRoleMapping>,
}

impl OAuthConfig {
    pub fn from_payload(service_id: i32, payload: OAuthConfigPayload) -> Self {
        Self {
            service_id,
            default_role: payload.default_role,
            client_id: payload.client_id,
            client_secret: payload.client_secret,
            redirect_url: payload.redirect_url,
            icon_class: payload.icon_class,
            custom_provider: payload.custom_provider,
            app_role_map: payload.app_role_map.unwrap_or_default(),
        }
    }

    pub fn to_view(&self, visibility: FieldVisibility) -> OAuthConfigView {
        let client_secret = (visibility == FieldVisibility::Write)
            .then(|| self.client_secret.expose().to_string());

        OAuthConfigView {
            service_id: self.service_id,
            default_role: self.default_role,
            client_id: self.client_id.clone(),
            client_secret,
            redirect_url: self.redirect_url.clone(),
            icon_class: self.icon_class.clone(),
            custom_provider: self.custom_provider,
            app_role_map: self.app_role_map.clone(),
        }
    }
}

/// A validated, typed create/update payload.
///
/// `app_role_map` is `None` when the key was absent or null, which leaves
/// the stored map untouched on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfigPayload {
    pub default_role: Option<i32>,
    pub client_id: String,
    pub client_secret: ClientSecret,
    pub redirect_url: String,
    pub icon_class: Option<String>,
    pub custom_provider: bool,
    pub app_role_map: Option<Vec<AppRoleMapping>>,
}

impl OAuthConfigPayload {
    /// Validates `config` and converts it to typed values.
    ///
    /// Required-field failures are reported first; if those pass, each field is
    /// checked against its declared type. Unknown keys are ignored.
    pub fn from_map(config: &Map<String, Value>, create: bool) -> Result<Self, ValidationError> {
        validate_config(config, create)?;
        for key in config.keys() {
            if OAuthConfigField::from_name(key).is_none() && key != APP_ROLE_MAP_FIELD {
                tracing::debug!(key = %key, "Ignoring unknown OAuth config key");
            }
        }

        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut reject = |field: OAuthConfigField, expected: &str| {
            errors.insert(
                field.name().to_string(),
                vec![format!(
                    "The {} field must be {}.",
                    field.name().replace('_', " "),
                    expected
                )],
            );
        };

        let default_role = match coerce_integer(config.get(OAuthConfigField::DefaultRole.name())) {
            Ok(value) => value,
            Err(()) => {
                reject(OAuthConfigField::DefaultRole, "an integer");
                None
            }
        };
        let client_id = required_string(config, OAuthConfigField::ClientId, &mut reject);
        let client_secret = required_string(config, OAuthConfigField::ClientSecret, &mut reject);
        let redirect_url = required_string(config, OAuthConfigField::RedirectUrl, &mut reject);
        let icon_class = match config.get(OAuthConfigField::IconClass.name()) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                reject(OAuthConfigField::IconClass, "a string");
                None
            }
        };
        let custom_provider =
            match coerce_boolean(config.get(OAuthConfigField::CustomProvider.name())) {
                Ok(value) => value,
                Err(()) => {
                    reject(OAuthConfigField::CustomProvider, "true or false");
                    false
                }
            };
        let app_role_map = match parse_app_role_map(config.get(APP_ROLE_MAP_FIELD)) {
            Ok(mappings) => mappings,
            Err(message) => {
                errors.insert(APP_ROLE_MAP_FIELD.to_string(), vec![message]);
                None
            }
        };

        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        Ok(Self {
            default_role,
            client_id,
            client_secret: ClientSecret::new(client_secret),
            redirect_url,
            icon_class,
            custom_provider,
            app_role_map,
        })
    }
}

/// Accepts an array of `{app_id, role_id}` objects, one per app. IDs are
/// coerced the same way as `default_role`.
fn parse_app_role_map(value: Option<&Value>) -> Result<Option<Vec<AppRoleMapping>>, String> {
    const SHAPE: &str = "The app role map field must be a list of app_id and role_id pairs.";

    let items = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(SHAPE.to_string()),
    };

    let mut mappings: Vec<AppRoleMapping> = Vec::with_capacity(items.len());
    for item in items {
        let id = |key: &str| coerce_integer(item.get(key)).ok().flatten();
        let (Some(app_id), Some(role_id)) = (id("app_id"), id("role_id")) else {
            return Err(SHAPE.to_string());
        };
        if mappings.iter().any(|mapping| mapping.app_id == app_id) {
            return Err(format!(
                "The app role map field lists app {app_id} more than once."
            ));
        }
        mappings.push(AppRoleMapping { app_id, role_id });
    }
    mappings.sort_by_key(|mapping| mapping.app_id);
    Ok(Some(mappings))
}

fn required_string(
    config: &Map<String, Value>,
    field: OAuthConfigField,
    reject: &mut impl FnMut(OAuthConfigField, &str),
) -> String {
    match config.get(field.name()) {
        Some(Value::String(s)) => s.clone(),
        _ => {
            reject(field, "a string");
            String::new()
        }
    }
}

fn coerce_integer(value: Option<&Value>) -> Result<Option<i32>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or(()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i32>().map(Some).map_err(|_| ()),
        Some(_) => Err(()),
    }
}

fn coerce_boolean(value: Option<&Value>) -> Result<bool, ()> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(()),
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(()),
        },
        Some(_) => Err(()),
    }
}
