//! Admin UI schema for the OAuth configuration record.
//!
//! Each configurable field gets a generic entry derived from its column
//! metadata, which is then passed through that field's override in
//! [`overrides`]. The app-role-map block is appended last, untouched.

pub mod app_role_map;
pub mod overrides;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::fields::{FieldKind, OAuthConfigField, humanize};
use crate::roles::{RoleLookup, RoleSummary};

pub use app_role_map::{AppRoleMapSchema, DefaultAppRoleMapSchema};
pub use overrides::{FieldOverride, OverrideContext, override_for};

/// UI widget type of a schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFieldType {
    Integer,
    String,
    Boolean,
    /// Single choice out of `values`
    Picklist,
}

impl From<FieldKind> for SchemaFieldType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer => SchemaFieldType::Integer,
            FieldKind::String => SchemaFieldType::String,
            FieldKind::Boolean => SchemaFieldType::Boolean,
        }
    }
}

/// One selectable option of a picklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PicklistValue {
    pub label: String,
    pub name: i32,
}

impl From<&RoleSummary> for PicklistValue {
    fn from(role: &RoleSummary) -> Self {
        Self {
            label: role.name.clone(),
            name: role.id,
        }
    }
}

/// UI metadata for one configurable field. Never carries a stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSchemaEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: SchemaFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<PicklistValue>>,
    pub required: bool,
    pub allow_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub default: Option<Value>,
}

impl FieldSchemaEntry {
    /// Entry derived from the column metadata alone, before any override.
    pub fn generic(field: OAuthConfigField) -> Self {
        Self {
            name: field.name().to_string(),
            field_type: field.kind().into(),
            label: humanize(field.name()),
            description: None,
            values: None,
            required: field.is_required(),
            allow_null: field.is_nullable(),
            default: field.default_value(),
        }
    }
}

/// An element of the described schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SchemaEntry {
    Field(FieldSchemaEntry),
    /// Block supplied by another component, passed through verbatim
    Block(Value),
}

impl SchemaEntry {
    pub fn as_field(&self) -> Option<&FieldSchemaEntry> {
        match self {
            SchemaEntry::Field(entry) => Some(entry),
            SchemaEntry::Block(_) => None,
        }
    }
}

/// Builds the schema from an already fetched list of active roles.
pub fn describe_schema_with_roles<A>(active_roles: &[RoleSummary], app_role_map: &A) -> Vec<SchemaEntry>
where
    A: AppRoleMapSchema + ?Sized,
{
    let context = OverrideContext { active_roles };

    let mut schema: Vec<SchemaEntry> = OAuthConfigField::ALL
        .into_iter()
        .map(|field| {
            let apply = override_for(field);
            SchemaEntry::Field(apply(FieldSchemaEntry::generic(field), &context))
        })
        .collect();

    schema.push(SchemaEntry::Block(app_role_map.config_schema()));
    schema
}

/// Describes the OAuth configuration fields for the admin UI.
///
/// Active roles are read from `roles` on every call. A lookup failure is
/// returned as-is.
pub async fn describe_schema<R, A>(roles: &R, app_role_map: &A) -> Result<Vec<SchemaEntry>, R::Error>
where
    R: RoleLookup + ?Sized,
    A: AppRoleMapSchema + ?Sized,
{
    let active_roles = roles.list_active_roles().await?;
    tracing::debug!(
        active_roles = active_roles.len(),
        "Describing OAuth config schema"
    );
    Ok(describe_schema_with_roles(&active_roles, app_role_map))
}
