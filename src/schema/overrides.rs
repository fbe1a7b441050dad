//! Per-field adjustments applied on top of the generic schema entries.

use super::{FieldSchemaEntry, PicklistValue, SchemaFieldType};
use crate::fields::OAuthConfigField;
use crate::roles::RoleSummary;

/// Data an override may read while adjusting its entry.
#[derive(Debug, Clone, Copy)]
pub struct OverrideContext<'a> {
    pub active_roles: &'a [RoleSummary],
}

pub type FieldOverride = fn(FieldSchemaEntry, &OverrideContext<'_>) -> FieldSchemaEntry;

/// Returns the override for `field`. Every declared field has one.
pub fn override_for(field: OAuthConfigField) -> FieldOverride {
    match field {
        OAuthConfigField::DefaultRole => default_role,
        OAuthConfigField::ClientId => client_id,
        OAuthConfigField::ClientSecret => client_secret,
        OAuthConfigField::RedirectUrl => redirect_url,
        OAuthConfigField::IconClass => icon_class,
        OAuthConfigField::CustomProvider => custom_provider,
    }
}

fn default_role(mut entry: FieldSchemaEntry, ctx: &OverrideContext<'_>) -> FieldSchemaEntry {
    entry.field_type = SchemaFieldType::Picklist;
    entry.values = Some(ctx.active_roles.iter().map(PicklistValue::from).collect());
    entry.description = Some(
        "Select a default role for users logging in with this OAuth service type.".to_string(),
    );
    entry
}

fn client_id(mut entry: FieldSchemaEntry, _: &OverrideContext<'_>) -> FieldSchemaEntry {
    entry.label = "Client ID".to_string();
    entry.description = Some(
        "A public string used by the service to identify your app and to build authorization URLs."
            .to_string(),
    );
    entry
}

fn client_secret(mut entry: FieldSchemaEntry, _: &OverrideContext<'_>) -> FieldSchemaEntry {
    entry.description = Some(
        "A private string used by the service to authenticate the identity of the application."
            .to_string(),
    );
    entry
}

fn redirect_url(mut entry: FieldSchemaEntry, _: &OverrideContext<'_>) -> FieldSchemaEntry {
    entry.label = "Redirect URL".to_string();
    entry.description = Some(
        "The location the user will be redirected to after a successful login.".to_string(),
    );
    entry
}

fn icon_class(mut entry: FieldSchemaEntry, _: &OverrideContext<'_>) -> FieldSchemaEntry {
    entry.description = Some("The icon to display for this OAuth service.".to_string());
    entry
}

fn custom_provider(mut entry: FieldSchemaEntry, _: &OverrideContext<'_>) -> FieldSchemaEntry {
    entry.label = "Use custom OAuth 2.0 provider for this type".to_string();
    entry.description = Some(
        "Some OAuth 2.0 type allows for custom/alternative provider in DreamFactory. \
         Check this if your OAuth type supports alternate provider and you want to use that."
            .to_string(),
    );
    entry
}
