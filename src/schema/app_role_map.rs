//! Schema block for the per-app role map shown under the OAuth fields.

use serde_json::{Value, json};

/// Payload and view key carrying the per-app role map.
pub const APP_ROLE_MAP_FIELD: &str = "app_role_map";

/// Supplies the app-role-map block appended to the OAuth config schema.
pub trait AppRoleMapSchema: Send + Sync {
    fn config_schema(&self) -> Value;
}

/// Block describing a list of `{app_id, role_id}` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAppRoleMapSchema;

impl AppRoleMapSchema for DefaultAppRoleMapSchema {
    fn config_schema(&self) -> Value {
        json!({
            "name": APP_ROLE_MAP_FIELD,
            "label": "Role per App",
            "description": "Select a desired role for users logging in through each app. \
                            Apps without an entry use the default role.",
            "type": "array",
            "required": false,
            "allow_null": true,
            "items": [
                {
                    "name": "app_id",
                    "label": "App",
                    "type": "integer",
                    "required": true,
                    "allow_null": false
                },
                {
                    "name": "role_id",
                    "label": "Role",
                    "type": "integer",
                    "required": true,
                    "allow_null": false
                }
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_block_shape() {
        let block = DefaultAppRoleMapSchema.config_schema();
        assert_eq!(block["name"], "app_role_map");
        assert_eq!(block["type"], "array");
        let items: Vec<_> = block["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["name"].as_str().unwrap())
            .collect();
        assert_eq!(items, vec!["app_id", "role_id"]);
    }
}
