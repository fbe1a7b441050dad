//! Declared fields of the OAuth configuration record.
//!
//! The record's column metadata lives here once, and both the validator and
//! the schema describer read from it.

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    String,
    Boolean,
}

/// A configurable field of the OAuth configuration record.
///
/// `service_id` is the owning key rather than a configurable field, so it has
/// no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthConfigField {
    DefaultRole,
    ClientId,
    ClientSecret,
    RedirectUrl,
    IconClass,
    CustomProvider,
}

impl OAuthConfigField {
    /// Every configurable field, in declaration order.
    pub const ALL: [OAuthConfigField; 6] = [
        OAuthConfigField::DefaultRole,
        OAuthConfigField::ClientId,
        OAuthConfigField::ClientSecret,
        OAuthConfigField::RedirectUrl,
        OAuthConfigField::IconClass,
        OAuthConfigField::CustomProvider,
    ];

    /// Fields that must be present and non-empty on create and update.
    pub const REQUIRED: [OAuthConfigField; 3] = [
        OAuthConfigField::ClientId,
        OAuthConfigField::ClientSecret,
        OAuthConfigField::RedirectUrl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OAuthConfigField::DefaultRole => "default_role",
            OAuthConfigField::ClientId => "client_id",
            OAuthConfigField::ClientSecret => "client_secret",
            OAuthConfigField::RedirectUrl => "redirect_url",
            OAuthConfigField::IconClass => "icon_class",
            OAuthConfigField::CustomProvider => "custom_provider",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            OAuthConfigField::DefaultRole => FieldKind::Integer,
            OAuthConfigField::CustomProvider => FieldKind::Boolean,
            OAuthConfigField::ClientId
            | OAuthConfigField::ClientSecret
            | OAuthConfigField::RedirectUrl
            | OAuthConfigField::IconClass => FieldKind::String,
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    /// Whether the column accepts NULL.
    pub fn is_nullable(self) -> bool {
        matches!(
            self,
            OAuthConfigField::DefaultRole | OAuthConfigField::IconClass
        )
    }

    /// Sensitive fields are accepted on write and never returned on read.
    pub fn is_sensitive(self) -> bool {
        matches!(self, OAuthConfigField::ClientSecret)
    }

    /// Column default, if the column declares one.
    pub fn default_value(self) -> Option<serde_json::Value> {
        match self {
            OAuthConfigField::CustomProvider => Some(serde_json::Value::Bool(false)),
            _ => None,
        }
    }
}

/// Turns a snake_case field name into a display label (`icon_class` -> `Icon Class`).
pub fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
