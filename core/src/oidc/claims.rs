//! ID token claims

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claims carried by a verified ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer
    pub iss: String,

    /// Subject
    pub sub: String,

    /// Audience as issued, string or array
    pub aud: Audience,

    /// Expiration time
    pub exp: u64,

    /// Issued at
    pub iat: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Additional claims
    #[serde(flatten)]
    pub custom_claims: HashMap<String, serde_json::Value>,
}

impl IdTokenClaims {
    /// Best available human-readable name: `name`, then given + family name,
    /// then `preferred_username`, falling back to the subject.
    pub fn display_name(&self) -> String {
        if let Some(name) = non_empty(&self.name) {
            return name.to_string();
        }

        if let (Some(given), Some(family)) = (non_empty(&self.given_name), non_empty(&self.family_name)) {
            return format!("{} {}", given, family);
        }

        non_empty(&self.preferred_username)
            .unwrap_or(&self.sub)
            .to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// `aud` claim in the shape the issuer sent it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// True only for a single-string audience equal to `expected`
    pub fn is_exactly(&self, expected: &str) -> bool {
        matches!(self, Audience::Single(aud) if aud == expected)
    }
}
