//! Sign-in flows built on ID token verification
//!
//! `login` verifies a token the client already holds; `callback` redeems an
//! authorization code first.

pub mod callback;
pub mod exchange;
pub mod login;

use serde::Serialize;

use crate::oidc::IdTokenClaims;

/// User identity extracted from verified claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<&IdTokenClaims> for UserProfile {
    fn from(claims: &IdTokenClaims) -> Self {
        Self {
            id: claims.sub.clone(),
            name: claims.display_name(),
            email: claims.email.clone(),
            username: claims.preferred_username.clone(),
        }
    }
}
