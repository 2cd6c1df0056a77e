//! Authorization code callback
//!
//! Redeems the code at the token endpoint and verifies the returned ID token.

use serde::{Deserialize, Serialize};

use super::exchange::exchange_code;
use super::UserProfile;
use crate::error::{ApiError, Result};
use crate::provider::Provider;

/// Callback request relayed by the client after the provider redirect
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub code_verifier: Option<String>,
}

/// Callback response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub success: bool,
    pub user: UserProfile,
    pub id_token: String,
}

/// Exchange the authorization code and sign the user in
pub async fn handle(request: CallbackRequest, provider: &Provider) -> Result<CallbackResponse> {
    if request.code.is_empty() {
        return Err(ApiError::invalid_request("authorization code is required"));
    }

    let tokens = exchange_code(
        &request.code,
        &request.redirect_uri,
        request.code_verifier.as_deref(),
        provider,
    )
    .await?;

    let id_token = tokens
        .id_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::code_exchange_failed("token response has no id_token"))?;

    let claims = provider.verify_id_token(&id_token).await?;
    let user = UserProfile::from(&claims);

    tracing::info!(user = %user.id, name = %user.name, "user signed in via authorization code");

    Ok(CallbackResponse {
        success: true,
        user,
        id_token,
    })
}
