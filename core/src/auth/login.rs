//! Direct ID token sign-in

use serde::{Deserialize, Serialize};

use super::UserProfile;
use crate::error::{ApiError, Result};
use crate::provider::Provider;

/// Sign-in request carrying an ID token obtained by the client
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub token: String,
}

/// Sign-in response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// Verify the presented ID token and return the signed-in user
pub async fn handle(request: LoginRequest, provider: &Provider) -> Result<LoginResponse> {
    if request.token.is_empty() {
        return Err(ApiError::invalid_request("token is required"));
    }

    let claims = provider.verify_id_token(&request.token).await?;
    let user = UserProfile::from(&claims);

    tracing::info!(user = %user.id, name = %user.name, "user signed in with ID token");

    Ok(LoginResponse { success: true, user })
}
