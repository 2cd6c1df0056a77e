//! Authorization code exchange
//!
//! Redeems an authorization code at the provider's token endpoint. Failures
//! here are reported as `CodeExchangeFailed` and never touch the key set.

use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::provider::Provider;

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Exchange `code` for tokens using the client credentials of `provider`
pub async fn exchange_code(
    code: &str,
    redirect_uri: &str,
    code_verifier: Option<&str>,
    provider: &Provider,
) -> Result<TokenResponse> {
    let body = {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("client_id", &provider.metadata.client_id)
            .append_pair("client_secret", &provider.client_secret);
        if let Some(verifier) = code_verifier {
            form.append_pair("code_verifier", verifier);
        }
        form.finish()
    };

    let headers = [
        ("Content-Type", "application/x-www-form-urlencoded"),
        ("Accept", "application/json"),
        ("User-Agent", "idtoken-verifier"),
    ];

    tracing::info!(endpoint = %provider.metadata.token_endpoint, "exchanging authorization code");

    let response = provider
        .http
        .post(&provider.metadata.token_endpoint, &headers, body.as_bytes())
        .await
        .map_err(|e| ApiError::code_exchange_failed(format!("failed to call token endpoint: {}", e)))?;

    if response.status != 200 {
        let error_body = response.text().unwrap_or_else(|_| "unknown error".to_string());
        tracing::warn!(status = response.status, body = %error_body, "token endpoint rejected code");
        return Err(ApiError::code_exchange_failed(format!(
            "token endpoint returned HTTP {}",
            response.status
        )));
    }

    response
        .json()
        .map_err(|e| ApiError::code_exchange_failed(format!("invalid token response: {}", e)))
}
