//! OIDC Discovery document fetching
//!
//! Resolves the provider endpoints that were not configured explicitly.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::platform::HttpClient;

/// OIDC Discovery document (partial)
#[derive(Deserialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub token_endpoint: Option<String>,
    #[serde(default)]
    pub authorization_endpoint: Option<String>,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
}

/// Resolved provider endpoints plus the public parameters a client needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    pub issuer: String,
    pub client_id: String,
    pub jwks_uri: String,
    pub token_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    pub scopes_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
}

impl ProviderMetadata {
    /// Use configured endpoints, falling back to the issuer's discovery
    /// document for any that are missing. Discovery is skipped entirely
    /// when every endpoint is configured.
    pub async fn resolve(config: &Config, http: &dyn HttpClient) -> Result<Self> {
        let fully_configured = config.jwks_uri.is_some()
            && config.token_endpoint.is_some()
            && config.authorization_endpoint.is_some()
            && config.userinfo_endpoint.is_some();

        let discovered = if fully_configured {
            None
        } else {
            Some(fetch_discovery(&config.issuer, http).await?)
        };

        let jwks_uri = config
            .jwks_uri
            .clone()
            .or_else(|| discovered.as_ref().map(|d| d.jwks_uri.clone()))
            .ok_or_else(|| ApiError::internal("no key set URI configured or discovered"))?;

        let token_endpoint = config
            .token_endpoint
            .clone()
            .or_else(|| discovered.as_ref().and_then(|d| d.token_endpoint.clone()))
            .ok_or_else(|| ApiError::internal("no token endpoint configured or discovered"))?;

        Ok(Self {
            issuer: config.issuer.clone(),
            client_id: config.client_id.clone(),
            jwks_uri,
            token_endpoint,
            authorization_endpoint: config
                .authorization_endpoint
                .clone()
                .or_else(|| discovered.as_ref().and_then(|d| d.authorization_endpoint.clone())),
            userinfo_endpoint: config
                .userinfo_endpoint
                .clone()
                .or_else(|| discovered.as_ref().and_then(|d| d.userinfo_endpoint.clone())),
            scopes_supported: ["openid", "profile", "email"].map(String::from).to_vec(),
            response_types_supported: ["code", "id_token", "code id_token"].map(String::from).to_vec(),
        })
    }
}

/// Fetch OIDC discovery document for an issuer
pub async fn fetch_discovery(issuer: &str, http: &dyn HttpClient) -> Result<DiscoveryDocument> {
    validate_issuer_url(issuer)?;

    let discovery_url = format!("{}/.well-known/openid-configuration", issuer.trim_end_matches('/'));
    tracing::info!(url = %discovery_url, "fetching discovery document");

    let response = http
        .get(
            &discovery_url,
            &[
                ("Accept", "application/json"),
                ("User-Agent", "idtoken-verifier"),
            ],
        )
        .await
        .map_err(|e| ApiError::upstream_error(format!("failed to fetch discovery document: {}", e)))?;

    if response.status != 200 {
        return Err(ApiError::upstream_error(format!(
            "failed to fetch discovery document: HTTP {}",
            response.status
        )));
    }

    let doc: DiscoveryDocument = response
        .json()
        .map_err(|e| ApiError::upstream_error(format!("invalid discovery document: {}", e)))?;

    // Verify issuer matches
    if doc.issuer != issuer && doc.issuer.trim_end_matches('/') != issuer.trim_end_matches('/') {
        return Err(ApiError::upstream_error(format!(
            "issuer mismatch: expected '{}', got '{}'",
            issuer, doc.issuer
        )));
    }

    Ok(doc)
}

/// Validate issuer URL format per RFC 8414 and OpenID Connect Core 1.0
fn validate_issuer_url(issuer: &str) -> Result<()> {
    let url = url::Url::parse(issuer).map_err(|_| ApiError::internal("invalid issuer URL"))?;

    let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]"));
    if url.scheme() != "https" && !is_localhost {
        return Err(ApiError::internal("issuer must use HTTPS"));
    }

    if url.query().is_some() {
        return Err(ApiError::internal("issuer URL must not have query string"));
    }

    if url.fragment().is_some() {
        return Err(ApiError::internal("issuer URL must not have fragment"));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(ApiError::internal("issuer URL must not have userinfo"));
    }

    Ok(())
}
