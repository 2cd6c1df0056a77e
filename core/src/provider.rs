//! Identity provider wiring
//!
//! Assembles resolved endpoints, the shared key set cache and the token
//! verifier for one configured provider.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::oidc::{IdTokenClaims, KeySetCache, ProviderMetadata, TokenVerifier};
use crate::platform::{Clock, HttpClient};

/// A configured identity provider and its verification state
pub struct Provider {
    pub metadata: ProviderMetadata,
    pub(crate) client_secret: String,
    pub(crate) http: Arc<dyn HttpClient>,
    verifier: TokenVerifier,
}

impl Provider {
    /// Resolve endpoints (running discovery if needed) and build the verifier
    pub async fn from_config(config: &Config, http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Result<Self> {
        let metadata = ProviderMetadata::resolve(config, http.as_ref()).await?;
        Ok(Self::new(config, metadata, http, clock))
    }

    pub fn new(config: &Config, metadata: ProviderMetadata, http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        let keys = Arc::new(KeySetCache::new(
            metadata.jwks_uri.clone(),
            config.key_cache_ttl_secs,
            config.fetch_timeout,
            http.clone(),
            clock.clone(),
        ));
        let verifier = TokenVerifier::new(keys, clock, config.accepted_algorithms.clone())
            .with_clock_skew(config.clock_skew_secs);

        Self {
            metadata,
            client_secret: config.client_secret.clone(),
            http,
            verifier,
        }
    }

    pub fn key_set(&self) -> &Arc<KeySetCache> {
        self.verifier.key_set()
    }

    /// Verify an ID token issued by this provider for this client
    pub async fn verify_id_token(&self, token: &str) -> Result<IdTokenClaims> {
        self.verifier
            .verify(token, &self.metadata.issuer, &self.metadata.client_id)
            .await
    }
}
