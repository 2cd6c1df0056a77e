//! ID token verification
//!
//! Verifies the signature of a compact RS256 token against the provider's key
//! set, then checks expiry, issuer and audience. Each step short-circuits
//! with its own error kind.

use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::Algorithm;

use super::claims::IdTokenClaims;
use super::header::{base64_url_decode, decode_header, split};
use super::keyset::KeySetCache;
use crate::error::{ApiError, Result};
use crate::platform::Clock;

/// Validated claims or the reason verification failed
pub type VerificationOutcome = Result<IdTokenClaims>;

/// Token verifier bound to one provider key set
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    clock: Arc<dyn Clock>,
    accepted_algorithms: Vec<Algorithm>,
    clock_skew_secs: u64,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeySetCache>, clock: Arc<dyn Clock>, accepted_algorithms: Vec<Algorithm>) -> Self {
        Self {
            keys,
            clock,
            accepted_algorithms,
            clock_skew_secs: 0,
        }
    }

    /// Tolerate `exp` being up to `secs` in the past
    pub fn with_clock_skew(mut self, secs: u64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    pub fn key_set(&self) -> &Arc<KeySetCache> {
        &self.keys
    }

    /// Verify `token` and return its claims
    pub async fn verify(&self, token: &str, expected_issuer: &str, expected_audience: &str) -> VerificationOutcome {
        let header = decode_header(token)?;

        // The header is attacker-controlled; only allow-listed algorithms proceed
        let alg = Algorithm::from_str(&header.alg)
            .ok()
            .filter(|alg| self.accepted_algorithms.contains(alg))
            .ok_or_else(|| ApiError::unsupported_algorithm(format!("'{}' is not accepted", header.alg)))?;

        let key = self.keys.get_key(&header.kid).await?;

        if let Some(pinned) = key.alg {
            if pinned != alg {
                return Err(ApiError::invalid_signature(format!(
                    "key '{}' is bound to {:?}, token declares {:?}",
                    key.kid, pinned, alg
                )));
            }
        }

        let parts = split(token)?;
        let valid = jsonwebtoken::crypto::verify(
            parts.signature,
            parts.signing_input.as_bytes(),
            &key.decoding_key,
            alg,
        )
        .map_err(|e| ApiError::invalid_signature(e.to_string()))?;

        if !valid {
            return Err(ApiError::invalid_signature("signature does not match"));
        }

        let payload = base64_url_decode(parts.payload)?;
        let claims: IdTokenClaims = serde_json::from_slice(&payload)
            .map_err(|e| ApiError::malformed_token(format!("invalid claims: {}", e)))?;

        self.validate_claims(&claims, expected_issuer, expected_audience)?;

        tracing::info!(sub = %claims.sub, kid = %header.kid, "token verified");
        Ok(claims)
    }

    fn validate_claims(&self, claims: &IdTokenClaims, expected_issuer: &str, expected_audience: &str) -> Result<()> {
        let now_secs = self.clock.now_secs();

        if claims.exp.saturating_add(self.clock_skew_secs) <= now_secs {
            return Err(ApiError::token_expired(format!("expired at {}", claims.exp)));
        }

        if claims.iss != expected_issuer {
            return Err(ApiError::invalid_issuer(format!(
                "expected '{}', got '{}'",
                expected_issuer, claims.iss
            )));
        }

        if !claims.aud.is_exactly(expected_audience) {
            return Err(ApiError::invalid_audience(format!(
                "expected '{}', got {:?}",
                expected_audience, claims.aud
            )));
        }

        Ok(())
    }
}
