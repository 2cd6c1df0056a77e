//! JWK to key material conversion
//!
//! Turns the JSON key descriptions a provider publishes into keys usable for
//! RSA signature verification.

use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};

use crate::config::is_rsa_signature;
use crate::error::{ApiError, Result};

/// A single published JSON Web Key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// Key set document as returned by the provider's key set endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Verification-ready RSA public key
#[derive(Clone)]
pub struct KeyMaterial {
    pub kid: String,
    /// Algorithm pinned by the descriptor, if it declared one
    pub alg: Option<Algorithm>,
    pub(crate) decoding_key: DecodingKey,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .finish_non_exhaustive()
    }
}

/// Convert one published key into key material.
///
/// Only RSA signature keys are supported. The `use` and `alg` members are
/// optional in the JWK format; when present they must agree with that.
pub fn convert(jwk: &Jwk) -> Result<KeyMaterial> {
    if jwk.kty != "RSA" {
        return Err(ApiError::unsupported_key_type(format!("key type '{}'", jwk.kty)));
    }

    if let Some(key_use) = &jwk.key_use {
        if key_use != "sig" {
            return Err(ApiError::unsupported_key_type(format!("key use '{}'", key_use)));
        }
    }

    let alg = match &jwk.alg {
        Some(name) => {
            let alg = Algorithm::from_str(name)
                .map_err(|_| ApiError::unsupported_key_type(format!("key algorithm '{}'", name)))?;
            if !is_rsa_signature(alg) {
                return Err(ApiError::unsupported_key_type(format!("key algorithm '{}'", name)));
            }
            Some(alg)
        }
        None => None,
    };

    let kid = jwk
        .kid
        .clone()
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| ApiError::malformed_key("missing 'kid'"))?;

    let n = component(jwk.n.as_deref(), "n")?;
    let e = component(jwk.e.as_deref(), "e")?;

    let decoding_key = DecodingKey::from_rsa_raw_components(&n, &e);

    Ok(KeyMaterial {
        kid,
        alg,
        decoding_key,
    })
}

/// Decode a base64url big-endian integer member, rejecting empty or zero values
fn component(value: Option<&str>, name: &str) -> Result<Vec<u8>> {
    let encoded = value.ok_or_else(|| ApiError::malformed_key(format!("missing '{}'", name)))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| ApiError::malformed_key(format!("invalid base64 in '{}': {}", name, e)))?;

    if bytes.iter().all(|b| *b == 0) {
        return Err(ApiError::malformed_key(format!("'{}' is zero or empty", name)));
    }

    Ok(bytes)
}
