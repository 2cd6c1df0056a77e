//! Configuration and secrets management

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::error::{ApiError, Result};
use crate::platform::Environment;

/// Default lifetime of a fetched key set (1 hour)
pub const DEFAULT_KEY_CACHE_TTL_SECS: u64 = 3600;

/// Default upper bound for a single provider request
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Expected `iss` claim and discovery base (e.g., "https://id.example.com")
    pub issuer: String,
    /// OAuth client identifier, also the expected `aud` claim
    pub client_id: String,
    /// OAuth client secret used at the token endpoint
    pub client_secret: String,
    /// Key set URI; discovered from the issuer when unset
    pub jwks_uri: Option<String>,
    /// Token endpoint; discovered from the issuer when unset
    pub token_endpoint: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    /// Lifetime of a fetched key set
    pub key_cache_ttl_secs: u64,
    /// Upper bound for a single provider request
    pub fetch_timeout: Duration,
    /// Tolerance applied to the `exp` check
    pub clock_skew_secs: u64,
    /// Signature algorithms a token header may declare
    pub accepted_algorithms: Vec<Algorithm>,
    /// Deployment name reported by the health endpoint
    pub environment: String,
}

impl Config {
    /// Load configuration from platform environment
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let accepted_algorithms = match env.get_var("OIDC_ACCEPTED_ALGORITHMS") {
            Ok(raw) => parse_algorithms(&raw)?,
            Err(_) => vec![Algorithm::RS256],
        };

        Ok(Self {
            issuer: env
                .get_var("OIDC_ISSUER")
                .map_err(|_| ApiError::internal("OIDC_ISSUER not configured"))?,
            client_id: env
                .get_var("OIDC_CLIENT_ID")
                .map_err(|_| ApiError::internal("OIDC_CLIENT_ID not configured"))?,
            client_secret: env
                .get_secret("OIDC_CLIENT_SECRET")
                .map_err(|_| ApiError::internal("OIDC_CLIENT_SECRET secret not set"))?,
            jwks_uri: env.get_var("OIDC_JWKS_URI").ok(),
            token_endpoint: env.get_var("OIDC_TOKEN_ENDPOINT").ok(),
            authorization_endpoint: env.get_var("OIDC_AUTHORIZATION_ENDPOINT").ok(),
            userinfo_endpoint: env.get_var("OIDC_USERINFO_ENDPOINT").ok(),
            key_cache_ttl_secs: parse_positive_secs(env, "OIDC_KEY_CACHE_TTL_SECS", DEFAULT_KEY_CACHE_TTL_SECS)?,
            fetch_timeout: Duration::from_secs(parse_positive_secs(
                env,
                "OIDC_FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            clock_skew_secs: parse_secs(env, "OIDC_CLOCK_SKEW_SECS", 0)?,
            accepted_algorithms,
            environment: env
                .get_var("APP_ENV")
                .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string()),
        })
    }
}

fn parse_secs(env: &dyn Environment, name: &str, default: u64) -> Result<u64> {
    match env.get_var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::internal(format!("{} must be a whole number of seconds", name))),
        Err(_) => Ok(default),
    }
}

fn parse_positive_secs(env: &dyn Environment, name: &str, default: u64) -> Result<u64> {
    match parse_secs(env, name, default)? {
        0 => Err(ApiError::internal(format!("{} must be greater than zero", name))),
        secs => Ok(secs),
    }
}

/// Parse a comma-separated algorithm list. Only RSA signature algorithms are
/// accepted because the key set converter only produces RSA keys.
fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name)
            .map_err(|_| ApiError::internal(format!("unknown signature algorithm '{}'", name)))?;
        if !is_rsa_signature(alg) {
            return Err(ApiError::internal(format!(
                "algorithm '{}' is not an RSA signature algorithm",
                name
            )));
        }
        algorithms.push(alg);
    }

    if algorithms.is_empty() {
        return Err(ApiError::internal("OIDC_ACCEPTED_ALGORITHMS is empty"));
    }

    Ok(algorithms)
}

pub(crate) fn is_rsa_signature(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}
