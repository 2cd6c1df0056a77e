//! idtoken-core: Platform-agnostic OpenID Connect ID token verification
//!
//! Verifies RS256-signed ID tokens against a provider's published key set,
//! caching the keys for a fixed TTL, and validates issuer, audience and
//! expiry. It depends only on abstract platform traits (HttpClient, Clock,
//! Environment) and never imports a concrete HTTP stack.

pub mod auth;
pub mod config;
pub mod error;
pub mod oidc;
pub mod platform;
pub mod provider;

#[cfg(test)]
pub mod test_support;
