//! OIDC (OpenID Connect) module
//!
//! ID token verification: header decoding, provider key set caching, JWK
//! conversion, signature and claim checks, plus endpoint discovery.

mod claims;
mod discovery;
mod header;
pub mod jwk;
mod keyset;
mod verify;

pub use claims::{Audience, IdTokenClaims};
pub use discovery::{fetch_discovery, ProviderMetadata};
pub use header::{decode_header, TokenHeader};
pub use jwk::{convert, Jwk, JwkSet, KeyMaterial};
pub use keyset::{KeySetCache, KeySetStatus};
pub use verify::{TokenVerifier, VerificationOutcome};
