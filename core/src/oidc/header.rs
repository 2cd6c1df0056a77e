//! Compact token structure decoding
//!
//! Splits a compact-serialized token and reads its header. Nothing here is
//! verified; the header is only used to pick a key and an algorithm.

use base64::{engine::general_purpose, Engine};
use serde::Deserialize;

use crate::error::{ApiError, Result};

/// Token header fields needed for key selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub kid: String,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
    kid: Option<String>,
}

/// The three segments of a compact token
pub(crate) struct TokenParts<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
    /// `header.payload`, the bytes covered by the signature
    pub signing_input: &'a str,
}

pub(crate) fn split(token: &str) -> Result<TokenParts<'_>> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ApiError::malformed_token(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }

    if parts.iter().any(|p| p.is_empty()) {
        return Err(ApiError::malformed_token("empty segment"));
    }

    let signing_input = &token[..parts[0].len() + 1 + parts[1].len()];

    Ok(TokenParts {
        header: parts[0],
        payload: parts[1],
        signature: parts[2],
        signing_input,
    })
}

/// Decode the header of a compact token
pub fn decode_header(token: &str) -> Result<TokenHeader> {
    let parts = split(token)?;

    let bytes = base64_url_decode(parts.header)?;
    let raw: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::malformed_token(format!("invalid header JSON: {}", e)))?;

    let kid = raw
        .kid
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| ApiError::malformed_token("header missing 'kid'"))?;
    let alg = raw
        .alg
        .filter(|alg| !alg.is_empty())
        .ok_or_else(|| ApiError::unsupported_algorithm("header declares no 'alg'"))?;

    Ok(TokenHeader { alg, kid })
}

/// Base64 URL decode, tolerating padded input
pub(crate) fn base64_url_decode(input: &str) -> Result<Vec<u8>> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| general_purpose::URL_SAFE.decode(input))
        .map_err(|e| ApiError::malformed_token(format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    fn token_with_header(json: &str) -> String {
        format!("{}.{}.sig", encode(json), encode(r#"{"sub":"u1"}"#))
    }

    #[test]
    fn test_decode_header() {
        let token = token_with_header(r#"{"alg":"RS256","kid":"k1","typ":"JWT"}"#);
        let header = decode_header(&token).unwrap();

        assert_eq!(header.alg, "RS256");
        assert_eq!(header.kid, "k1");
    }

    #[test]
    fn test_decode_header_passes_through_unknown_algorithm() {
        let token = token_with_header(r#"{"alg":"none","kid":"k1"}"#);
        assert_eq!(decode_header(&token).unwrap().alg, "none");
    }

    #[test]
    fn test_two_segments_is_malformed() {
        let token = token_with_header(r#"{"alg":"RS256","kid":"k1"}"#);
        let truncated = token.rsplit_once('.').unwrap().0;

        assert!(matches!(
            decode_header(truncated),
            Err(ApiError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_four_segments_is_malformed() {
        let token = format!("{}.extra", token_with_header(r#"{"alg":"RS256","kid":"k1"}"#));
        assert!(matches!(decode_header(&token), Err(ApiError::MalformedToken { .. })));
    }

    #[test]
    fn test_missing_kid_is_malformed() {
        let token = token_with_header(r#"{"alg":"RS256"}"#);
        assert!(matches!(decode_header(&token), Err(ApiError::MalformedToken { .. })));
    }

    #[test]
    fn test_missing_alg_is_unsupported() {
        let token = token_with_header(r#"{"kid":"k1"}"#);
        assert!(matches!(decode_header(&token), Err(ApiError::UnsupportedAlgorithm { .. })));

        let token = token_with_header(r#"{"alg":"","kid":"k1"}"#);
        assert!(matches!(decode_header(&token), Err(ApiError::UnsupportedAlgorithm { .. })));
    }

    #[test]
    fn test_header_not_base64() {
        assert!(matches!(
            decode_header("!!!.payload.sig"),
            Err(ApiError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_header_not_json() {
        let token = format!("{}.payload.sig", encode("not json"));
        assert!(matches!(decode_header(&token), Err(ApiError::MalformedToken { .. })));
    }

    #[test]
    fn test_signing_input_excludes_signature() {
        let parts = split("aaa.bbb.ccc").unwrap();

        assert_eq!(parts.signing_input, "aaa.bbb");
        assert_eq!(parts.payload, "bbb");
        assert_eq!(parts.signature, "ccc");
    }

    #[test]
    fn test_padded_base64_is_accepted() {
        assert_eq!(base64_url_decode("YQ==").unwrap(), b"a");
        assert_eq!(base64_url_decode("YQ").unwrap(), b"a");
    }
}
