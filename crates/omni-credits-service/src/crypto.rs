//! Webhook signature primitives.
//!
//! The payment provider signs each delivery with HMAC-SHA256 over
//! `"<timestamp>.<raw body>"` and sends the result in a
//! `t=<timestamp>,v1=<hex>[,v1=<hex>...]` header. This module owns the
//! header parsing and the comparison; the Stripe client composes them.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
///
/// # Panics
///
/// Never panics in practice: HMAC accepts keys of any length, so
/// `new_from_slice` cannot fail for SHA-256.
#[must_use]
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts any key size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Compare two byte strings without leaking the mismatch position.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// A parsed `stripe-signature` header.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// The `t=` timestamp, included in the signed payload.
    pub timestamp: String,
    /// All `v1=` candidate signatures. Providers send more than one while
    /// rolling a secret.
    pub candidates: Vec<String>,
}

impl SignatureHeader {
    /// Check whether any candidate matches the expected signature for
    /// `payload` under `secret`.
    #[must_use]
    pub fn matches(&self, secret: &str, payload: &str) -> bool {
        let signed_payload = format!("{}.{payload}", self.timestamp);
        let expected = hmac_sha256_hex(secret.as_bytes(), signed_payload.as_bytes());

        self.candidates
            .iter()
            .any(|candidate| constant_time_eq(expected.as_bytes(), candidate.as_bytes()))
    }
}

/// Header parse failure; carries no detail since the only response is 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedSignatureHeader;

impl FromStr for SignatureHeader {
    type Err = MalformedSignatureHeader;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut timestamp = None;
        let mut candidates = Vec::new();

        for part in s.split(',') {
            match part.split_once('=') {
                Some(("t", value)) => timestamp = Some(value.to_string()),
                Some(("v1", value)) => candidates.push(value.to_string()),
                _ => {}
            }
        }

        match (timestamp, candidates.is_empty()) {
            (Some(timestamp), false) => Ok(Self {
                timestamp,
                candidates,
            }),
            _ => Err(MalformedSignatureHeader),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_is_deterministic_hex() {
        let a = hmac_sha256_hex(b"secret", b"message");
        let b = hmac_sha256_hex(b"secret", b"message");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hmac_sha256_hex(b"secret", b"other message"));
    }

    #[test]
    fn constant_time_eq_semantics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(!constant_time_eq(b"abc", b"ABC"));
    }

    #[test]
    fn parses_single_signature_header() {
        let header: SignatureHeader = "t=1700000000,v1=deadbeef".parse().unwrap();
        assert_eq!(header.timestamp, "1700000000");
        assert_eq!(header.candidates, vec!["deadbeef".to_string()]);
    }

    #[test]
    fn parses_rolling_secret_header() {
        let header: SignatureHeader = "t=1700000000,v1=aaaa,v1=bbbb".parse().unwrap();
        assert_eq!(header.candidates.len(), 2);
    }

    #[test]
    fn rejects_header_without_timestamp_or_signature() {
        assert!("v1=deadbeef".parse::<SignatureHeader>().is_err());
        assert!("t=1700000000".parse::<SignatureHeader>().is_err());
        assert!("garbage".parse::<SignatureHeader>().is_err());
    }

    #[test]
    fn matches_checks_signed_payload() {
        let payload = r#"{"id":"evt_1"}"#;
        let signature = hmac_sha256_hex(b"whsec_test", format!("1700000000.{payload}").as_bytes());
        let header: SignatureHeader = format!("t=1700000000,v1={signature}").parse().unwrap();

        assert!(header.matches("whsec_test", payload));
        assert!(!header.matches("whsec_other", payload));
        assert!(!header.matches("whsec_test", r#"{"id":"evt_2"}"#));
    }
}
