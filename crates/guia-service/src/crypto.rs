//! Signature helpers for webhook verification.
//!
//! Both payment processors sign their webhook bodies with HMAC-SHA256;
//! Stripe wraps the digest in a `t=...,v1=...` header while the PIX
//! provider sends the bare hex digest. The primitives live here so the
//! two verifiers (and the tests that forge signatures) share them.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 of `payload` keyed by `secret`, hex-encoded.
///
/// # Panics
///
/// `Hmac::new_from_slice` accepts keys of any length, so the internal
/// `expect` cannot fire.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Compare two signature strings without early exit.
///
/// Length differences return immediately (the length of a hex digest is
/// not secret); equal-length inputs are compared in full.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hmac_vector() {
        // Verified against `printf '%s' payload | openssl dgst -sha256 -hmac secret`.
        assert_eq!(
            hmac_sha256_hex("secret", "payload"),
            "b82fcb791acec57859b989b430a826488ce2e479fdf92326bd0a2e8375a42ba4"
        );
    }

    #[test]
    fn hmac_differs_per_key_and_payload() {
        let base = hmac_sha256_hex("secret", "payload");
        assert_ne!(base, hmac_sha256_hex("other", "payload"));
        assert_ne!(base, hmac_sha256_hex("secret", "payload2"));
    }

    #[test]
    fn comparison_matches_equality() {
        assert!(constant_time_eq("abc123", "abc123"));
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc123", "abc12"));
        assert!(constant_time_eq("", ""));
    }
}
