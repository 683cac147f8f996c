//! `X-Hub-Signature-256` verification
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body using the
//! webhook secret, and sends `sha256=<hex digest>`.

use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies delivery signatures against the shared webhook secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Create a verifier for `secret`
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Signature(format!("unusable secret: {e}")))
    }

    /// Compute the header value GitHub would send for `body`
    pub fn sign(&self, body: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(format!(
            "{SIGNATURE_PREFIX}{}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Check `header` (the raw `X-Hub-Signature-256` value) against `body`
    ///
    /// Comparison is constant-time.
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<()> {
        let header =
            header.ok_or_else(|| Error::Signature("missing signature header".to_string()))?;
        let digest_hex = header
            .trim()
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or_else(|| Error::Signature("signature is not sha256".to_string()))?;
        let digest = hex::decode(digest_hex)
            .map_err(|_| Error::Signature("signature is not valid hex".to_string()))?;

        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&digest)
            .map_err(|_| Error::Signature("signature does not match payload".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Example from GitHub's "Validating webhook deliveries" docs
    const DOC_SECRET: &str = "It's a Secret to Everybody";
    const DOC_PAYLOAD: &[u8] = b"Hello, World!";
    const DOC_SIGNATURE: &str =
        "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

    #[test]
    fn test_sign_matches_github_reference_vector() {
        let verifier = WebhookVerifier::new(DOC_SECRET);
        assert_eq!(verifier.sign(DOC_PAYLOAD).unwrap(), DOC_SIGNATURE);
    }

    #[test]
    fn test_verify_accepts_reference_vector() {
        let verifier = WebhookVerifier::new(DOC_SECRET);
        assert!(verifier.verify(DOC_PAYLOAD, Some(DOC_SIGNATURE)).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let verifier = WebhookVerifier::new(DOC_SECRET);
        let err = verifier
            .verify(b"Hello, World?", Some(DOC_SIGNATURE))
            .unwrap_err();
        assert!(matches!(err, Error::Signature(_)));
    }
}
