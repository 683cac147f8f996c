//! Authentication as a GitHub App
//!
//! An app authenticates in two hops: an RS256 JWT signed with the app's
//! private key, exchanged for a short-lived installation token that the
//! repository calls then use.

mod github;

pub use github::{AppAuthenticator, InstallationToken};

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::path::Path;

/// Backdate `iat` to tolerate clock drift between us and GitHub
const JWT_CLOCK_SKEW_SECS: i64 = 60;

/// GitHub rejects app JWTs valid for more than ten minutes
const JWT_LIFETIME_SECS: i64 = 9 * 60;

#[derive(Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// App identity: app id plus private signing key
#[derive(Clone)]
pub struct AppCredentials {
    app_id: u64,
    key: EncodingKey,
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl AppCredentials {
    /// Build credentials from an RSA private key in PEM form
    pub fn from_pem(app_id: u64, pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| Error::Config(format!("invalid private key: {e}")))?;
        Ok(Self { app_id, key })
    }

    /// Read the private key file and build credentials
    pub fn load(app_id: u64, key_path: &Path) -> Result<Self> {
        let pem = std::fs::read(key_path).map_err(|e| {
            Error::Config(format!(
                "failed to read private key {}: {e}",
                key_path.display()
            ))
        })?;
        Self::from_pem(app_id, &pem)
    }

    /// The GitHub App id
    pub const fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Sign an app JWT valid from now
    pub fn mint_jwt(&self) -> Result<String> {
        self.mint_jwt_at(Utc::now())
    }

    /// Sign an app JWT as if issued at `now`
    pub fn mint_jwt_at(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = AppClaims {
            iat: (now - Duration::seconds(JWT_CLOCK_SKEW_SECS)).timestamp(),
            exp: (now + Duration::seconds(JWT_LIFETIME_SECS)).timestamp(),
            iss: self.app_id.to_string(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| Error::Auth(format!("failed to sign app JWT: {e}")))
    }
}
