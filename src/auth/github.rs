//! App JWT → installation token exchange against the GitHub REST API

use super::AppCredentials;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Refresh cached tokens this long before GitHub expires them
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// A short-lived credential scoped to one installation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallationToken {
    /// Bearer token for installation-scoped API calls
    pub token: String,
    /// When GitHub stops accepting the token
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    /// Whether the token is still safe to hand out at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }
}

#[derive(Deserialize)]
struct AppInfo {
    name: String,
}

#[derive(Deserialize)]
struct InstallationInfo {
    id: u64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Authenticates as the app and hands out installation tokens
///
/// Tokens are cached per installation until they are close to expiry.
pub struct AppAuthenticator {
    credentials: AppCredentials,
    http_client: Client,
    api_base: String,
    tokens: Mutex<HashMap<u64, InstallationToken>>,
}

impl AppAuthenticator {
    /// Create an authenticator talking to `api_base` (e.g. `https://api.github.com`)
    pub fn new(credentials: AppCredentials, api_base: &str) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("push-pilot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            credentials,
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens: Mutex::new(HashMap::new()),
        })
    }

    /// The configured API base, without trailing slash
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch the app's own name (`GET /app`)
    pub async fn app_name(&self) -> Result<String> {
        let request = self.http_client.get(format!("{}/app", self.api_base));
        let app: AppInfo = self.send_as_app(request).await?;
        Ok(app.name)
    }

    /// Look up which installation covers `owner/repo`
    pub async fn installation_id(&self, owner: &str, repo: &str) -> Result<u64> {
        debug!(owner, repo, "resolving installation");
        let request = self
            .http_client
            .get(format!("{}/repos/{owner}/{repo}/installation", self.api_base));
        let installation: InstallationInfo = self.send_as_app(request).await?;
        debug!(owner, repo, installation_id = installation.id, "resolved installation");
        Ok(installation.id)
    }

    /// Get a usable token for an installation, exchanging a new one if needed
    pub async fn installation_token(&self, installation_id: u64) -> Result<InstallationToken> {
        let now = Utc::now();
        if let Some(cached) = self.tokens.lock().await.get(&installation_id)
            && cached.is_fresh_at(now)
        {
            return Ok(cached.clone());
        }

        debug!(installation_id, "exchanging installation token");
        let request = self.http_client.post(format!(
            "{}/app/installations/{installation_id}/access_tokens",
            self.api_base
        ));
        let token: InstallationToken = self.send_as_app(request).await?;
        debug!(installation_id, expires_at = %token.expires_at, "got installation token");

        self.tokens
            .lock()
            .await
            .insert(installation_id, token.clone());
        Ok(token)
    }

    async fn send_as_app<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let jwt = self.credentials.mint_jwt()?;
        let response = request
            .header("Authorization", format!("Bearer {jwt}"))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::Unknown(format!("GitHub request failed: {e}")))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("unexpected response from GitHub: {e}")))
    }
}

/// Turn a non-2xx response into `RemoteApi`, using the body's `message` when present
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    Err(Error::RemoteApi {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(secs: i64, now: DateTime<Utc>) -> InstallationToken {
        InstallationToken {
            token: "ghs_test".to_string(),
            expires_at: now + Duration::seconds(secs),
        }
    }

    #[test]
    fn test_token_fresh_well_before_expiry() {
        let now = Utc::now();
        assert!(token_expiring_in(3600, now).is_fresh_at(now));
    }

    #[test]
    fn test_token_stale_inside_refresh_margin() {
        let now = Utc::now();
        assert!(!token_expiring_in(30, now).is_fresh_at(now));
        assert!(!token_expiring_in(-5, now).is_fresh_at(now));
    }

    #[test]
    fn test_token_response_parses_github_timestamp() {
        let token: InstallationToken = serde_json::from_str(
            r#"{"token":"ghs_abc","expires_at":"2026-10-14T20:00:00Z","permissions":{}}"#,
        )
        .unwrap();
        assert_eq!(token.token, "ghs_abc");
        assert_eq!(token.expires_at.to_rfc3339(), "2026-10-14T20:00:00+00:00");
    }
}
