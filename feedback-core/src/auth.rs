//! OAuth access tokens for the Sheets API.
//!
//! Tokens come from a static value (local development) or the runtime's
//! metadata server, optionally exchanged for an impersonated service account
//! token through the IAM Credentials API. If impersonation fails the base
//! token is used instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SheetsError;
use crate::sheets::SheetsConfig;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
pub const IAM_CREDENTIALS_URL: &str = "https://iamcredentials.googleapis.com/v1";

/// Refresh tokens this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;
const IMPERSONATED_LIFETIME: &str = "3600s";
/// How long a fallback token is used before impersonation is tried again.
const FALLBACK_LIFETIME_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Static(String),
    Metadata,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    /// `None` for tokens that never need refreshing.
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) < expires_at,
        }
    }
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Serialize)]
struct GenerateAccessTokenRequest<'a> {
    scope: [&'a str; 1],
    lifetime: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
    expire_time: DateTime<Utc>,
}

/// Caching token provider shared by every Sheets call.
pub struct TokenProvider {
    http: reqwest::Client,
    source: TokenSource,
    impersonate: Option<String>,
    metadata_url: String,
    iam_url: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, config: &SheetsConfig) -> Self {
        let source = match &config.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::Metadata,
        };

        Self {
            http,
            source,
            impersonate: config.impersonate_service_account.clone(),
            metadata_url: METADATA_TOKEN_URL.to_string(),
            iam_url: IAM_CREDENTIALS_URL.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    #[cfg(test)]
    fn with_endpoints(mut self, metadata_url: String, iam_url: String) -> Self {
        self.metadata_url = metadata_url;
        self.iam_url = iam_url;
        self
    }

    /// Current bearer token, fetching a new one if the cached token is stale.
    pub async fn token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self) -> Result<AccessToken, SheetsError> {
        let base = match &self.source {
            TokenSource::Static(token) => AccessToken {
                value: token.clone(),
                expires_at: None,
            },
            TokenSource::Metadata => self.fetch_metadata_token().await?,
        };

        let Some(account) = &self.impersonate else {
            return Ok(base);
        };

        match self.impersonate(account, &base.value).await {
            Ok(token) => {
                tracing::debug!("Obtained impersonated token for {}", account);
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(
                    "Impersonation failed, falling back to default credentials: {}",
                    e
                );
                let retry_at = Utc::now() + chrono::Duration::seconds(FALLBACK_LIFETIME_SECS);
                Ok(AccessToken {
                    expires_at: Some(base.expires_at.map_or(retry_at, |at| at.min(retry_at))),
                    ..base
                })
            }
        }
    }

    async fn fetch_metadata_token(&self) -> Result<AccessToken, SheetsError> {
        let response = self
            .http
            .get(&self.metadata_url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", SPREADSHEETS_SCOPE)])
            .send()
            .await
            .map_err(|e| SheetsError::Credentials(format!("metadata server unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Credentials(format!(
                "metadata server returned {}: {}",
                status, body
            )));
        }

        let token: MetadataTokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Credentials(format!("invalid metadata token: {}", e)))?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at: Some(Utc::now() + chrono::Duration::seconds(token.expires_in)),
        })
    }

    async fn impersonate(&self, account: &str, base_token: &str) -> Result<AccessToken, SheetsError> {
        let url = format!(
            "{}/projects/-/serviceAccounts/{}:generateAccessToken",
            self.iam_url.trim_end_matches('/'),
            account
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(base_token)
            .json(&GenerateAccessTokenRequest {
                scope: [SPREADSHEETS_SCOPE],
                lifetime: IMPERSONATED_LIFETIME,
            })
            .send()
            .await
            .map_err(SheetsError::http("generate impersonated token"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                operation: "generate impersonated token",
                status,
                body,
            });
        }

        let token: GenerateAccessTokenResponse = response
            .json()
            .await
            .map_err(SheetsError::http("decode impersonated token"))?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at: Some(token.expire_time),
        })
    }
}
