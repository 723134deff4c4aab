//! HTTP profile source for a scraper service

use async_trait::async_trait;
use profile_scout_domain::{ProfileSnapshot, ProfileSource, ProfileSourceError};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Fetches snapshots from `GET {base_url}/profiles/{username}`
pub struct HttpProfileSource {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl HttpProfileSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ProfileSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProfileSourceError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch_snapshot(&self, username: &str) -> Result<ProfileSnapshot, ProfileSourceError> {
        let url = format!("{}/profiles/{}", self.base_url, username);
        tracing::debug!(url = %url, "Fetching snapshot");

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProfileSourceError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(ProfileSourceError::NotFound(username.to_string()));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProfileSourceError::Auth("Invalid API key".to_string()));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                return Err(ProfileSourceError::RateLimited(retry_after));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ProfileSourceError::Api(format!("{}: {}", status, body)));
            }
            _ => {}
        }

        let snapshot: ProfileSnapshot = response
            .json()
            .await
            .map_err(|e| ProfileSourceError::InvalidPayload(e.to_string()))?;

        tracing::debug!(
            username = %snapshot.username,
            posts = snapshot.recent_posts.len(),
            "Fetched snapshot"
        );

        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
