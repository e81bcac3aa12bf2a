//! Bearer token cache
//!
//! Tokens are cached per username for a fixed TTL. Concurrent requests for
//! the same identity share one fetch: moka's `try_get_with` runs a single
//! loader per key and lets the other callers wait on it.

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::{ClientConfig, Credential};
use crate::error::ClientError;

/// Something that can mint an access token for a credential
#[async_trait]
pub trait TokenSource: Send + Sync + Debug {
    /// Fetch a fresh access token
    async fn fetch_token(&self, credential: &Credential) -> Result<String, ClientError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 resource-owner password grant against the token endpoint
#[derive(Debug, Clone)]
pub struct PasswordGrant {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
}

impl PasswordGrant {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl TokenSource for PasswordGrant {
    async fn fetch_token(&self, credential: &Credential) -> Result<String, ClientError> {
        let form = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", credential.username.as_str()),
            ("password", credential.password.as_str()),
        ];
        let response = self.http.post(&self.token_url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Token(format!("HTTP {}: {body}", status.as_u16())));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(token.access_token)
    }
}

/// Per-identity access token cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    inner: Cache<String, String>,
}

impl TokenCache {
    /// Cache backed by `source`, entries living for the configured TTL
    #[must_use]
    pub fn new(source: Arc<dyn TokenSource>, config: &ClientConfig) -> Self {
        Self {
            source,
            inner: Cache::builder()
                .max_capacity(config.max_cached_tokens)
                .time_to_live(config.token_ttl())
                .build(),
        }
    }

    /// Access token for `credential`, fetched at most once per TTL
    ///
    /// # Errors
    /// Propagates the token source failure; nothing is cached in that case.
    pub async fn access_token(&self, credential: &Credential) -> Result<String, ClientError> {
        let source = Arc::clone(&self.source);
        let cred = credential.clone();
        self.inner
            .try_get_with(credential.username.clone(), async move {
                tracing::debug!(user = %cred.username, "fetching access token");
                source.fetch_token(&cred).await
            })
            .await
            .map_err(|e| Arc::try_unwrap(e).unwrap_or_else(|shared| ClientError::Token(shared.to_string())))
    }

    /// Forget the token of `username`, e.g. after a 401
    pub async fn invalidate(&self, username: &str) {
        self.inner.invalidate(username).await;
    }
}
