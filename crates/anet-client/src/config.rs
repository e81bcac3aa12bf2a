//! Client configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Username / password pair of one synthetic or real user
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    #[inline]
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Endpoints and timing of the GraphQL client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// GraphQL endpoint
    pub graphql_url: String,
    /// OAuth2 token endpoint
    pub token_url: String,
    /// OAuth2 client id used for the password grant
    pub client_id: String,
    pub request_timeout_ms: u64,
    /// How long a fetched access token is reused
    pub token_ttl_secs: u64,
    /// Upper bound of cached identities
    pub max_cached_tokens: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            graphql_url: "http://localhost:8080/graphql".to_string(),
            token_url: "http://localhost:9080/realms/ANET/protocol/openid-connect/token".to_string(),
            client_id: "ANET-Client-public".to_string(),
            request_timeout_ms: 30_000,
            token_ttl_secs: 60,
            max_cached_tokens: 10_000,
        }
    }
}

impl ClientConfig {
    #[inline]
    #[must_use]
    pub fn with_graphql_url(mut self, url: impl Into<String>) -> Self {
        self.graphql_url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl_secs = ttl.as_secs();
        self
    }

    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}
