//! GraphQL execution

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{ClientConfig, Credential};
use crate::error::{classify_graphql_errors, ClientError, GraphQlErrorEntry};
use crate::token::{PasswordGrant, TokenCache, TokenSource};

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

impl GraphQlResponse {
    fn into_data(self) -> Result<Value, ClientError> {
        if !self.errors.is_empty() {
            return Err(classify_graphql_errors(&self.errors));
        }
        self.data
            .ok_or_else(|| ClientError::Decode("response has neither data nor errors".into()))
    }
}

/// Authenticated GraphQL client
///
/// Cheap to clone; clones share the HTTP pool and the token cache.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    tokens: TokenCache,
}

impl GraphQlClient {
    /// Client using the OAuth2 password grant for tokens
    ///
    /// # Errors
    /// `Transport` when the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let source = Arc::new(PasswordGrant::new(http.clone(), &config));
        Ok(Self::with_token_source(http, config, source))
    }

    /// Client with a custom token source
    #[must_use]
    pub fn with_token_source(
        http: reqwest::Client,
        config: ClientConfig,
        source: Arc<dyn TokenSource>,
    ) -> Self {
        let tokens = TokenCache::new(source, &config);
        Self {
            http,
            config: Arc::new(config),
            tokens,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run `query` as `credential`, returning the `data` object
    ///
    /// # Errors
    /// - `Conflict` for HTTP 409 or a conflict-classified GraphQL error
    /// - `GraphQl` for other GraphQL errors
    /// - `Http`, `Transport`, `Token`, `Decode` for everything below GraphQL
    pub async fn execute(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<Value, ClientError> {
        let token = self.tokens.access_token(credential).await?;
        let response = self
            .http
            .post(&self.config.graphql_url)
            .bearer_auth(token)
            .json(&GraphQlRequest {
                query,
                variables: &variables,
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Conflict(body));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate(&credential.username).await;
        }
        if !status.is_success() {
            // GraphQL servers may still carry structured errors on 4xx/5xx
            let body = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<GraphQlResponse>(&body) {
                if !parsed.errors.is_empty() {
                    return Err(classify_graphql_errors(&parsed.errors));
                }
            }
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        parsed.into_data()
    }

    /// Run `query` and deserialize the `data` object into `T`
    ///
    /// # Errors
    /// Same as [`Self::execute`], plus `Decode` when `T` does not match.
    pub async fn query<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        let data = self.execute(credential, query, variables).await?;
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_with_errors_is_classified() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Saving these changes (timestamped at a) would overwrite later updates (timestamped at b)" }]
        }))
        .unwrap();
        assert!(response.into_data().unwrap_err().is_conflict());
    }

    #[test]
    fn response_data_is_returned() {
        let response: GraphQlResponse =
            serde_json::from_value(json!({ "data": { "createReport": { "uuid": "r1" } } })).unwrap();
        let data = response.into_data().unwrap();
        assert_eq!(data["createReport"]["uuid"], "r1");
    }

    #[test]
    fn empty_response_is_a_decode_error() {
        let response: GraphQlResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(response.into_data(), Err(ClientError::Decode(_))));
    }
}
