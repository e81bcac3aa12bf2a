//! Client error types
//!
//! Every failure of a GraphQL round trip lands here. Callers mostly care
//! about two questions: is this a stale-write conflict, and is it worth
//! retrying.

use serde::Deserialize;

/// Prefix of the server message for a stale write
pub const CONFLICT_MESSAGE_PREFIX: &str = "Saving these changes";

/// GraphQL client error
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport level failure (connect, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The write would overwrite later updates
    #[error("conflict: {0}")]
    Conflict(String),

    /// GraphQL `errors` in an otherwise successful response
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Access token could not be obtained
    #[error("token request failed: {0}")]
    Token(String),

    /// Response did not have the expected shape
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the server refused a stale write
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether repeating the same request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Token(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Conflict(_) | Self::GraphQl(_) | Self::Decode(_) => false,
        }
    }
}

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlErrorEntry {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlErrorEntry {
    fn is_conflict(&self) -> bool {
        if self.message.starts_with(CONFLICT_MESSAGE_PREFIX) {
            return true;
        }
        let Some(ext) = &self.extensions else {
            return false;
        };
        let code = ext.get("code").or_else(|| ext.get("status"));
        match code {
            Some(serde_json::Value::String(s)) => s == "CONFLICT" || s == "409",
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(409),
            _ => false,
        }
    }
}

/// Turn a non-empty `errors` array into a client error
#[must_use]
pub fn classify_graphql_errors(errors: &[GraphQlErrorEntry]) -> ClientError {
    if let Some(conflict) = errors.iter().find(|e| e.is_conflict()) {
        return ClientError::Conflict(conflict.message.clone());
    }
    let joined = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    ClientError::GraphQl(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(message: &str, extensions: Option<serde_json::Value>) -> GraphQlErrorEntry {
        GraphQlErrorEntry {
            message: message.into(),
            extensions,
        }
    }

    #[test]
    fn conflict_by_message() {
        let err = classify_graphql_errors(&[entry(
            "Saving these changes (timestamped at 10:00) would overwrite later updates (timestamped at 10:05)",
            None,
        )]);
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
    }

    #[test]
    fn conflict_by_extension_code() {
        let err = classify_graphql_errors(&[
            entry("boom", None),
            entry("stale", Some(json!({ "code": 409 }))),
        ]);
        assert!(matches!(err, ClientError::Conflict(m) if m == "stale"));
    }

    #[test]
    fn other_errors_are_joined() {
        let err = classify_graphql_errors(&[entry("a", None), entry("b", Some(json!({"code": "FORBIDDEN"})))]);
        assert_eq!(err.to_string(), "GraphQL error: a; b");
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = ClientError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
        let err = ClientError::Http {
            status: 400,
            body: String::new(),
        };
        assert!(!err.is_retryable());
    }
}
