//! Error types for the draft engine

use anet_client::ClientError;
use anet_model::AttendeeWarning;

/// A save (create / update / fetch) that did not go through
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    /// The server holds later updates than the ones this edit started from
    #[error("{0}")]
    Conflict(String),

    /// The backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The backend refused or failed the request
    #[error("server error: {0}")]
    Server(String),
}

impl SaveError {
    /// Stale write; needs an explicit user decision
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Worth retrying without user involvement
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !self.is_conflict()
    }
}

impl From<ClientError> for SaveError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Conflict(message) => Self::Conflict(message),
            ClientError::Transport(_) | ClientError::Token(_) => Self::Network(err.to_string()),
            other => Self::Server(other.to_string()),
        }
    }
}

/// Editor operation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Attendee(#[from] AttendeeWarning),

    /// The report has never been saved, so there is nothing to reload
    #[error("report has not been saved yet")]
    NotSaved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_conflict_maps_to_save_conflict() {
        let err = SaveError::from(ClientError::Conflict("stale".into()));
        assert_eq!(err, SaveError::Conflict("stale".into()));
        assert!(!err.is_retryable());

        let err = SaveError::from(ClientError::GraphQl("bad input".into()));
        assert!(matches!(err, SaveError::Server(_)));
        assert!(err.is_retryable());
    }
}
