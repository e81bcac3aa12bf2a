//! Simulator error types

use std::path::PathBuf;

use anet_client::ClientError;

/// Failure of one story or buildup execution
///
/// Never fatal for the simulation; the driver logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// The GraphQL round trip failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The response lacked a field the story needs
    #[error("unexpected response: missing {0}")]
    MissingField(String),

    /// The story could not be given a user
    #[error("no user available: {0}")]
    NoUser(String),
}

impl StoryError {
    /// Whether the next run of the same story may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            Self::NoUser(_) => true,
            Self::MissingField(_) => false,
        }
    }
}

/// Simulator setup error
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No scenario with this name
    #[error("scenario '{name}' not found; possible scenarios are: {}", known.join(", "))]
    UnknownScenario { name: String, known: Vec<String> },

    /// A story or buildup step names a user type the scenario lacks
    #[error("scenario '{scenario}' has no user type '{user_type}'")]
    UnknownUserType { scenario: String, user_type: String },

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::SimConfig`]
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An environment override did not parse
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: String, value: String },

    /// The GraphQL client could not be built
    #[error(transparent)]
    Client(#[from] ClientError),
}
