use thiserror::Error;

use crate::composer::ContentError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not signed in")]
    Unauthenticated,

    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no details"))]
    Api { status: u16, message: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(#[from] ContentError),

    #[error("invalid receiver id {0:?}")]
    InvalidReceiver(String),

    #[error("a message is already being sent")]
    SubmitInFlight,

    #[error("local cache: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Text shown next to the point of failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated => "You need to sign in first.".to_string(),
            Error::Api { message: Some(message), .. } => message.clone(),
            Error::Api { status, message: None } => format!("Request failed (HTTP {}).", status),
            Error::Transport(e) if e.is_timeout() => "The server took too long to answer.".to_string(),
            Error::Transport(_) => "Could not reach the server.".to_string(),
            Error::Validation(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Error::Unauthenticated | Error::Api { status: 401, .. })
    }
}
