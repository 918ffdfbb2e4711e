//! Error types for the chat transport.

use thiserror::Error;

/// Dialog text when the server rejects a request without a usable `detail`.
pub const PROCESSING_ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Dialog text when the request never produced a usable response.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Sorry, there was an error connecting to the server. Please try again.";

/// Failure of a single `/chat` round trip.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The server answered with a non-success status.
    #[error("server error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Server {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, if it could be read.
        detail: Option<String>,
    },

    /// The request could not complete (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body was not the expected JSON.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ChatError {
    /// Text shown to the user in the error dialog.
    pub fn dialog_message(&self) -> String {
        match self {
            Self::Server {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => detail.clone(),
            Self::Server { .. } => PROCESSING_ERROR_MESSAGE.to_string(),
            Self::Transport(_) | Self::Decode(_) | Self::InvalidUrl(_) => {
                CONNECTION_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Whether the server itself reported the failure.
    pub fn is_server_reported(&self) -> bool {
        matches!(self, Self::Server { .. })
    }
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, ChatError>;
