use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// The remote returned 404 for the requested path.
    NotFound {
        path: String,
    },
    /// Any other non-success response from the remote.
    Api {
        status: u16,
        message: String,
    },
    /// Connection-level failure before a response was received.
    Transport(String),
    /// The client was constructed or used with invalid settings.
    InvalidConfig(String),
    /// The remote answered but the body did not match the envelope.
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound { path } => write!(f, "Resource not found at '{path}'"),
            ApiError::Api { status, message } => {
                write!(f, "API error (status {status}): {message}")
            }
            ApiError::Transport(message) => write!(f, "Transport error: {message}"),
            ApiError::InvalidConfig(message) => write!(f, "Invalid configuration: {message}"),
            ApiError::Decode(message) => write!(f, "Failed to decode response: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidConfig(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
