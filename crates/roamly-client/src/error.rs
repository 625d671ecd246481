use thiserror::Error;

/// Failures talking to the content API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network, TLS or protocol failure before a response was read.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server responded {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body did not have the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Message suitable for a notification banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors surfaced to views by the coordination core.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A credential-bearing call was attempted without a session.
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("No draft slot at index {index} (have {len})")]
    SlotOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
