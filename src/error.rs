use std::path::PathBuf;

use thiserror::Error;

/// Every way a client operation can end early. All variants are terminal for
/// the operation that produced them: nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}! status: {status}")]
    Transport { status: u16, message: String },

    /// The request could not complete at all (DNS, connect, broken body).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body arrived but is not the shape this client understands.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn transport(status: reqwest::StatusCode, message: &str) -> Self {
        ClientError::Transport {
            status: status.as_u16(),
            message: message.to_string(),
        }
    }

    /// Numeric HTTP status, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
