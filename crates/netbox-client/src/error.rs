use netbox_topology::TraceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("NetBox returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode NetBox response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Transport failures and server-side errors may succeed on a second attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode { .. } | Self::Config(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<ClientError> for TraceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { url, status: 404 } => TraceError::not_found("Object", url),
            other => TraceError::BackendUnavailable(other.to_string()),
        }
    }
}
