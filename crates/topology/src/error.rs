use thiserror::Error;

pub type Result<T> = std::result::Result<T, TraceError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Port '{port}' on device '{device}' has no declared front/rear mapping")]
    UnmappedPort { device: String, port: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),
}

impl TraceError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Stable machine-readable code, shared by every tool surface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::UnmappedPort { .. } => "unmapped_port",
            Self::InvalidRequest(_) | Self::InvalidInventory(_) => "invalid_request",
        }
    }
}
