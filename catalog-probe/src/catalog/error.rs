use thiserror::Error;

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Authentication failed (token rejected, expired or not obtainable).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Network error (connection failed, timeout, etc.).
    #[error("Network error: {message}")]
    Network { message: String },

    /// Rate limited by the server.
    #[error("Rate limited. Retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The requested space, asset or column does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Server returned an error.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Request validation failed.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Response body could not be decoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The client is not configured well enough to make the call.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Metadata document could not be interpreted.
    #[error("Metadata error: {message}")]
    Metadata { message: String },
}

impl CatalogError {
    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Authentication { .. } => "authentication",
            CatalogError::Network { .. } => "network",
            CatalogError::RateLimited { .. } => "rate_limited",
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::ServerError { .. } => "server_error",
            CatalogError::InvalidRequest { .. } => "invalid_request",
            CatalogError::Serialization { .. } => "serialization",
            CatalogError::Configuration { .. } => "configuration",
            CatalogError::Metadata { .. } => "metadata",
        }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
