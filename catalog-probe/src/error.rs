//! Error types for catalog-probe.
//!
//! Catalog transport failures are modelled by [`CatalogError`]; everything
//! the service layer can report to a caller is a [`ProbeError`].

use thiserror::Error;

use crate::catalog::CatalogError;

/// The main error type for catalog-probe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Error raised by the remote catalog or its client.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied argument was rejected before any remote call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A type alias for `Result<T, ProbeError>`.
pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short machine-readable category, used in structured error output.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Catalog(e) => e.kind(),
            ProbeError::Configuration(_) => "configuration",
            ProbeError::InvalidArgument(_) => "invalid_argument",
            ProbeError::Serialization(_) => "serialization",
        }
    }
}
