//! Domain error types

use thiserror::Error;

/// Errors raised while building requests or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A URL could not be parsed or joined to the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The method is not one the client issues.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The body does not fit the request.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A setting is missing or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
