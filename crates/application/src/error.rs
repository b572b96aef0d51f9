//! Application error types

use thiserror::Error;
use tollgate_domain::{DomainError, FailureKind, RefreshError, ResponseSpec};

use crate::ports::{HttpClientError, PersistenceError};

/// Errors returned to callers of the session client.
///
/// Variants that carry a `response` hand back the backend's answer untouched
/// so the UI can render a contextual message.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received.
    #[error("network error: {0}")]
    Network(#[source] HttpClientError),

    /// The request was rejected for an expired session that could not be
    /// renewed because the caller was never signed in.
    #[error("not authenticated ({})", .response.status)]
    SessionExpired {
        /// The rejecting response.
        response: ResponseSpec,
    },

    /// The session was ended before this request could be replayed, e.g. by
    /// another request that was rejected again after the refresh.
    #[error("session ended before the request could be replayed")]
    SessionEnded,

    /// The administrative session expired; the admin token was cleared.
    #[error("admin session expired ({})", .response.status)]
    AdminSessionExpired {
        /// The rejecting response.
        response: ResponseSpec,
    },

    /// The session is valid but lacks permission; the session is kept.
    #[error("permission denied ({})", .response.status)]
    PermissionDenied {
        /// The rejecting response.
        response: ResponseSpec,
    },

    /// Renewing the session failed; the session was ended.
    #[error("session refresh failed: {0}")]
    RefreshFailed(#[source] RefreshError),

    /// The request was rejected again after being replayed with a new token.
    #[error("request still unauthorized after session refresh ({})", .response.status)]
    RetryExhausted {
        /// The response to the replayed request.
        response: ResponseSpec,
    },

    /// Any other non-success status.
    #[error("request failed with status {}", .response.status)]
    Status {
        /// The failing response.
        response: ResponseSpec,
    },

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    /// Tokens could not be read from or written to storage.
    #[error("token storage error: {0}")]
    Storage(#[from] PersistenceError),
}

impl ClientError {
    /// Returns the failure category, for callers that branch on it.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::NetworkError,
            Self::SessionExpired { .. } | Self::SessionEnded => FailureKind::SessionExpired,
            Self::AdminSessionExpired { .. } => FailureKind::AdminSessionExpired,
            Self::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Self::RefreshFailed(_) => FailureKind::RefreshFailed,
            Self::RetryExhausted { .. } => FailureKind::RetryExhausted,
            Self::Status { .. } | Self::InvalidRequest(_) | Self::Storage(_) => {
                FailureKind::Unclassified
            }
        }
    }

    /// Returns the backend response that caused the error, if there was one.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseSpec> {
        match self {
            Self::SessionExpired { response }
            | Self::AdminSessionExpired { response }
            | Self::PermissionDenied { response }
            | Self::RetryExhausted { response }
            | Self::Status { response } => Some(response),
            Self::Network(_)
            | Self::SessionEnded
            | Self::RefreshFailed(_)
            | Self::InvalidRequest(_)
            | Self::Storage(_) => None,
        }
    }
}

/// Result type alias for session client operations.
pub type ClientResult<T> = Result<T, ClientError>;
