//! Failure classification for session-aware requests.

use thiserror::Error;

/// How a failed request relates to the session.
///
/// Only [`FailureKind::SessionExpired`] is recoverable by refreshing; every
/// other kind is surfaced to the caller or ends a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No response was received (offline, timeout, connection refused).
    NetworkError,
    /// The regular access token is no longer accepted.
    SessionExpired,
    /// The administrative token is no longer accepted.
    AdminSessionExpired,
    /// The session is valid but not allowed to do this.
    PermissionDenied,
    /// The token refresh itself failed.
    RefreshFailed,
    /// The request failed again after being replayed with a fresh token.
    RetryExhausted,
    /// Any other error status.
    Unclassified,
}

impl FailureKind {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::SessionExpired => "session_expired",
            Self::AdminSessionExpired => "admin_session_expired",
            Self::PermissionDenied => "permission_denied",
            Self::RefreshFailed => "refresh_failed",
            Self::RetryExhausted => "retry_exhausted",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Why a token refresh did not produce a new access token.
///
/// One outcome is delivered to every request waiting on the refresh, so the
/// type is cheap to clone.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token is stored; no refresh call was made.
    #[error("no refresh token available")]
    NoRefreshToken {
        /// Whether an access token was stored, i.e. a session existed.
        had_session: bool,
    },

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh rejected with status {status}: {detail}")]
    Rejected {
        /// HTTP status returned by the refresh endpoint.
        status: u16,
        /// Error detail from the response body, if any.
        detail: String,
    },

    /// The refresh endpoint answered 2xx without an access token.
    #[error("refresh response did not contain an access token")]
    MissingAccessToken,

    /// The refresh call never got a response.
    #[error("refresh request failed: {0}")]
    Network(String),

    /// New tokens were issued but could not be stored.
    #[error("refreshed tokens could not be stored: {0}")]
    Storage(String),

    /// The refresh task ended without reporting an outcome.
    #[error("refresh was abandoned before completing")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_error_messages() {
        let err = RefreshError::Rejected {
            status: 400,
            detail: "invalid refresh token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "refresh rejected with status 400: invalid refresh token"
        );
        assert_eq!(
            RefreshError::NoRefreshToken { had_session: false }.to_string(),
            "no refresh token available"
        );
    }

    #[test]
    fn test_failure_kind_labels() {
        assert_eq!(FailureKind::SessionExpired.as_str(), "session_expired");
        assert_eq!(FailureKind::RetryExhausted.as_str(), "retry_exhausted");
    }
}
