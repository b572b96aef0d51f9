//! Failure classification.

use tollgate_domain::{FailureKind, PathRules, RequestSpec, ResponseSpec, SessionConfig, StatusCode};

/// Labels failed responses by what they mean for the session.
#[derive(Debug, Clone, Default)]
pub struct ResponseClassifier {
    rules: PathRules,
}

impl ResponseClassifier {
    /// Creates a classifier using the path rules of `config`.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            rules: config.path_rules(),
        }
    }

    /// Classifies the failure of `request`.
    ///
    /// `response` is `None` when no response was received. A success
    /// response should not be passed in; it classifies as
    /// [`FailureKind::Unclassified`].
    #[must_use]
    pub fn classify(&self, request: &RequestSpec, response: Option<&ResponseSpec>) -> FailureKind {
        let Some(response) = response else {
            return FailureKind::NetworkError;
        };

        let status = response.status;
        let auth_rejection = status == StatusCode::UNAUTHORIZED
            || (status == StatusCode::FORBIDDEN && signals_expired_session(response));
        let path = self.rules.route(request);

        if self.rules.is_auth_endpoint(&path)
            && (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN)
        {
            return FailureKind::PermissionDenied;
        }
        if auth_rejection && self.rules.is_admin(&path) {
            return FailureKind::AdminSessionExpired;
        }
        if auth_rejection {
            return FailureKind::SessionExpired;
        }
        if status == StatusCode::FORBIDDEN {
            return FailureKind::PermissionDenied;
        }
        FailureKind::Unclassified
    }
}

/// Compatibility shim: some backends answer an expired session with 403 and
/// the detail "Not authenticated" instead of 401.
///
/// Matches the detail case-insensitively. Remove once the backend reports
/// expiry with a dedicated status or error kind.
#[must_use]
pub fn signals_expired_session(response: &ResponseSpec) -> bool {
    response
        .error_detail()
        .is_some_and(|detail| detail.to_lowercase().contains("not authenticated"))
}
