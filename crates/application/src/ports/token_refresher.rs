//! Token refresh port

use std::future::Future;

use tollgate_domain::{RefreshError, RefreshedTokens};

/// Port for the token refresh call.
///
/// Implementations talk to the refresh endpoint directly, never through the
/// session pipeline, so a failing refresh cannot trigger another refresh.
pub trait TokenRefresher: Send + Sync {
    /// Exchanges `refresh_token` for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Rejected`] for a non-2xx answer,
    /// [`RefreshError::MissingAccessToken`] for a 2xx answer without an access
    /// token, and [`RefreshError::Network`] when no answer was received.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshedTokens, RefreshError>> + Send;
}
