//! Single-flight token refresh.
//!
//! At most one refresh call is in flight at a time. Every request that needs a
//! fresh token while a refresh is running joins the waiter queue and receives
//! the same outcome once the refresh settles.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tollgate_domain::{RefreshError, SessionKind};

use super::{SessionTerminator, TokenStore};
use crate::ports::TokenRefresher;

type Waiter = oneshot::Sender<Result<String, RefreshError>>;

#[derive(Default)]
struct RefreshState {
    is_refreshing: bool,
    waiters: Vec<Waiter>,
}

struct Inner<R> {
    state: Mutex<RefreshState>,
    refresher: R,
    store: TokenStore,
    terminator: SessionTerminator,
}

/// Coordinates token refreshes across concurrent requests.
///
/// Cloning is cheap; clones share the same refresh state.
pub struct RefreshCoordinator<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for RefreshCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TokenRefresher + 'static> RefreshCoordinator<R> {
    /// Creates a coordinator refreshing through `refresher`.
    #[must_use]
    pub fn new(refresher: R, store: TokenStore, terminator: SessionTerminator) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RefreshState::default()),
                refresher,
                store,
                terminator,
            }),
        }
    }

    /// Returns a freshly issued access token.
    ///
    /// Starts a refresh if none is running, otherwise waits for the running
    /// one. The refresh itself runs on its own task, so dropping the returned
    /// future does not cancel it for the other waiters.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure shared by every waiter. On any failure
    /// other than [`RefreshError::NoRefreshToken`] without a session, the
    /// regular session has already been terminated. A refresh task that dies
    /// without an outcome yields [`RefreshError::Abandoned`] and leaves the
    /// session as it was.
    pub async fn fresh_token(&self) -> Result<String, RefreshError> {
        let (tx, rx) = oneshot::channel();
        let start = {
            let mut state = self.inner.state.lock();
            state.waiters.push(tx);
            tracing::debug!(waiters = state.waiters.len(), "queued for token refresh");
            !std::mem::replace(&mut state.is_refreshing, true)
        };

        if start {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run().await });
        }

        rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }

    /// Returns true while a refresh call is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.state.lock().is_refreshing
    }

    /// Returns the number of requests waiting on the running refresh.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }
}

/// Settles the running refresh when dropped.
///
/// Resets `is_refreshing` and releases every waiter with `outcome`. Dropped
/// without an outcome (the refresher panicked) the waiters get
/// [`RefreshError::Abandoned`].
struct Settle<'a> {
    state: &'a Mutex<RefreshState>,
    outcome: Option<Result<String, RefreshError>>,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        let waiters = {
            let mut state = self.state.lock();
            state.is_refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        let outcome = self.outcome.take().unwrap_or_else(|| {
            tracing::error!("token refresh task ended without an outcome");
            Err(RefreshError::Abandoned)
        });

        tracing::debug!(waiters = waiters.len(), "releasing refresh waiters");
        for waiter in waiters {
            // A dropped receiver means its caller went away.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl<R: TokenRefresher> Inner<R> {
    async fn run(&self) {
        let mut settle = Settle {
            state: &self.state,
            outcome: None,
        };
        let outcome = self.attempt().await;

        match &outcome {
            Ok(_) => tracing::info!("session refreshed"),
            Err(RefreshError::NoRefreshToken { had_session: false }) => {
                tracing::debug!("no session to refresh");
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, ending session");
                self.terminator.terminate(SessionKind::Regular).await;
            }
        }

        settle.outcome = Some(outcome);
    }

    async fn attempt(&self) -> Result<String, RefreshError> {
        let tokens = self.store.snapshot().await;
        let Some(refresh_token) = tokens.refresh_token else {
            return Err(RefreshError::NoRefreshToken {
                had_session: tokens.access_token.is_some(),
            });
        };

        tracing::info!("refreshing session");
        let refreshed = self.refresher.refresh(&refresh_token).await?;
        if refreshed.access_token.is_empty() {
            return Err(RefreshError::MissingAccessToken);
        }

        self.store
            .apply_refresh(&refreshed)
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?;
        Ok(refreshed.access_token)
    }
}
