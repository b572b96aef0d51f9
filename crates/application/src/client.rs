//! Session-aware request pipeline.

use std::sync::Arc;

use tollgate_domain::{
    FailureKind, PendingRequest, RefreshError, RequestSpec, ResponseSpec, SessionConfig,
    SessionKind,
};

use crate::auth::{
    RefreshCoordinator, RequestDispatcher, ResponseClassifier, SessionTerminator, TokenStore,
};
use crate::error::{ClientError, ClientResult};
use crate::ports::{HttpClient, Navigator, TokenRefresher};

/// Sends requests on behalf of a signed-in user.
///
/// Requests rejected for an expired session are held until the session is
/// renewed and then replayed once with the new token. Concurrent rejections
/// share a single refresh call.
pub struct SessionClient<C, R> {
    dispatcher: RequestDispatcher<C>,
    classifier: ResponseClassifier,
    coordinator: RefreshCoordinator<R>,
    terminator: SessionTerminator,
    store: TokenStore,
}

impl<C: HttpClient, R: TokenRefresher + 'static> SessionClient<C, R> {
    /// Assembles a client from its adapters.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if `config` is invalid.
    pub fn new(
        config: &SessionConfig,
        http: Arc<C>,
        refresher: R,
        store: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let terminator = SessionTerminator::new(store.clone(), navigator, config);
        Ok(Self {
            dispatcher: RequestDispatcher::new(http, store.clone(), config),
            classifier: ResponseClassifier::new(config),
            coordinator: RefreshCoordinator::new(refresher, store.clone(), terminator.clone()),
            terminator,
            store,
        })
    }

    /// The token store, for signing in and out.
    #[must_use]
    pub const fn store(&self) -> &TokenStore {
        &self.store
    }

    /// The refresh coordinator, for observing refresh state.
    #[must_use]
    pub const fn coordinator(&self) -> &RefreshCoordinator<R> {
        &self.coordinator
    }

    /// Sends `request` and returns the first successful response.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] describing why the request failed. Errors
    /// that carry a response hand it back unchanged.
    pub async fn send(&self, request: RequestSpec) -> ClientResult<ResponseSpec> {
        let mut pending = PendingRequest::new(request);

        loop {
            let attempt = self.dispatcher.dispatch(&pending).await?;
            let response = match attempt.outcome {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(request_id = %pending.id, error = %e, "no response received");
                    return Err(ClientError::Network(e));
                }
            };

            let kind = self.classifier.classify(&pending.request, Some(&response));
            tracing::debug!(
                request_id = %pending.id,
                status = %response.status,
                kind = kind.as_str(),
                "request failed"
            );

            match kind {
                FailureKind::SessionExpired => {}
                FailureKind::AdminSessionExpired => {
                    self.terminator.terminate(SessionKind::Admin).await;
                    return Err(ClientError::AdminSessionExpired { response });
                }
                FailureKind::PermissionDenied => {
                    return Err(ClientError::PermissionDenied { response });
                }
                _ => return Err(ClientError::Status { response }),
            }

            if pending.is_retried() {
                tracing::warn!(request_id = %pending.id, "rejected again after refresh");
                if attempt.had_session {
                    self.terminator.terminate(SessionKind::Regular).await;
                }
                return Err(ClientError::RetryExhausted { response });
            }

            // Another request renewed the session while this one was in flight.
            if let Some(current) = self.store.access_token().await
                && attempt.sent_token.as_deref() != Some(current.as_str())
            {
                tracing::debug!(request_id = %pending.id, "replaying with newer stored token");
                pending.mark_retried();
                continue;
            }

            match self.coordinator.fresh_token().await {
                Ok(_) => {
                    tracing::debug!(request_id = %pending.id, "replaying after refresh");
                    pending.mark_retried();
                }
                Err(RefreshError::NoRefreshToken { had_session: false }) => {
                    return Err(ClientError::SessionExpired { response });
                }
                Err(e) => return Err(ClientError::RefreshFailed(e)),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::HttpClientError;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tollgate_domain::{RefreshedTokens, TokenPair};

    /// Client answering from a script, in order.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<ResponseSpec, HttpClientError>>>,
        sent: Mutex<Vec<RequestSpec>>,
        renew_during_first: Mutex<Option<TokenStore>>,
    }

    impl ScriptedClient {
        fn with(replies: Vec<Result<ResponseSpec, HttpClientError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            })
        }

        fn bearers(&self) -> Vec<Option<String>> {
            self.sent
                .lock()
                .iter()
                .map(|r| r.headers.get("Authorization").map(str::to_string))
                .collect()
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute(
            &self,
            request: &RequestSpec,
        ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
            self.sent.lock().push(request.clone());
            let reply = self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(ResponseSpec::with_body(200, "{}")));
            let renew = self.renew_during_first.lock().take();
            async move {
                if let Some(store) = renew {
                    store
                        .apply_refresh(&RefreshedTokens {
                            access_token: "a9".to_string(),
                            refresh_token: None,
                        })
                        .await
                        .unwrap();
                }
                reply
            }
        }
    }

    #[derive(Default)]
    struct CountingRefresher {
        calls: Arc<AtomicUsize>,
        outcome: Option<Result<RefreshedTokens, RefreshError>>,
    }

    impl TokenRefresher for CountingRefresher {
        fn refresh(
            &self,
            _refresh_token: &str,
        ) -> impl Future<Output = Result<RefreshedTokens, RefreshError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcome.clone().unwrap_or_else(|| {
                Ok(RefreshedTokens {
                    access_token: "a2".to_string(),
                    refresh_token: None,
                })
            });
            async move { outcome }
        }
    }

    #[derive(Default)]
    struct StaticNavigator {
        redirects: Mutex<Vec<String>>,
    }

    impl Navigator for StaticNavigator {
        fn current_location(&self) -> String {
            "/jobs".to_string()
        }

        fn redirect(&self, target: &str) {
            self.redirects.lock().push(target.to_string());
        }
    }

    async fn signed_in() -> TokenStore {
        let store = TokenStore::ephemeral();
        store.sign_in(TokenPair::new("a1", "r1")).await.unwrap();
        store
    }

    async fn client(
        http: Arc<ScriptedClient>,
        refresher: CountingRefresher,
        navigator: Arc<StaticNavigator>,
    ) -> SessionClient<ScriptedClient, CountingRefresher> {
        SessionClient::new(
            &SessionConfig::default(),
            http,
            refresher,
            signed_in().await,
            navigator,
        )
        .unwrap()
    }

    fn status(code: u16) -> Result<ResponseSpec, HttpClientError> {
        Ok(ResponseSpec::with_body(code, ""))
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let http = ScriptedClient::with(vec![Ok(ResponseSpec::with_body(200, r#"{"ok":true}"#))]);
        let client = client(http.clone(), CountingRefresher::default(), Arc::default()).await;

        let response = client.send(RequestSpec::get("/jobs")).await.unwrap();

        assert_eq!(response.body, r#"{"ok":true}"#);
        assert_eq!(http.bearers(), vec![Some("Bearer a1".to_string())]);
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed_and_replayed() {
        let refresher = CountingRefresher::default();
        let calls = Arc::clone(&refresher.calls);
        let http = ScriptedClient::with(vec![status(401)]);
        let client = client(http.clone(), refresher, Arc::default()).await;

        let response = client.send(RequestSpec::get("/jobs")).await.unwrap();

        assert!(response.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            http.bearers(),
            vec![Some("Bearer a1".to_string()), Some("Bearer a2".to_string())]
        );
        assert!(!client.coordinator().is_refreshing());
    }

    #[tokio::test]
    async fn test_retry_is_bounded_to_one() {
        let navigator = Arc::new(StaticNavigator::default());
        let http = ScriptedClient::with(vec![status(401), status(401)]);
        let client = client(http.clone(), CountingRefresher::default(), navigator.clone()).await;

        let err = client.send(RequestSpec::get("/jobs")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::RetryExhausted);
        assert_eq!(http.sent.lock().len(), 2);
        assert_eq!(client.store().access_token().await, None);
        assert_eq!(*navigator.redirects.lock(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_permission_denied_keeps_session() {
        let http = ScriptedClient::with(vec![Ok(ResponseSpec::with_body(
            403,
            r#"{"detail":"Not enough permissions"}"#,
        ))]);
        let client = client(http, CountingRefresher::default(), Arc::default()).await;

        let err = client.send(RequestSpec::get("/wallet")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::PermissionDenied);
        assert_eq!(
            err.response().and_then(ResponseSpec::error_detail).as_deref(),
            Some("Not enough permissions")
        );
        assert_eq!(client.store().access_token().await.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_admin_expiry_clears_admin_only() {
        let refresher = CountingRefresher::default();
        let calls = Arc::clone(&refresher.calls);
        let navigator = Arc::new(StaticNavigator::default());
        let http = ScriptedClient::with(vec![status(401)]);
        let client = client(http, refresher, navigator.clone()).await;
        client.store().sign_in_admin("adm").await.unwrap();

        let err = client.send(RequestSpec::get("/admin/users")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::AdminSessionExpired);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.store().admin_token().await, None);
        assert_eq!(client.store().access_token().await.as_deref(), Some("a1"));
        assert_eq!(*navigator.redirects.lock(), vec!["/admin/login".to_string()]);
    }

    #[tokio::test]
    async fn test_network_error_is_surfaced() {
        let http = ScriptedClient::with(vec![Err(HttpClientError::Timeout { timeout_ms: 10 })]);
        let client = client(http, CountingRefresher::default(), Arc::default()).await;

        let err = client.send(RequestSpec::get("/jobs")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::NetworkError);
        assert_eq!(client.store().access_token().await.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_other_status_is_returned_unchanged() {
        let http = ScriptedClient::with(vec![Ok(ResponseSpec::with_body(500, "boom"))]);
        let client = client(http, CountingRefresher::default(), Arc::default()).await;

        let err = client.send(RequestSpec::get("/jobs")).await.unwrap_err();

        assert!(matches!(err, ClientError::Status { .. }));
        assert_eq!(err.response().map(|r| r.body.as_str()), Some("boom"));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_surfaced() {
        let refresher = CountingRefresher {
            outcome: Some(Err(RefreshError::Rejected {
                status: 400,
                detail: "expired".to_string(),
            })),
            ..CountingRefresher::default()
        };
        let http = ScriptedClient::with(vec![status(401)]);
        let client = client(http.clone(), refresher, Arc::default()).await;

        let err = client.send(RequestSpec::get("/jobs")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::RefreshFailed);
        assert_eq!(http.sent.lock().len(), 1);
        assert_eq!(client.store().refresh_token().await, None);
    }

    #[tokio::test]
    async fn test_signed_out_401_passes_through() {
        let navigator = Arc::new(StaticNavigator::default());
        let http = ScriptedClient::with(vec![status(401)]);
        let client = SessionClient::new(
            &SessionConfig::default(),
            http,
            CountingRefresher::default(),
            TokenStore::ephemeral(),
            navigator.clone(),
        )
        .unwrap();

        let err = client.send(RequestSpec::get("/jobs")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::SessionExpired);
        assert!(navigator.redirects.lock().is_empty());
    }

    #[tokio::test]
    async fn test_token_renewed_in_flight_is_reused() {
        let refresher = CountingRefresher::default();
        let calls = Arc::clone(&refresher.calls);
        let store = signed_in().await;
        let http = ScriptedClient::with(vec![status(401)]);
        *http.renew_during_first.lock() = Some(store.clone());
        let client = SessionClient::new(
            &SessionConfig::default(),
            http.clone(),
            refresher,
            store,
            Arc::new(StaticNavigator::default()),
        )
        .unwrap();

        let response = client.send(RequestSpec::get("/jobs")).await.unwrap();

        assert!(response.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            http.bearers(),
            vec![Some("Bearer a1".to_string()), Some("Bearer a9".to_string())]
        );
    }

    #[tokio::test]
    async fn test_replay_is_dropped_after_another_waiter_ends_session() {
        let navigator = Arc::new(StaticNavigator::default());
        let http = ScriptedClient::with(vec![status(401), status(401), status(401)]);
        let client = client(http.clone(), CountingRefresher::default(), navigator.clone()).await;

        let (jobs, profile) = tokio::join!(
            client.send(RequestSpec::get("/jobs")),
            client.send(RequestSpec::get("/profile")),
        );

        let mut kinds = vec![jobs.unwrap_err(), profile.unwrap_err()]
            .into_iter()
            .map(|e| match e {
                ClientError::RetryExhausted { .. } => "retry_exhausted",
                ClientError::SessionEnded => "session_ended",
                other => panic!("unexpected error {other:?}"),
            })
            .collect::<Vec<_>>();
        kinds.sort_unstable();
        assert_eq!(kinds, vec!["retry_exhausted", "session_ended"]);
        assert_eq!(
            http.bearers(),
            vec![
                Some("Bearer a1".to_string()),
                Some("Bearer a1".to_string()),
                Some("Bearer a2".to_string()),
            ]
        );
        assert_eq!(client.store().access_token().await, None);
        assert_eq!(*navigator.redirects.lock(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SessionConfig {
            base_url: "ftp://example.com".to_string(),
            ..SessionConfig::default()
        };
        let result = SessionClient::new(
            &config,
            ScriptedClient::with(Vec::new()),
            CountingRefresher::default(),
            TokenStore::ephemeral(),
            Arc::new(StaticNavigator::default()),
        );
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }
}
