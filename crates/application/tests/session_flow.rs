//! End-to-end session flows through `SessionClient` with in-memory adapters.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;
use tollgate_application::{
    ClientError, HttpClient, HttpClientError, Navigator, SessionClient, TokenRefresher, TokenStore,
};
use tollgate_domain::{
    FailureKind, RefreshError, RefreshedTokens, RequestSpec, ResponseSpec, SessionConfig,
    TokenPair,
};

/// Backend that only accepts the tokens in `valid`.
struct Backend {
    valid: Vec<&'static str>,
    forbidden_style: bool,
    log: Mutex<Vec<(String, Option<String>)>>,
}

impl Backend {
    fn accepting(valid: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            valid: valid.to_vec(),
            forbidden_style: false,
            log: Mutex::default(),
        })
    }

    fn calls_with(&self, bearer: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|(_, b)| b.as_deref() == Some(bearer))
            .count()
    }
}

impl HttpClient for Backend {
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        let bearer = request.headers.get("Authorization").map(str::to_string);
        let path = request.path();
        self.log.lock().push((path.clone(), bearer.clone()));

        let accepted = bearer
            .as_deref()
            .and_then(|b| b.strip_prefix("Bearer "))
            .is_some_and(|t| self.valid.contains(&t));
        let response = if accepted {
            ResponseSpec::with_body(200, path)
        } else if self.forbidden_style {
            ResponseSpec::with_body(403, r#"{"detail":"Not authenticated"}"#)
        } else {
            ResponseSpec::with_body(401, r#"{"detail":"Token expired"}"#)
        };
        async move { Ok(response) }
    }
}

/// Refresh endpoint held open until released.
struct GatedRefresher {
    calls: Arc<AtomicUsize>,
    gate: Arc<Notify>,
    outcome: Result<RefreshedTokens, RefreshError>,
}

impl TokenRefresher for GatedRefresher {
    fn refresh(
        &self,
        _refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshedTokens, RefreshError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(&self.gate);
        let outcome = self.outcome.clone();
        async move {
            gate.notified().await;
            outcome
        }
    }
}

struct Browser {
    location: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl Browser {
    fn at(location: &str) -> Arc<Self> {
        Arc::new(Self {
            location: Mutex::new(location.to_string()),
            redirects: Mutex::default(),
        })
    }
}

impl Navigator for Browser {
    fn current_location(&self) -> String {
        self.location.lock().clone()
    }

    fn redirect(&self, target: &str) {
        *self.location.lock() = target.to_string();
        self.redirects.lock().push(target.to_string());
    }
}

struct Fixture {
    client: SessionClient<Backend, GatedRefresher>,
    backend: Arc<Backend>,
    browser: Arc<Browser>,
    calls: Arc<AtomicUsize>,
    gate: Arc<Notify>,
}

async fn fixture(backend: Arc<Backend>, outcome: Result<RefreshedTokens, RefreshError>) -> Fixture {
    let store = TokenStore::ephemeral();
    store.sign_in(TokenPair::new("a1", "r1")).await.unwrap();
    let browser = Browser::at("/jobs");
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let refresher = GatedRefresher {
        calls: Arc::clone(&calls),
        gate: Arc::clone(&gate),
        outcome,
    };
    let client = SessionClient::new(
        &SessionConfig::default(),
        Arc::clone(&backend),
        refresher,
        store,
        browser.clone(),
    )
    .unwrap();
    Fixture {
        client,
        backend,
        browser,
        calls,
        gate,
    }
}

fn issued(access: &str) -> Result<RefreshedTokens, RefreshError> {
    Ok(RefreshedTokens {
        access_token: access.to_string(),
        refresh_token: Some("r2".to_string()),
    })
}

async fn release_after_waiters(f: &Fixture, waiters: usize) {
    while f.client.coordinator().waiter_count() < waiters {
        tokio::task::yield_now().await;
    }
    f.gate.notify_one();
}

#[tokio::test]
async fn test_three_expired_requests_share_one_refresh() {
    let f = fixture(Backend::accepting(&["a2"]), issued("a2")).await;

    let (jobs, profile, wallet, ()) = tokio::join!(
        f.client.send(RequestSpec::get("/jobs")),
        f.client.send(RequestSpec::get("/profile")),
        f.client.send(RequestSpec::get("/wallet")),
        release_after_waiters(&f, 3),
    );

    assert_eq!(jobs.unwrap().body, "/jobs");
    assert_eq!(profile.unwrap().body, "/profile");
    assert_eq!(wallet.unwrap().body, "/wallet");
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.backend.calls_with("Bearer a1"), 3);
    assert_eq!(f.backend.calls_with("Bearer a2"), 3);

    let store = f.client.store();
    assert_eq!(store.access_token().await.as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().await.as_deref(), Some("r2"));
    assert!(f.browser.redirects.lock().is_empty());
}

#[tokio::test]
async fn test_rejected_refresh_fails_every_waiter_once() {
    let rejected = RefreshError::Rejected {
        status: 400,
        detail: "Invalid refresh token".to_string(),
    };
    let f = fixture(Backend::accepting(&[]), Err(rejected.clone())).await;

    let (jobs, profile, wallet, ()) = tokio::join!(
        f.client.send(RequestSpec::get("/jobs")),
        f.client.send(RequestSpec::get("/profile")),
        f.client.send(RequestSpec::get("/wallet")),
        release_after_waiters(&f, 3),
    );

    for outcome in [jobs, profile, wallet] {
        match outcome {
            Err(ClientError::RefreshFailed(e)) => assert_eq!(e, rejected),
            other => panic!("expected refresh failure, got {other:?}"),
        }
    }
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.backend.log.lock().len(), 3);

    let snapshot = f.client.store().snapshot().await;
    assert_eq!(snapshot.access_token, None);
    assert_eq!(snapshot.refresh_token, None);
    assert_eq!(*f.browser.redirects.lock(), vec!["/login".to_string()]);
    assert!(!f.client.coordinator().is_refreshing());
}

#[tokio::test]
async fn test_forbidden_not_authenticated_triggers_refresh() {
    let backend = Arc::new(Backend {
        valid: vec!["a2"],
        forbidden_style: true,
        log: Mutex::default(),
    });
    let f = fixture(backend, issued("a2")).await;
    f.gate.notify_one();

    let response = f.client.send(RequestSpec::get("/profile")).await.unwrap();

    assert_eq!(response.body, "/profile");
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refreshed_token_still_rejected_ends_session() {
    let f = fixture(Backend::accepting(&[]), issued("a2")).await;
    f.gate.notify_one();

    let err = f.client.send(RequestSpec::get("/jobs")).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::RetryExhausted);
    assert_eq!(f.backend.log.lock().len(), 2);
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.client.store().access_token().await, None);
    assert_eq!(*f.browser.redirects.lock(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_admin_expiry_leaves_regular_session_alone() {
    let f = fixture(Backend::accepting(&["a1"]), issued("a2")).await;
    f.client.store().sign_in_admin("adm-old").await.unwrap();

    let admin = f.client.send(RequestSpec::get("/admin/verifications")).await;
    let regular = f.client.send(RequestSpec::get("/jobs")).await;

    assert_eq!(admin.unwrap_err().kind(), FailureKind::AdminSessionExpired);
    assert_eq!(regular.unwrap().body, "/jobs");
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    assert_eq!(f.client.store().admin_token().await, None);
    assert_eq!(f.client.store().access_token().await.as_deref(), Some("a1"));
    assert_eq!(*f.browser.redirects.lock(), vec!["/admin/login".to_string()]);
}

#[tokio::test]
async fn test_later_expiry_starts_a_new_refresh() {
    let f = fixture(Backend::accepting(&["a2"]), issued("a2")).await;
    f.gate.notify_one();
    f.client.send(RequestSpec::get("/jobs")).await.unwrap();

    f.client
        .store()
        .sign_in(TokenPair::new("a1", "r3"))
        .await
        .unwrap();
    f.gate.notify_one();
    f.client.send(RequestSpec::get("/wallet")).await.unwrap();

    assert_eq!(f.calls.load(Ordering::SeqCst), 2);
}
