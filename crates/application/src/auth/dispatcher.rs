//! Bearer token attachment and request dispatch.

use std::sync::Arc;

use tollgate_domain::{
    Header, PathRules, PendingRequest, RequestSpec, ResponseSpec, SessionConfig, TokenFamily,
    TokenSnapshot, request::AUTHORIZATION,
};

use super::TokenStore;
use crate::error::{ClientError, ClientResult};
use crate::ports::{HttpClient, HttpClientError};

/// Attaches the bearer token `request` should carry.
///
/// Admin paths use the admin token when one is stored; every other request
/// uses the regular access token. The refresh endpoint never carries a token.
/// Any `Authorization` header already on the request is replaced.
pub fn authorize(
    request: &mut RequestSpec,
    tokens: &TokenSnapshot,
    rules: &PathRules,
) -> TokenFamily {
    request.headers.remove(AUTHORIZATION);

    let path = rules.route(request);
    if rules.is_refresh(&path) {
        return TokenFamily::None;
    }

    if rules.is_admin(&path)
        && let Some(admin) = &tokens.admin_token
    {
        request.headers.add(Header::bearer(admin));
        return TokenFamily::Admin;
    }

    match tokens.access_token.as_deref() {
        Some(token) => {
            request.headers.add(Header::bearer(token));
            TokenFamily::Regular
        }
        None => TokenFamily::None,
    }
}

/// One trip to the backend.
#[derive(Debug)]
pub struct Attempt {
    /// Which credential the request carried.
    pub family: TokenFamily,
    /// The regular token the request carried, if any.
    pub sent_token: Option<String>,
    /// Whether a regular session existed when the request was sent.
    pub had_session: bool,
    /// The response, or the transport failure.
    pub outcome: Result<ResponseSpec, HttpClientError>,
}

/// Sends requests with the right bearer token attached.
pub struct RequestDispatcher<C> {
    client: Arc<C>,
    store: TokenStore,
    rules: PathRules,
    base_url: String,
}

impl<C: HttpClient> RequestDispatcher<C> {
    /// Creates a dispatcher sending through `client`.
    #[must_use]
    pub fn new(client: Arc<C>, store: TokenStore, config: &SessionConfig) -> Self {
        Self {
            client,
            store,
            rules: config.path_rules(),
            base_url: config.base_url.clone(),
        }
    }

    /// Sends `pending` once.
    ///
    /// The caller's request is left untouched; a copy is authorized and
    /// resolved against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::InvalidRequest`] if the target URL cannot
    /// be built, and [`crate::ClientError::SessionEnded`] if `pending` is a
    /// replay whose session was cleared before it went out. Transport failures
    /// are reported in [`Attempt::outcome`].
    pub async fn dispatch(&self, pending: &PendingRequest) -> ClientResult<Attempt> {
        let tokens = self.store.snapshot().await;
        let mut outgoing = pending.request.clone();
        let family = authorize(&mut outgoing, &tokens, &self.rules);
        // A replay never outlives the session it was renewed for.
        if pending.is_retried() && family == TokenFamily::None {
            tracing::debug!(request_id = %pending.id, "session ended before replay");
            return Err(ClientError::SessionEnded);
        }
        outgoing.url = pending.request.resolve(&self.base_url)?.to_string();

        tracing::debug!(
            request_id = %pending.id,
            method = %outgoing.method,
            path = %self.rules.route(&pending.request),
            family = family.as_str(),
            retried = pending.is_retried(),
            "dispatching request"
        );

        let sent_token = match family {
            TokenFamily::Regular => tokens.access_token.clone(),
            TokenFamily::Admin | TokenFamily::None => None,
        };

        let outcome = self.client.execute(&outgoing).await;
        Ok(Attempt {
            family,
            sent_token,
            had_session: tokens.has_session(),
            outcome,
        })
    }
}
