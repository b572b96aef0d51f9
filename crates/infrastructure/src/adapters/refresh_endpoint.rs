//! Token refresh over HTTP.
//!
//! Calls the refresh endpoint directly with its own reqwest client so the call
//! never goes through the session pipeline and never carries a bearer token.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tollgate_application::ports::{HttpClientError, TokenRefresher};
use tollgate_domain::{RefreshError, RefreshedTokens, RequestSpec, ResponseSpec, SessionConfig};

use super::reqwest_client::{build_client, map_error};

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// `TokenRefresher` posting to the configured refresh endpoint.
#[derive(Debug, Clone)]
pub struct ReqwestTokenRefresher {
    client: Client,
    endpoint: Url,
    timeout_ms: u64,
}

impl ReqwestTokenRefresher {
    /// Creates a refresher for the refresh endpoint of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid or the client cannot
    /// be created.
    pub fn new(config: &SessionConfig) -> Result<Self, HttpClientError> {
        let endpoint = RequestSpec::get(config.refresh_path.as_str())
            .resolve(&config.base_url)
            .map_err(|e| HttpClientError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client: build_client()?,
            endpoint,
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// The URL refresh calls are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TokenRefresher for ReqwestTokenRefresher {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshedTokens, RefreshError>> + Send {
        let request = self
            .client
            .post(self.endpoint.clone())
            .timeout(Duration::from_millis(self.timeout_ms))
            .json(&RefreshRequest { refresh_token });
        let timeout_ms = self.timeout_ms;

        async move {
            let response = request
                .send()
                .await
                .map_err(|e| RefreshError::Network(map_error(&e, timeout_ms).to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| RefreshError::Network(e.to_string()))?;

            if !status.is_success() {
                let detail = ResponseSpec::with_body(status.as_u16(), body)
                    .error_detail()
                    .unwrap_or_default();
                return Err(RefreshError::Rejected {
                    status: status.as_u16(),
                    detail,
                });
            }

            let parsed: RefreshResponse =
                serde_json::from_str(&body).map_err(|_| RefreshError::MissingAccessToken)?;
            match parsed.access_token {
                Some(access_token) if !access_token.is_empty() => Ok(RefreshedTokens {
                    access_token,
                    refresh_token: parsed.refresh_token.filter(|t| !t.is_empty()),
                }),
                _ => Err(RefreshError::MissingAccessToken),
            }
        }
    }
}
