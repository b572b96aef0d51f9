//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, Url};
use tollgate_application::ports::{HttpClient, HttpClientError};
use tollgate_domain::{HttpMethod, RequestBody, RequestSpec, ResponseSpec, SessionConfig};

/// Redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = concat!("Tollgate/", env!("CARGO_PKG_VERSION"));

/// HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestHttpClient {
    /// Creates a client using the request timeout of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(config: &SessionConfig) -> Result<Self, HttpClientError> {
        Ok(Self::with_client(build_client()?, config.request_timeout_ms))
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, timeout_ms: u64) -> Self {
        Self { client, timeout_ms }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn build_body(
        builder: reqwest::RequestBuilder,
        body: &RequestBody,
    ) -> Result<reqwest::RequestBuilder, HttpClientError> {
        match body {
            RequestBody::None => Ok(builder),
            RequestBody::Raw {
                content_type,
                content,
            } => {
                if content_type.contains("application/json") && !content.is_empty() {
                    let _: serde_json::Value = serde_json::from_str(content)
                        .map_err(|e| HttpClientError::InvalidBody(format!("Invalid JSON: {e}")))?;
                }
                Ok(builder.body(content.clone()))
            }
        }
    }
}

/// Builds the reqwest client shared by the adapters.
pub(crate) fn build_client() -> Result<Client, HttpClientError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| HttpClientError::Other(e.to_string()))
}

/// Maps reqwest errors to `HttpClientError`.
pub(crate) fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
    if error.is_timeout() {
        return HttpClientError::Timeout { timeout_ms };
    }

    let host = || {
        error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string()
    };

    if error.is_connect() {
        let message = error.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("dns") || lowered.contains("resolve") {
            return HttpClientError::DnsError {
                host: host(),
                message,
            };
        }
        if lowered.contains("refused") {
            return HttpClientError::ConnectionRefused {
                host: host(),
                port: error
                    .url()
                    .and_then(Url::port_or_known_default)
                    .unwrap_or(80),
            };
        }
        return HttpClientError::ConnectionFailed(message);
    }

    if error.is_redirect() {
        return HttpClientError::TooManyRedirects { max: MAX_REDIRECTS };
    }

    HttpClientError::Other(error.to_string())
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        let method = request.method;
        let url = request.url.clone();
        let headers: Vec<_> = request.headers.iter().cloned().collect();
        let body = request.body.clone();
        let timeout_ms = self.timeout_ms;
        let client = self.client.clone();

        async move {
            let parsed_url =
                Url::parse(&url).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {url}")))?;

            let start = Instant::now();

            let mut builder = client
                .request(Self::to_reqwest_method(method), parsed_url)
                .timeout(Duration::from_millis(timeout_ms));

            for header in &headers {
                builder = builder.header(&header.name, &header.value);
            }

            if let Some(content_type) = body.content_type()
                && !headers.iter().any(|h| h.is_named("content-type"))
            {
                builder = builder.header("Content-Type", content_type);
            }

            builder = Self::build_body(builder, &body)?;

            let response = builder
                .send()
                .await
                .map_err(|e| map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();
            let response_headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();

            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?;

            Ok(ResponseSpec::new(
                status,
                response_headers,
                &body_bytes,
                start.elapsed(),
            ))
        }
    }
}
