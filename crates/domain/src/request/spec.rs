//! Request specification type

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Header, Headers, HttpMethod, RequestBody};
use crate::error::{DomainError, DomainResult};

/// Complete description of an outgoing HTTP request.
///
/// `url` is either a path relative to the configured base URL (the usual
/// case, e.g. `/jobs?page=2`) or an absolute `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method
    pub method: HttpMethod,
    /// Target path or absolute URL
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
}

impl RequestSpec {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: RequestBody::None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post_json(url: impl Into<String>, json: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url).with_body(RequestBody::json(json))
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put_json(url: impl Into<String>, json: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url).with_body(RequestBody::json(json))
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(Header::new(name, value));
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Returns true if `url` is already absolute.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }

    /// Returns the path component of the target, without query or fragment.
    ///
    /// Path-based rules match on [`crate::PathRules::route`], which also
    /// strips the base URL from absolute targets.
    #[must_use]
    pub fn path(&self) -> String {
        if self.is_absolute() {
            return Url::parse(&self.url)
                .map_or_else(|_| String::from("/"), |u| u.path().to_string());
        }
        let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
        let path = &self.url[..end];
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        }
    }

    /// Resolves the target against `base_url`.
    ///
    /// Relative targets are appended to the base, so a base of
    /// `https://api.example.com/v1` and a target of `/jobs` give
    /// `https://api.example.com/v1/jobs`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the result is not a valid URL.
    pub fn resolve(&self, base_url: &str) -> DomainResult<Url> {
        let full = if self.is_absolute() {
            self.url.clone()
        } else {
            let base = base_url.trim_end_matches('/');
            let target = self.url.trim_start_matches('/');
            format!("{base}/{target}")
        };
        Url::parse(&full).map_err(|e| DomainError::InvalidUrl(format!("{e}: {full}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_request() {
        let req = RequestSpec::get("/jobs");
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_path_strips_query_and_fragment() {
        assert_eq!(RequestSpec::get("/jobs?page=2").path(), "/jobs");
        assert_eq!(RequestSpec::get("profile#top").path(), "/profile");
        assert_eq!(
            RequestSpec::get("https://api.example.com/admin/users?q=1").path(),
            "/admin/users"
        );
    }

    #[test]
    fn test_resolve_keeps_base_path() {
        let req = RequestSpec::get("/wallet");
        let url = req.resolve("https://api.example.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/wallet");
    }

    #[test]
    fn test_resolve_absolute_ignores_base() {
        let req = RequestSpec::get("https://other.example.com/x");
        let url = req.resolve("https://api.example.com").unwrap();
        assert_eq!(url.host_str(), Some("other.example.com"));
    }

    #[test]
    fn test_resolve_invalid_base() {
        let req = RequestSpec::get("/jobs");
        assert!(matches!(
            req.resolve("not a url"),
            Err(DomainError::InvalidUrl(_))
        ));
    }
}
