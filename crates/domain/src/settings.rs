//! Session client settings
//!
//! Defines where the backend lives, which paths are administrative, and where
//! a user is sent when a session ends.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::request::RequestSpec;

/// Configuration for the session client.
///
/// Every field has a default so partial configuration files deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL that relative request paths are appended to.
    pub base_url: String,
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Prefix of authentication endpoints (login, refresh, ...).
    pub auth_prefix: String,
    /// Path prefixes served with the administrative token.
    pub admin_prefixes: Vec<String>,
    /// Sign-in surface for the regular session.
    pub sign_in_path: String,
    /// Sign-in surface for the administrative session.
    pub admin_sign_in_path: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// File the tokens are persisted to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            auth_prefix: "/auth".to_string(),
            admin_prefixes: vec!["/admin".to_string()],
            sign_in_path: "/login".to_string(),
            admin_sign_in_path: "/admin/login".to_string(),
            request_timeout_ms: 30_000,
            token_file: None,
        }
    }
}

impl SessionConfig {
    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidConfiguration`] if the base URL is not
    /// http(s), a path does not start with `/`, or the timeout is zero.
    pub fn validate(&self) -> DomainResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(DomainError::InvalidConfiguration(format!(
                "base URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        let paths = [
            &self.refresh_path,
            &self.auth_prefix,
            &self.sign_in_path,
            &self.admin_sign_in_path,
        ];
        if let Some(bad) = paths
            .into_iter()
            .chain(self.admin_prefixes.iter())
            .find(|p| !p.starts_with('/'))
        {
            return Err(DomainError::InvalidConfiguration(format!(
                "path must start with '/': {bad}"
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(DomainError::InvalidConfiguration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the path rules derived from this configuration.
    #[must_use]
    pub fn path_rules(&self) -> PathRules {
        PathRules {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            refresh_path: self.refresh_path.clone(),
            auth_prefix: self.auth_prefix.clone(),
            admin_prefixes: self.admin_prefixes.clone(),
        }
    }
}

/// Path-based request classification.
///
/// Prefixes match whole path segments: `/admin` matches `/admin` and
/// `/admin/users`, never `/administrator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRules {
    base_url: String,
    refresh_path: String,
    auth_prefix: String,
    admin_prefixes: Vec<String>,
}

impl PathRules {
    /// Returns the path the rules below match `request` on.
    ///
    /// An absolute URL under the base URL is matched on the part after the
    /// base, the same as its relative form: with a base of
    /// `https://api.example.com/v1`, `https://api.example.com/v1/admin/users`
    /// gives `/admin/users`. Other absolute URLs keep their full path.
    #[must_use]
    pub fn route(&self, request: &RequestSpec) -> String {
        if request.is_absolute()
            && let Some(rest) = request.url.strip_prefix(&self.base_url)
            && (rest.is_empty() || rest.starts_with(['/', '?', '#']))
        {
            return RequestSpec::get(rest).path();
        }
        request.path()
    }

    /// Returns true if `path` is served with the administrative token.
    #[must_use]
    pub fn is_admin(&self, path: &str) -> bool {
        self.admin_prefixes.iter().any(|p| has_segment_prefix(path, p))
    }

    /// Returns true if `path` is an authentication endpoint.
    #[must_use]
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        has_segment_prefix(path, &self.auth_prefix)
    }

    /// Returns true if `path` is the refresh endpoint.
    #[must_use]
    pub fn is_refresh(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.refresh_path.trim_end_matches('/')
    }
}

impl Default for PathRules {
    fn default() -> Self {
        SessionConfig::default().path_rules()
    }
}

fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
