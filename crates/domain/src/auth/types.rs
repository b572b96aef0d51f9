//! Session credential types

use serde::{Deserialize, Serialize};

/// Regular session credentials issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived token that authorizes requests.
    pub access_token: String,
    /// Longer-lived token that authorizes one renewal per call.
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Successful answer of the refresh endpoint.
///
/// `refresh_token` is only present when the server rotates it; otherwise the
/// stored refresh token stays valid for the next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedTokens {
    /// The new access token.
    pub access_token: String,
    /// The rotated refresh token, if the server issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Point-in-time copy of every stored credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSnapshot {
    /// Regular access token.
    pub access_token: Option<String>,
    /// Regular refresh token.
    pub refresh_token: Option<String>,
    /// Administrative token.
    pub admin_token: Option<String>,
}

impl TokenSnapshot {
    /// Returns true if any regular session token is present.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }
}

/// Which credential was attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFamily {
    /// The regular access token.
    Regular,
    /// The administrative token.
    Admin,
    /// No credential was available or the request is exempt.
    None,
}

impl TokenFamily {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Admin => "admin",
            Self::None => "none",
        }
    }
}

/// The two independent sessions a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Access token plus refresh token.
    Regular,
    /// Administrative token, which cannot be refreshed.
    Admin,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regular => f.write_str("regular"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Returns a log-safe preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_refreshed_tokens_optional_refresh() {
        let parsed: RefreshedTokens =
            serde_json::from_str(r#"{"access_token":"a1"}"#).expect("valid json");
        assert_eq!(parsed.refresh_token, None);

        let rotated: RefreshedTokens =
            serde_json::from_str(r#"{"access_token":"a1","refresh_token":"r2"}"#)
                .expect("valid json");
        assert_eq!(rotated.refresh_token.as_deref(), Some("r2"));
    }

    #[test]
    fn test_snapshot_has_session() {
        assert!(!TokenSnapshot::default().has_session());
        let admin_only = TokenSnapshot {
            admin_token: Some("adm".to_string()),
            ..TokenSnapshot::default()
        };
        assert!(!admin_only.has_session());
        let refresh_only = TokenSnapshot {
            refresh_token: Some("r".to_string()),
            ..TokenSnapshot::default()
        };
        assert!(refresh_only.has_session());
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "***");
    }
}
