//! Session token storage.
//!
//! Holds the regular token pair and the administrative token in memory and
//! mirrors every change to a [`TokenPersistence`] backend.

use std::sync::Arc;

use tokio::sync::RwLock;
use tollgate_domain::{RefreshedTokens, TokenPair, TokenSnapshot};

use crate::ports::{PersistenceError, TokenEntries, TokenPersistence};

/// Storage key of the regular access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key of the regular refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key of the administrative token.
pub const ADMIN_TOKEN_KEY: &str = "admin_token";

/// Thread-safe token store shared by every part of the session client.
///
/// Cloning is cheap and every clone sees the same tokens.
#[derive(Clone)]
pub struct TokenStore {
    entries: Arc<RwLock<TokenEntries>>,
    persistence: Option<Arc<dyn TokenPersistence>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("persistent", &self.persistence.is_some())
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates an empty store that keeps tokens in memory only.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            entries: Arc::new(RwLock::new(TokenEntries::new())),
            persistence: None,
        }
    }

    /// Restores a store from `persistence`; later changes are written back to it.
    ///
    /// Entries under unknown keys are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted tokens cannot be read.
    pub async fn load(persistence: Arc<dyn TokenPersistence>) -> Result<Self, PersistenceError> {
        let mut entries = persistence.load().await?;
        entries.retain(|key, value| {
            !value.is_empty()
                && matches!(
                    key.as_str(),
                    ACCESS_TOKEN_KEY | REFRESH_TOKEN_KEY | ADMIN_TOKEN_KEY
                )
        });
        tracing::debug!(restored = entries.len(), "token store loaded");
        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            persistence: Some(persistence),
        })
    }

    /// Returns a copy of every stored token.
    pub async fn snapshot(&self) -> TokenSnapshot {
        let entries = self.entries.read().await;
        TokenSnapshot {
            access_token: entries.get(ACCESS_TOKEN_KEY).cloned(),
            refresh_token: entries.get(REFRESH_TOKEN_KEY).cloned(),
            admin_token: entries.get(ADMIN_TOKEN_KEY).cloned(),
        }
    }

    /// Returns the regular access token.
    pub async fn access_token(&self) -> Option<String> {
        self.entries.read().await.get(ACCESS_TOKEN_KEY).cloned()
    }

    /// Returns the regular refresh token.
    pub async fn refresh_token(&self) -> Option<String> {
        self.entries.read().await.get(REFRESH_TOKEN_KEY).cloned()
    }

    /// Returns the administrative token.
    pub async fn admin_token(&self) -> Option<String> {
        self.entries.read().await.get(ADMIN_TOKEN_KEY).cloned()
    }

    /// Stores the token pair issued at login.
    ///
    /// An empty refresh token is not stored; such a session cannot be renewed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be persisted.
    pub async fn sign_in(&self, pair: TokenPair) -> Result<(), PersistenceError> {
        self.update(|entries| {
            entries.insert(ACCESS_TOKEN_KEY.to_string(), pair.access_token);
            if pair.refresh_token.is_empty() {
                entries.remove(REFRESH_TOKEN_KEY);
            } else {
                entries.insert(REFRESH_TOKEN_KEY.to_string(), pair.refresh_token);
            }
        })
        .await
    }

    /// Stores the administrative token issued at admin login.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    pub async fn sign_in_admin(&self, token: impl Into<String>) -> Result<(), PersistenceError> {
        let token = token.into();
        self.update(|entries| {
            entries.insert(ADMIN_TOKEN_KEY.to_string(), token);
        })
        .await
    }

    /// Stores the result of a token refresh.
    ///
    /// The refresh token is only replaced when the server rotated it.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be persisted.
    pub async fn apply_refresh(&self, refreshed: &RefreshedTokens) -> Result<(), PersistenceError> {
        self.update(|entries| {
            entries.insert(
                ACCESS_TOKEN_KEY.to_string(),
                refreshed.access_token.clone(),
            );
            if let Some(rotated) = refreshed.refresh_token.as_ref().filter(|t| !t.is_empty()) {
                entries.insert(REFRESH_TOKEN_KEY.to_string(), rotated.clone());
            }
        })
        .await
    }

    /// Removes the regular token pair; the admin token is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted. The tokens are
    /// gone from memory either way.
    pub async fn clear_session(&self) -> Result<(), PersistenceError> {
        self.update(|entries| {
            entries.remove(ACCESS_TOKEN_KEY);
            entries.remove(REFRESH_TOKEN_KEY);
        })
        .await
    }

    /// Removes the administrative token; the regular pair is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted. The token is
    /// gone from memory either way.
    pub async fn clear_admin(&self) -> Result<(), PersistenceError> {
        self.update(|entries| {
            entries.remove(ADMIN_TOKEN_KEY);
        })
        .await
    }

    /// Returns the regular session status for UI display.
    pub async fn status(&self) -> TokenStatus {
        let entries = self.entries.read().await;
        match (
            entries.contains_key(ACCESS_TOKEN_KEY),
            entries.contains_key(REFRESH_TOKEN_KEY),
        ) {
            (false, false) => TokenStatus::NotAuthenticated,
            (true, can_refresh) => TokenStatus::Authenticated { can_refresh },
            (false, true) => TokenStatus::RefreshOnly,
        }
    }

    /// Returns true if an administrative token is stored.
    pub async fn is_admin_signed_in(&self) -> bool {
        self.entries.read().await.contains_key(ADMIN_TOKEN_KEY)
    }

    /// Applies `change` in memory, then writes the full state back.
    ///
    /// The write lock is held across the save so persisted state follows the
    /// same order as in-memory changes.
    async fn update<F>(&self, change: F) -> Result<(), PersistenceError>
    where
        F: FnOnce(&mut TokenEntries),
    {
        let mut entries = self.entries.write().await;
        change(&mut entries);
        match &self.persistence {
            Some(persistence) => persistence.save(&entries).await,
            None => Ok(()),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::ephemeral()
    }
}

/// Status of the regular session for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No regular token is stored.
    NotAuthenticated,
    /// An access token is stored.
    Authenticated {
        /// Whether a refresh token is stored alongside it.
        can_refresh: bool,
    },
    /// Only a refresh token is stored; the next request will renew the session.
    RefreshOnly,
}

impl TokenStatus {
    /// Returns true if requests will carry a regular token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub const fn display_message(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "Not signed in",
            Self::Authenticated { can_refresh: true } => "Signed in (will auto-refresh)",
            Self::Authenticated { can_refresh: false } => "Signed in",
            Self::RefreshOnly => "Session will be renewed on next request",
        }
    }
}
