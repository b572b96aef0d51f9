//! Forced sign-out.

use std::sync::Arc;

use tollgate_domain::{SessionConfig, SessionKind};

use super::TokenStore;
use crate::ports::Navigator;

/// What a termination did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// Which session was ended.
    pub kind: SessionKind,
    /// False when the user was already on the sign-in surface.
    pub redirected: bool,
}

/// Ends a session that cannot be recovered.
#[derive(Clone)]
pub struct SessionTerminator {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    sign_in_path: String,
    admin_sign_in_path: String,
}

impl SessionTerminator {
    /// Creates a terminator redirecting to the sign-in surfaces of `config`.
    #[must_use]
    pub fn new(store: TokenStore, navigator: Arc<dyn Navigator>, config: &SessionConfig) -> Self {
        Self {
            store,
            navigator,
            sign_in_path: config.sign_in_path.clone(),
            admin_sign_in_path: config.admin_sign_in_path.clone(),
        }
    }

    /// Returns the sign-in surface for `kind`.
    #[must_use]
    pub fn sign_in_target(&self, kind: SessionKind) -> &str {
        match kind {
            SessionKind::Regular => &self.sign_in_path,
            SessionKind::Admin => &self.admin_sign_in_path,
        }
    }

    /// Clears the tokens of `kind` and sends the user to its sign-in surface.
    ///
    /// The redirect is skipped when the user is already there. A storage
    /// failure is logged; the tokens are already gone from memory.
    pub async fn terminate(&self, kind: SessionKind) -> Termination {
        let cleared = match kind {
            SessionKind::Regular => self.store.clear_session().await,
            SessionKind::Admin => self.store.clear_admin().await,
        };
        if let Err(e) = cleared {
            tracing::warn!(session = %kind, error = %e, "failed to persist cleared tokens");
        }

        let target = self.sign_in_target(kind);
        let current = self.navigator.current_location();
        let redirected = if location_path(&current) == target {
            false
        } else {
            self.navigator.redirect(target);
            true
        };

        tracing::info!(session = %kind, sign_in = target, redirected, "session terminated");
        Termination { kind, redirected }
    }
}

fn location_path(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
