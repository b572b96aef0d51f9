//! Token persistence port
//!
//! Defines the interface for the key/value storage behind the token store.

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Errors that can occur during token persistence.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Persisted token entries, keyed by storage key.
pub type TokenEntries = BTreeMap<String, String>;

/// Repository trait for token persistence.
///
/// The token store always writes its complete state, so implementations only
/// need to load and replace the whole map.
#[async_trait]
pub trait TokenPersistence: Send + Sync {
    /// Loads every persisted entry.
    ///
    /// # Returns
    /// The stored entries. Returns an empty map if nothing was persisted yet.
    async fn load(&self) -> Result<TokenEntries, PersistenceError>;

    /// Replaces the persisted entries with `entries`.
    ///
    /// # Errors
    /// Returns an error if the entries cannot be written.
    async fn save(&self, entries: &TokenEntries) -> Result<(), PersistenceError>;
}
