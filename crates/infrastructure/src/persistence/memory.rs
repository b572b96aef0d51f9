//! In-memory token persistence.

use async_trait::async_trait;
use parking_lot::Mutex;
use tollgate_application::ports::{PersistenceError, TokenEntries, TokenPersistence};

/// Keeps persisted tokens in memory, e.g. for tests or embedded hosts.
#[derive(Debug, Default)]
pub struct InMemoryTokenPersistence {
    entries: Mutex<TokenEntries>,
}

impl InMemoryTokenPersistence {
    /// Creates a backend pre-filled with `entries`.
    #[must_use]
    pub fn with_entries(entries: TokenEntries) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Returns what was last saved.
    #[must_use]
    pub fn entries(&self) -> TokenEntries {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl TokenPersistence for InMemoryTokenPersistence {
    async fn load(&self) -> Result<TokenEntries, PersistenceError> {
        Ok(self.entries())
    }

    async fn save(&self, entries: &TokenEntries) -> Result<(), PersistenceError> {
        *self.entries.lock() = entries.clone();
        Ok(())
    }
}
