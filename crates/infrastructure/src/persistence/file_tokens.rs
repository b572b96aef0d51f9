//! File-based token persistence.
//!
//! Tokens are stored as a flat JSON object:
//! ```json
//! {
//!   "refresh_token": "...",
//!   "token": "..."
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tollgate_application::ports::{PersistenceError, TokenEntries, TokenPersistence};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// Keeps session tokens in a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenPersistence {
    path: PathBuf,
}

impl FileTokenPersistence {
    /// Creates a persistence backend writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file tokens are written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenPersistence for FileTokenPersistence {
    async fn load(&self) -> Result<TokenEntries, PersistenceError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TokenEntries::new());
            }
            Err(e) => return Err(e.into()),
        };

        from_json_bytes(&content).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    async fn save(&self, entries: &TokenEntries) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(entries)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
