//! HTTP Request body types

use serde::{Deserialize, Serialize};

/// HTTP request body with its content type.
///
/// Bodies are kept as text so a blocked request can be replayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// Raw body with an explicit content type
    Raw {
        /// The content type (e.g., "application/json", "text/plain")
        content_type: String,
        /// The body content
        content: String,
    },
}

impl RequestBody {
    /// Creates a JSON body from already-serialized text.
    #[must_use]
    pub fn json(content: impl Into<String>) -> Self {
        Self::Raw {
            content_type: "application/json".to_string(),
            content: content.into(),
        }
    }

    /// Creates a JSON body by serializing `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self::json)
    }

    /// Creates a plain text body.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Raw {
            content_type: "text/plain".to_string(),
            content: content.into(),
        }
    }

    /// Returns whether the body is absent or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Raw { content, .. } => content.is_empty(),
        }
    }

    /// Returns the content type if a body is present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Raw { content_type, .. } => Some(content_type),
        }
    }

    /// Returns the body content, empty for [`RequestBody::None`].
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::None => "",
            Self::Raw { content, .. } => content,
        }
    }
}
