//! Requests captured while the session is being renewed.

use uuid::Uuid;

use super::RequestSpec;

/// An outgoing request as the session pipeline tracks it.
///
/// The request description is kept unmodified so it can be re-issued after a
/// token refresh. `retried` is set exactly once, when the request is replayed
/// after the session was renewed; a retried request is never replayed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Correlation id for logs.
    pub id: Uuid,
    /// The caller's original request.
    pub request: RequestSpec,
    retried: bool,
}

impl PendingRequest {
    /// Wraps a request that has not been sent yet.
    #[must_use]
    pub fn new(request: RequestSpec) -> Self {
        Self {
            id: Uuid::now_v7(),
            request,
            retried: false,
        }
    }

    /// Returns true if this request has already been replayed after a refresh.
    #[must_use]
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    /// Marks the request as replayed.
    pub const fn mark_retried(&mut self) {
        self.retried = true;
    }
}

impl From<RequestSpec> for PendingRequest {
    fn from(request: RequestSpec) -> Self {
        Self::new(request)
    }
}
