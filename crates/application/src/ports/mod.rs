//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod http_client;
mod navigator;
mod token_persistence;
mod token_refresher;

pub use http_client::{HttpClient, HttpClientError};
pub use navigator::Navigator;
pub use token_persistence::{PersistenceError, TokenEntries, TokenPersistence};
pub use token_refresher::TokenRefresher;
