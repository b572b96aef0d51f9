//! Tollgate Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the reqwest transport, the refresh
//! endpoint client, token files and a navigator for headless hosts.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::{MAX_REDIRECTS, ReqwestHttpClient, ReqwestTokenRefresher, WatchNavigator};
pub use persistence::{FileTokenPersistence, InMemoryTokenPersistence};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
