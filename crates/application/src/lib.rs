//! Tollgate Application - Session coordination
//!
//! This crate holds the session logic of the Tollgate client:
//! - Ports for the HTTP transport, the refresh endpoint, token storage and
//!   navigation
//! - The token store and the request pipeline built on it
//! - Single-flight token refresh shared by concurrent requests

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;

pub use auth::{
    RefreshCoordinator, RequestDispatcher, ResponseClassifier, SessionTerminator, Termination,
    TokenStatus, TokenStore,
};
pub use client::SessionClient;
pub use error::{ClientError, ClientResult};
pub use ports::{
    HttpClient, HttpClientError, Navigator, PersistenceError, TokenEntries, TokenPersistence,
    TokenRefresher,
};
