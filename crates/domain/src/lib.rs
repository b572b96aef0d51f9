//! Tollgate Domain - Core session types
//!
//! This crate defines the domain model for the Tollgate session client:
//! requests and responses, session credentials, failure classification and
//! path rules. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod settings;

pub use auth::{
    FailureKind, RefreshError, RefreshedTokens, SessionKind, TokenFamily, TokenPair,
    TokenSnapshot, token_preview,
};
pub use error::{DomainError, DomainResult};
pub use request::{Header, Headers, HttpMethod, PendingRequest, RequestBody, RequestSpec};
pub use response::{ResponseSpec, StatusCode};
pub use settings::{PathRules, SessionConfig};
