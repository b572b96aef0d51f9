//! Session handling for outgoing requests.
//!
//! This module provides:
//! - Token storage shared by every request
//! - Bearer attachment and dispatch
//! - Failure classification
//! - Single-flight token refresh with a waiter queue
//! - Forced sign-out

mod classifier;
mod coordinator;
mod dispatcher;
mod terminator;
mod token_store;

pub use classifier::{ResponseClassifier, signals_expired_session};
pub use coordinator::RefreshCoordinator;
pub use dispatcher::{Attempt, RequestDispatcher, authorize};
pub use terminator::{SessionTerminator, Termination};
pub use token_store::{
    ACCESS_TOKEN_KEY, ADMIN_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStatus, TokenStore,
};
