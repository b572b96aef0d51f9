//! Authentication domain types

mod failure;
mod types;

pub use failure::{FailureKind, RefreshError};
pub use types::{
    RefreshedTokens, SessionKind, TokenFamily, TokenPair, TokenSnapshot, token_preview,
};
