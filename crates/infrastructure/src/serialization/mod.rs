//! Deterministic JSON serialization for the token file.
//!
//! Keys are sorted (the token map is a `BTreeMap`), indentation is two spaces
//! and output ends with a newline.

mod json;

pub use json::*;
