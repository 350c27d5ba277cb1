//! Error types for the todo store.
//!
//! # Design
//! Absence is not an error: an empty partition reads back as an empty
//! sequence and deleting a missing key returns nothing, so there is no
//! not-found variant. `Request` carries whatever the driver surfaced
//! (network, throttling, permission, malformed request) unmodified — this
//! component never retries and never translates store error codes; the
//! caller owns retry and backoff policy.

use thiserror::Error;

/// Errors returned by `TodoStore` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying store rejected or failed the request.
    #[error("store request failed: {0}")]
    Request(String),

    /// A retrieved item lacks an attribute the operation depends on.
    #[error("item {user_id}/{todo_id} has no `{attribute}` attribute")]
    MissingAttribute {
        attribute: &'static str,
        user_id: String,
        todo_id: String,
    },

    /// A stored item could not be read back as a `TodoItem`.
    #[error("item deserialization failed: {0}")]
    Deserialization(String),

    /// An entity could not be serialized into store attributes.
    #[error("item serialization failed: {0}")]
    Serialization(String),
}
