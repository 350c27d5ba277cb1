//! Data-access layer for per-user todo collections.
//!
//! # Overview
//! `TodoStore` translates domain operations (list, create, partial update,
//! delete, attachment update, keyword search) into requests against a managed
//! key-attribute store. Items are addressed by the `(userId, todoId)` primary
//! key; a secondary index keyed by `userId` serves user-scoped listing.
//!
//! # Design
//! - Requests and responses cross the `StoreClient` seam as plain data; the
//!   DynamoDB driver and the in-memory test store both implement it.
//! - `TodoStore` holds only its client and immutable table/index names fixed
//!   at construction — no ambient environment reads, no mutable state.
//! - Every operation is one stateless round trip: no retries, no caching, no
//!   cross-call coordination. Store failures bubble to the caller unmodified;
//!   absence of an item is an empty result, never an error.

pub mod client;
pub mod error;
pub mod store;
pub mod types;

pub use client::{StoreConfig, TodoStore};
pub use error::StoreError;
pub use store::{
    DeleteRequest, DeleteResponse, Item, Key, PutRequest, QueryRequest, QueryResponse,
    ReturnValues, StoreClient, UpdateRequest, UpdateResponse,
};
pub use types::{TodoItem, TodoUpdate};
