//! Store transport types for the request-as-data pattern.
//!
//! # Design
//! These types describe key-attribute store requests and responses as plain
//! data. The core builds request values and parses response values without
//! talking to any store — a `StoreClient` implementation executes them: the
//! DynamoDB driver in production, the in-memory store in tests. This keeps
//! request construction deterministic and directly assertable.
//!
//! Attribute names and expression strings inside requests are the
//! load-bearing contract; how they are encoded on the wire is the driver's
//! concern.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// One stored record: an attribute name → value map.
pub type Item = Map<String, Value>;

/// Full primary key of a todo item. Addressing by `todoId` alone is not
/// supported; the partition design makes `userId` mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub user_id: String,
    pub todo_id: String,
}

/// Which item image a mutating request asks the store to send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnValues {
    None,
    /// The pre-mutation image.
    AllOld,
    /// The post-mutation image. Valid for updates only; deletes have no
    /// post-mutation image and the store rejects the combination.
    AllNew,
}

/// Query for every item in one partition, optionally through a secondary
/// index.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    /// Key condition, e.g. `userId = :userId`. May use `#alias` names.
    pub key_condition: String,
    /// `#alias` → attribute name. Empty when the condition uses no aliases.
    pub expression_names: BTreeMap<String, String>,
    /// `:placeholder` → value.
    pub expression_values: BTreeMap<String, Value>,
}

/// Unconditional full-item write. A duplicate key silently overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    pub table_name: String,
    pub item: Item,
}

/// Partial attribute update addressed by the full primary key.
///
/// The update expression assigns `:placeholder` values to `#alias` names;
/// aliasing is required because some attribute names (`name`, `done`) are
/// reserved words in the store's expression dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub table_name: String,
    pub key: Key,
    pub update_expression: String,
    pub expression_names: BTreeMap<String, String>,
    pub expression_values: BTreeMap<String, Value>,
    pub return_values: ReturnValues,
}

/// Delete addressed by the full primary key. Deleting a missing key is a
/// no-op, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub table_name: String,
    pub key: Key,
    pub return_values: ReturnValues,
}

/// Items in store-defined order (typically range-key order within the
/// partition).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub items: Vec<Item>,
}

/// The item image requested via [`ReturnValues`], if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResponse {
    pub attributes: Option<Item>,
}

/// The pre-delete image, or `None` if no item existed at the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResponse {
    pub attributes: Option<Item>,
}

/// Execution seam for store requests.
///
/// Drivers must honor `#alias` attribute-name indirection, `:placeholder`
/// value substitution, upsert semantics when updating a missing key, and
/// idempotent deletes of missing keys.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError>;
    async fn put(&self, request: PutRequest) -> Result<(), StoreError>;
    async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse, StoreError>;
    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse, StoreError>;
}
