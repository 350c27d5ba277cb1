//! Domain entities for the todo store.
//!
//! # Design
//! Attribute names are the load-bearing contract with the store, so the wire
//! shape keeps the camelCase names (`userId`, `todoId`, ...) the table is
//! keyed and indexed by. `userId` and `todoId` are required and immutable
//! after creation; `dueDate` and `attachmentUrl` are genuinely optional.
//! Arbitrary caller-supplied attributes ride along opaquely in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A persisted todo item. `(user_id, todo_id)` is the primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub user_id: String,
    pub todo_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub done: bool,
    /// Set only by the dedicated attachment operation; the general partial
    /// update never touches it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    /// Any further attributes supplied at creation, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The field subset applied by the general partial update. Never persisted
/// on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoUpdate {
    pub name: String,
    pub due_date: Option<String>,
    pub done: bool,
}
