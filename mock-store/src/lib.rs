//! In-memory key-attribute store for integration tests.
//!
//! # Design
//! Implements `StoreClient` against a `BTreeMap` keyed by `(hash, range)`,
//! so a partition query naturally comes back in range-key order — the same
//! store-defined order the real table gives. The store semantics the façade
//! depends on are reproduced: unconditional put, upsert on update of a
//! missing key, idempotent delete returning the pre-delete image, and
//! `#alias`/`:placeholder` resolution in key conditions and update
//! expressions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use todo_store::{
    DeleteRequest, DeleteResponse, Item, PutRequest, QueryRequest, QueryResponse, ReturnValues,
    StoreClient, StoreError, UpdateRequest, UpdateResponse,
};
use tokio::sync::RwLock;

/// Key layout of the emulated table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table_name: String,
    pub hash_key: String,
    pub range_key: String,
    /// Secondary index sharing the table's hash key, if the table has one.
    pub index_name: Option<String>,
}

/// Shared in-memory store. Cloning yields a handle to the same data, so a
/// test can keep one handle while the component under test owns another.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    schema: TableSchema,
    items: RwLock<BTreeMap<(String, String), Item>>,
    injected_failure: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            inner: Arc::new(Inner {
                schema,
                items: RwLock::new(BTreeMap::new()),
                injected_failure: Mutex::new(None),
            }),
        }
    }

    /// Fail the next request with `message`; subsequent requests succeed.
    pub fn fail_next(&self, message: &str) {
        *self.inner.injected_failure.lock().unwrap() = Some(message.to_string());
    }

    /// The raw image currently stored at `(hash, range)`, if any.
    pub async fn raw_item(&self, hash: &str, range: &str) -> Option<Item> {
        self.inner
            .items
            .read()
            .await
            .get(&(hash.to_string(), range.to_string()))
            .cloned()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        if let Some(message) = self.inner.injected_failure.lock().unwrap().take() {
            return Err(StoreError::Request(message));
        }
        Ok(())
    }

    fn check_table(&self, table_name: &str) -> Result<(), StoreError> {
        if table_name != self.inner.schema.table_name {
            return Err(StoreError::Request(format!(
                "table {table_name} does not exist"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError> {
        self.check_failure()?;
        self.check_table(&request.table_name)?;
        let schema = &self.inner.schema;
        if let Some(index) = &request.index_name {
            if schema.index_name.as_deref() != Some(index.as_str()) {
                return Err(StoreError::Request(format!("index {index} does not exist")));
            }
        }

        let (lhs, rhs) = split_assignment(&request.key_condition)?;
        let attribute = resolve_name(lhs, &request.expression_names)?;
        if attribute != schema.hash_key {
            return Err(StoreError::Request(format!(
                "`{attribute}` is not the partition key"
            )));
        }
        let value = resolve_value(rhs, &request.expression_values)?;
        let Some(hash) = value.as_str() else {
            return Err(StoreError::Request(
                "partition key value must be a string".to_string(),
            ));
        };

        let items = self.inner.items.read().await;
        let matched = items
            .iter()
            .filter(|((h, _), _)| h.as_str() == hash)
            .map(|(_, item)| item.clone())
            .collect();
        Ok(QueryResponse { items: matched })
    }

    async fn put(&self, request: PutRequest) -> Result<(), StoreError> {
        self.check_failure()?;
        self.check_table(&request.table_name)?;
        let schema = &self.inner.schema;
        let hash = key_attribute(&request.item, &schema.hash_key)?;
        let range = key_attribute(&request.item, &schema.range_key)?;
        self.inner
            .items
            .write()
            .await
            .insert((hash, range), request.item);
        Ok(())
    }

    async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse, StoreError> {
        self.check_failure()?;
        self.check_table(&request.table_name)?;
        let assignments = parse_update_expression(&request)?;
        let schema = &self.inner.schema;
        let key = (request.key.user_id.clone(), request.key.todo_id.clone());

        let mut items = self.inner.items.write().await;
        let old = items.get(&key).cloned();
        let mut item = old.clone().unwrap_or_else(|| {
            // Upsert: a missing key materializes an item holding only the
            // key attributes and the assigned fields.
            let mut fresh = Item::new();
            fresh.insert(schema.hash_key.clone(), Value::String(key.0.clone()));
            fresh.insert(schema.range_key.clone(), Value::String(key.1.clone()));
            fresh
        });
        for (attribute, value) in assignments {
            item.insert(attribute, value);
        }
        items.insert(key, item.clone());

        let attributes = match request.return_values {
            ReturnValues::AllNew => Some(item),
            ReturnValues::AllOld => old,
            ReturnValues::None => None,
        };
        Ok(UpdateResponse { attributes })
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse, StoreError> {
        self.check_failure()?;
        self.check_table(&request.table_name)?;
        // there is no post-delete image; the real store rejects this request
        if request.return_values == ReturnValues::AllNew {
            return Err(StoreError::Request(
                "ReturnValues ALL_NEW is not valid for delete".to_string(),
            ));
        }
        let key = (request.key.user_id.clone(), request.key.todo_id.clone());
        let old = self.inner.items.write().await.remove(&key);
        let attributes = match request.return_values {
            ReturnValues::AllOld => old,
            ReturnValues::AllNew | ReturnValues::None => None,
        };
        Ok(DeleteResponse { attributes })
    }
}

fn key_attribute(item: &Item, name: &str) -> Result<String, StoreError> {
    item.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Request(format!("item missing key attribute `{name}`")))
}

/// Resolve a possibly `#aliased` attribute token against the names map.
fn resolve_name<'a>(
    token: &'a str,
    names: &'a BTreeMap<String, String>,
) -> Result<&'a str, StoreError> {
    if token.starts_with('#') {
        names.get(token).map(String::as_str).ok_or_else(|| {
            StoreError::Request(format!("undefined expression attribute name {token}"))
        })
    } else {
        Ok(token)
    }
}

fn resolve_value(token: &str, values: &BTreeMap<String, Value>) -> Result<Value, StoreError> {
    if !token.starts_with(':') {
        return Err(StoreError::Request(format!(
            "expected value placeholder, got `{token}`"
        )));
    }
    values.get(token).cloned().ok_or_else(|| {
        StoreError::Request(format!("undefined expression attribute value {token}"))
    })
}

/// Split `lhs = rhs`, tolerating missing spaces around the `=` (the search
/// key condition is written `#userId = :userId`, but drivers must also
/// accept the compact `#userId =:i` shape).
fn split_assignment(clause: &str) -> Result<(&str, &str), StoreError> {
    let (lhs, rhs) = clause.split_once('=').ok_or_else(|| {
        StoreError::Request(format!("malformed expression clause `{clause}`"))
    })?;
    Ok((lhs.trim(), rhs.trim()))
}

/// Parse a `set a = :v, b = :w` update expression into resolved
/// attribute/value pairs.
fn parse_update_expression(request: &UpdateRequest) -> Result<Vec<(String, Value)>, StoreError> {
    let expression = request.update_expression.trim();
    let clauses = expression
        .strip_prefix("set ")
        .or_else(|| expression.strip_prefix("SET "))
        .ok_or_else(|| {
            StoreError::Request(format!("unsupported update expression `{expression}`"))
        })?;

    clauses
        .split(',')
        .map(|clause| {
            let (lhs, rhs) = split_assignment(clause)?;
            let attribute = resolve_name(lhs, &request.expression_names)?;
            let value = resolve_value(rhs, &request.expression_values)?;
            Ok((attribute.to_string(), value))
        })
        .collect()
}
