//! Store façade translating todo operations into key-attribute requests.
//!
//! # Design
//! `TodoStore` holds an executing client plus immutable table/index names
//! injected at construction. Each operation is a single stateless round
//! trip: build one request, await the client, map the response. There is no
//! retry, caching, or cross-call coordination — concurrent writes are
//! arbitrated by the store itself (last writer wins).

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{
    DeleteRequest, Item, Key, PutRequest, QueryRequest, ReturnValues, StoreClient, UpdateRequest,
};
use crate::types::{TodoItem, TodoUpdate};

/// Table and index names, read once by the caller (e.g. from deployment
/// configuration) and fixed for the component's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub table_name: String,
    /// Secondary index keyed by `userId`, used for user-scoped listing.
    pub index_name: String,
}

/// Data-access façade over one user-partitioned todo table.
#[derive(Debug, Clone)]
pub struct TodoStore<C> {
    client: C,
    config: StoreConfig,
}

impl<C: StoreClient> TodoStore<C> {
    pub fn new(client: C, config: StoreConfig) -> Self {
        Self { client, config }
    }

    /// All items owned by `user_id`, queried through the user index, in the
    /// order the store returns them. An empty partition is an empty vec,
    /// never an error.
    pub async fn get_todos_for_user(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        debug!(user_id, "get todos for user");

        let request = QueryRequest {
            table_name: self.config.table_name.clone(),
            index_name: Some(self.config.index_name.clone()),
            key_condition: "userId = :userId".to_string(),
            expression_names: BTreeMap::new(),
            expression_values: BTreeMap::from([(
                ":userId".to_string(),
                Value::String(user_id.to_string()),
            )]),
        };

        let response = self.client.query(request).await?;
        response.items.into_iter().map(item_to_todo).collect()
    }

    /// Write the full item unconditionally and return it as written. A
    /// duplicate `(userId, todoId)` silently overwrites the existing item.
    pub async fn create_todo_item(&self, todo_item: TodoItem) -> Result<TodoItem, StoreError> {
        debug!(
            user_id = %todo_item.user_id,
            todo_id = %todo_item.todo_id,
            "create todo"
        );

        let request = PutRequest {
            table_name: self.config.table_name.clone(),
            item: todo_to_item(&todo_item)?,
        };
        self.client.put(request).await?;
        Ok(todo_item)
    }

    /// Partial update of exactly `name`, `dueDate` and `done`, returning the
    /// post-update image.
    ///
    /// All three attribute names are aliased: `name` and `done` collide with
    /// reserved words in the store's expression dialect. Updating a missing
    /// key upserts an item holding only the key and these three fields;
    /// callers must ensure the key exists if that is undesired.
    pub async fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        updated_todo: TodoUpdate,
    ) -> Result<TodoItem, StoreError> {
        debug!(user_id, todo_id, "updating todo");

        let request = UpdateRequest {
            table_name: self.config.table_name.clone(),
            key: Key {
                user_id: user_id.to_string(),
                todo_id: todo_id.to_string(),
            },
            update_expression: "set #name = :name, #dueDate = :dueDate, #done = :done"
                .to_string(),
            expression_names: BTreeMap::from([
                ("#name".to_string(), "name".to_string()),
                ("#dueDate".to_string(), "dueDate".to_string()),
                ("#done".to_string(), "done".to_string()),
            ]),
            expression_values: BTreeMap::from([
                (":name".to_string(), Value::String(updated_todo.name)),
                (
                    ":dueDate".to_string(),
                    updated_todo.due_date.map_or(Value::Null, Value::String),
                ),
                (":done".to_string(), Value::Bool(updated_todo.done)),
            ]),
            return_values: ReturnValues::AllNew,
        };

        let response = self.client.update(request).await?;
        let attributes = response
            .attributes
            .ok_or_else(|| StoreError::Request("update returned no item image".to_string()))?;
        item_to_todo(attributes)
    }

    /// Delete `(user_id, todo_id)` and return the pre-delete image, or
    /// `None` if nothing was stored at that key.
    pub async fn delete_todo(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<TodoItem>, StoreError> {
        debug!(user_id, todo_id, "deleting todo");

        let request = DeleteRequest {
            table_name: self.config.table_name.clone(),
            key: Key {
                user_id: user_id.to_string(),
                todo_id: todo_id.to_string(),
            },
            return_values: ReturnValues::AllOld,
        };

        let response = self.client.delete(request).await?;
        response.attributes.map(item_to_todo).transpose()
    }

    /// Partial update of exactly the `attachmentUrl` attribute, returning
    /// the post-update image.
    ///
    /// Same upsert caveat as [`Self::update_todo`], with a sharper edge: a
    /// missing key upserts an item holding only the key and `attachmentUrl`,
    /// which no longer satisfies the entity schema — the call itself, and
    /// later listings of the partition, fail with
    /// [`StoreError::Deserialization`]. Callers must ensure the key exists.
    pub async fn update_todo_attachment_url(
        &self,
        user_id: &str,
        todo_id: &str,
        attachment_url: &str,
    ) -> Result<TodoItem, StoreError> {
        debug!(user_id, todo_id, "updating attachment url");

        let request = UpdateRequest {
            table_name: self.config.table_name.clone(),
            key: Key {
                user_id: user_id.to_string(),
                todo_id: todo_id.to_string(),
            },
            update_expression: "set #attachmentUrl = :attachmentUrl".to_string(),
            expression_names: BTreeMap::from([(
                "#attachmentUrl".to_string(),
                "attachmentUrl".to_string(),
            )]),
            expression_values: BTreeMap::from([(
                ":attachmentUrl".to_string(),
                Value::String(attachment_url.to_string()),
            )]),
            return_values: ReturnValues::AllNew,
        };

        let response = self.client.update(request).await?;
        let attributes = response
            .attributes
            .ok_or_else(|| StoreError::Request("update returned no item image".to_string()))?;
        item_to_todo(attributes)
    }

    /// All of `user_id`'s items whose `name` contains `keyword` as a
    /// case-sensitive substring.
    ///
    /// Queries the base table partition, then filters in memory — O(partition
    /// size), acceptable because partitions are expected to stay small. An
    /// item without a `name` attribute fails the whole call with
    /// [`StoreError::MissingAttribute`].
    pub async fn search_todos(
        &self,
        user_id: &str,
        keyword: &str,
    ) -> Result<Vec<TodoItem>, StoreError> {
        debug!(user_id, keyword, "searching todos");

        let request = QueryRequest {
            table_name: self.config.table_name.clone(),
            index_name: None,
            key_condition: "#userId = :userId".to_string(),
            expression_names: BTreeMap::from([(
                "#userId".to_string(),
                "userId".to_string(),
            )]),
            expression_values: BTreeMap::from([(
                ":userId".to_string(),
                Value::String(user_id.to_string()),
            )]),
        };

        let response = self.client.query(request).await?;
        let mut matches = Vec::new();
        for item in response.items {
            if item_name(&item)?.contains(keyword) {
                matches.push(item_to_todo(item)?);
            }
        }
        Ok(matches)
    }
}

fn item_to_todo(item: Item) -> Result<TodoItem, StoreError> {
    serde_json::from_value(Value::Object(item))
        .map_err(|e| StoreError::Deserialization(e.to_string()))
}

fn todo_to_item(todo: &TodoItem) -> Result<Item, StoreError> {
    match serde_json::to_value(todo) {
        Ok(Value::Object(item)) => Ok(item),
        Ok(_) => Err(StoreError::Serialization(
            "todo item did not serialize to an attribute map".to_string(),
        )),
        Err(e) => Err(StoreError::Serialization(e.to_string())),
    }
}

/// The `name` attribute of a raw item. The search filter dereferences it
/// unconditionally; absence is surfaced as a typed error rather than the
/// item being skipped.
fn item_name(item: &Item) -> Result<&str, StoreError> {
    item.get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::MissingAttribute {
            attribute: "name",
            user_id: attr_str(item, "userId"),
            todo_id: attr_str(item, "todoId"),
        })
}

fn attr_str(item: &Item, attribute: &str) -> String {
    item.get(attribute)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Map};

    use super::*;
    use crate::store::{DeleteResponse, QueryResponse, UpdateResponse};

    /// Records the last request of each kind and replays canned responses.
    #[derive(Default)]
    struct RecordingClient {
        query_request: Mutex<Option<QueryRequest>>,
        update_request: Mutex<Option<UpdateRequest>>,
        delete_request: Mutex<Option<DeleteRequest>>,
        put_request: Mutex<Option<PutRequest>>,
        query_items: Vec<Item>,
        update_attributes: Option<Item>,
        delete_attributes: Option<Item>,
    }

    #[async_trait]
    impl<'a> StoreClient for &'a RecordingClient {
        async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError> {
            *self.query_request.lock().unwrap() = Some(request);
            Ok(QueryResponse {
                items: self.query_items.clone(),
            })
        }

        async fn put(&self, request: PutRequest) -> Result<(), StoreError> {
            *self.put_request.lock().unwrap() = Some(request);
            Ok(())
        }

        async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse, StoreError> {
            *self.update_request.lock().unwrap() = Some(request);
            Ok(UpdateResponse {
                attributes: self.update_attributes.clone(),
            })
        }

        async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse, StoreError> {
            *self.delete_request.lock().unwrap() = Some(request);
            Ok(DeleteResponse {
                attributes: self.delete_attributes.clone(),
            })
        }
    }

    fn config() -> StoreConfig {
        StoreConfig {
            table_name: "Todos".to_string(),
            index_name: "CreatedAtIndex".to_string(),
        }
    }

    fn raw_item(user_id: &str, todo_id: &str, name: &str) -> Item {
        match json!({
            "userId": user_id,
            "todoId": todo_id,
            "name": name,
            "done": false,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn list_queries_the_user_index() {
        let client = RecordingClient {
            query_items: vec![raw_item("u1", "t1", "Buy milk")],
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let todos = store.get_todos_for_user("u1").await.unwrap();

        let request = client.query_request.lock().unwrap().take().unwrap();
        assert_eq!(request.table_name, "Todos");
        assert_eq!(request.index_name.as_deref(), Some("CreatedAtIndex"));
        assert_eq!(request.key_condition, "userId = :userId");
        assert!(request.expression_names.is_empty());
        assert_eq!(request.expression_values[":userId"], json!("u1"));
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].name, "Buy milk");
    }

    #[tokio::test]
    async fn create_puts_the_full_item_and_returns_it() {
        let client = RecordingClient::default();
        let store = TodoStore::new(&client, config());
        let todo = TodoItem {
            user_id: "u1".to_string(),
            todo_id: "t1".to_string(),
            name: "Buy milk".to_string(),
            due_date: Some("2024-01-01".to_string()),
            done: false,
            attachment_url: None,
            extra: Map::new(),
        };

        let returned = store.create_todo_item(todo.clone()).await.unwrap();

        let request = client.put_request.lock().unwrap().take().unwrap();
        assert_eq!(request.table_name, "Todos");
        assert_eq!(request.item["userId"], json!("u1"));
        assert_eq!(request.item["todoId"], json!("t1"));
        assert_eq!(request.item["dueDate"], json!("2024-01-01"));
        // attachmentUrl is absent, not null, when unset
        assert!(!request.item.contains_key("attachmentUrl"));
        assert_eq!(returned, todo);
    }

    #[tokio::test]
    async fn create_passes_extra_attributes_through() {
        let client = RecordingClient::default();
        let store = TodoStore::new(&client, config());
        let mut extra = Map::new();
        extra.insert("priority".to_string(), json!(3));
        let todo = TodoItem {
            user_id: "u1".to_string(),
            todo_id: "t1".to_string(),
            name: "Buy milk".to_string(),
            due_date: None,
            done: false,
            attachment_url: None,
            extra,
        };

        store.create_todo_item(todo).await.unwrap();

        let request = client.put_request.lock().unwrap().take().unwrap();
        assert_eq!(request.item["priority"], json!(3));
    }

    #[tokio::test]
    async fn update_aliases_all_three_attribute_names() {
        let mut updated = raw_item("u1", "t1", "Walk dog");
        updated.insert("dueDate".to_string(), json!("2024-02-02"));
        updated.insert("done".to_string(), json!(true));
        let client = RecordingClient {
            update_attributes: Some(updated),
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let todo = store
            .update_todo(
                "u1",
                "t1",
                TodoUpdate {
                    name: "Walk dog".to_string(),
                    due_date: Some("2024-02-02".to_string()),
                    done: true,
                },
            )
            .await
            .unwrap();

        let request = client.update_request.lock().unwrap().take().unwrap();
        assert_eq!(
            request.update_expression,
            "set #name = :name, #dueDate = :dueDate, #done = :done"
        );
        assert_eq!(
            request.expression_names,
            BTreeMap::from([
                ("#name".to_string(), "name".to_string()),
                ("#dueDate".to_string(), "dueDate".to_string()),
                ("#done".to_string(), "done".to_string()),
            ])
        );
        assert_eq!(request.expression_values[":name"], json!("Walk dog"));
        assert_eq!(request.expression_values[":dueDate"], json!("2024-02-02"));
        assert_eq!(request.expression_values[":done"], json!(true));
        assert_eq!(request.return_values, ReturnValues::AllNew);
        assert_eq!(
            request.key,
            Key {
                user_id: "u1".to_string(),
                todo_id: "t1".to_string(),
            }
        );
        assert!(todo.done);
        assert_eq!(todo.due_date.as_deref(), Some("2024-02-02"));
    }

    #[tokio::test]
    async fn update_sends_null_for_absent_due_date() {
        let client = RecordingClient {
            update_attributes: Some(raw_item("u1", "t1", "Walk dog")),
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        store
            .update_todo(
                "u1",
                "t1",
                TodoUpdate {
                    name: "Walk dog".to_string(),
                    due_date: None,
                    done: false,
                },
            )
            .await
            .unwrap();

        let request = client.update_request.lock().unwrap().take().unwrap();
        assert_eq!(request.expression_values[":dueDate"], Value::Null);
    }

    #[tokio::test]
    async fn delete_requests_the_old_image() {
        let client = RecordingClient {
            delete_attributes: Some(raw_item("u1", "t1", "Buy milk")),
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let removed = store.delete_todo("u1", "t1").await.unwrap();

        let request = client.delete_request.lock().unwrap().take().unwrap();
        assert_eq!(request.return_values, ReturnValues::AllOld);
        assert_eq!(removed.unwrap().name, "Buy milk");
    }

    #[tokio::test]
    async fn delete_of_missing_key_returns_none() {
        let client = RecordingClient::default();
        let store = TodoStore::new(&client, config());

        let removed = store.delete_todo("u1", "missing").await.unwrap();
        assert!(removed.is_none());
    }

    #[tokio::test]
    async fn attachment_update_touches_only_attachment_url() {
        let mut updated = raw_item("u1", "t1", "Buy milk");
        updated.insert("attachmentUrl".to_string(), json!("https://img/1"));
        let client = RecordingClient {
            update_attributes: Some(updated),
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let todo = store
            .update_todo_attachment_url("u1", "t1", "https://img/1")
            .await
            .unwrap();

        let request = client.update_request.lock().unwrap().take().unwrap();
        assert_eq!(
            request.update_expression,
            "set #attachmentUrl = :attachmentUrl"
        );
        assert_eq!(
            request.expression_names,
            BTreeMap::from([("#attachmentUrl".to_string(), "attachmentUrl".to_string())])
        );
        assert_eq!(
            request.expression_values[":attachmentUrl"],
            json!("https://img/1")
        );
        assert_eq!(request.return_values, ReturnValues::AllNew);
        assert_eq!(todo.attachment_url.as_deref(), Some("https://img/1"));
    }

    #[tokio::test]
    async fn search_queries_the_base_table_with_aliased_key() {
        let client = RecordingClient {
            query_items: vec![
                raw_item("u1", "t1", "abcdef"),
                raw_item("u1", "t2", "xabcx"),
                raw_item("u1", "t3", "abd"),
            ],
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let found = store.search_todos("u1", "abc").await.unwrap();

        let request = client.query_request.lock().unwrap().take().unwrap();
        assert_eq!(request.index_name, None);
        assert_eq!(request.key_condition, "#userId = :userId");
        assert_eq!(
            request.expression_names,
            BTreeMap::from([("#userId".to_string(), "userId".to_string())])
        );
        assert_eq!(request.expression_values[":userId"], json!("u1"));
        let names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["abcdef", "xabcx"]);
    }

    #[tokio::test]
    async fn search_is_case_sensitive() {
        let client = RecordingClient {
            query_items: vec![raw_item("u1", "t1", "Buy Milk")],
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        assert!(store.search_todos("u1", "milk").await.unwrap().is_empty());
        assert_eq!(store.search_todos("u1", "Milk").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_fails_on_item_without_name() {
        let mut nameless = raw_item("u1", "t1", "placeholder");
        nameless.remove("name");
        let client = RecordingClient {
            query_items: vec![nameless],
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let err = store.search_todos("u1", "x").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingAttribute {
                attribute: "name",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_item_surfaces_deserialization_error() {
        let mut bad = raw_item("u1", "t1", "Buy milk");
        bad.insert("done".to_string(), json!("yes"));
        let client = RecordingClient {
            query_items: vec![bad],
            ..Default::default()
        };
        let store = TodoStore::new(&client, config());

        let err = store.get_todos_for_user("u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Deserialization(_)));
    }
}
