//! DynamoDB driver for the todo store.
//!
//! # Design
//! Executes the plain-data requests built by `todo_store` against
//! `aws-sdk-dynamodb`. The client inherits the shared SDK config (HTTP
//! client, credentials, retry policy) and applies region/endpoint/timeout
//! overrides on top. SDK failures of every kind — network, throttling,
//! permission — surface as `StoreError::Request`; no retry or error-code
//! translation happens here.

mod convert;

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use aws_smithy_types::timeout::TimeoutConfig;
use todo_store::{
    DeleteRequest, DeleteResponse, Key, PutRequest, QueryRequest, QueryResponse, ReturnValues,
    StoreClient, StoreError, UpdateRequest, UpdateResponse,
};

use convert::{attributes_to_item, item_to_attributes, to_attribute_value};

/// Connection overrides applied on top of the shared SDK configuration.
#[derive(Debug, Clone, Default)]
pub struct DynamoConfig {
    /// AWS region override (SDK default when unset).
    pub region: Option<String>,
    /// Endpoint override, e.g. a local DynamoDB instance.
    pub endpoint: Option<String>,
    /// Per-operation timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// `StoreClient` implementation over an `aws-sdk-dynamodb` client.
#[derive(Clone)]
pub struct DynamoStoreClient {
    client: Client,
}

impl std::fmt::Debug for DynamoStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoStoreClient").finish()
    }
}

impl DynamoStoreClient {
    /// Build a client from the shared SDK config plus local overrides.
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoConfig) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }
        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(timeout_ms) = config.timeout_ms {
            let timeout = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout);
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Wrap a pre-built client (shared clients, tests).
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn key_attributes(key: &Key) -> [(&'static str, AttributeValue); 2] {
    [
        ("userId", AttributeValue::S(key.user_id.clone())),
        ("todoId", AttributeValue::S(key.todo_id.clone())),
    ]
}

fn to_return_value(values: ReturnValues) -> ReturnValue {
    match values {
        ReturnValues::None => ReturnValue::None,
        ReturnValues::AllOld => ReturnValue::AllOld,
        ReturnValues::AllNew => ReturnValue::AllNew,
    }
}

#[async_trait]
impl StoreClient for DynamoStoreClient {
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError> {
        let mut builder = self
            .client
            .query()
            .table_name(request.table_name)
            .set_index_name(request.index_name)
            .key_condition_expression(request.key_condition);
        if !request.expression_names.is_empty() {
            builder = builder
                .set_expression_attribute_names(Some(request.expression_names.into_iter().collect()));
        }
        builder = builder.set_expression_attribute_values(Some(
            request
                .expression_values
                .iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ));

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("DynamoDB Query failed: {e}")))?;

        Ok(QueryResponse {
            items: response.items().iter().map(attributes_to_item).collect(),
        })
    }

    async fn put(&self, request: PutRequest) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(request.table_name)
            .set_item(Some(item_to_attributes(&request.item)))
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("DynamoDB PutItem failed: {e}")))?;
        Ok(())
    }

    async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse, StoreError> {
        let mut builder = self
            .client
            .update_item()
            .table_name(request.table_name)
            .update_expression(request.update_expression)
            .return_values(to_return_value(request.return_values));
        for (name, value) in key_attributes(&request.key) {
            builder = builder.key(name, value);
        }
        if !request.expression_names.is_empty() {
            builder = builder
                .set_expression_attribute_names(Some(request.expression_names.into_iter().collect()));
        }
        builder = builder.set_expression_attribute_values(Some(
            request
                .expression_values
                .iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ));

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("DynamoDB UpdateItem failed: {e}")))?;

        Ok(UpdateResponse {
            attributes: response.attributes().map(attributes_to_item),
        })
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse, StoreError> {
        let mut builder = self
            .client
            .delete_item()
            .table_name(request.table_name)
            .return_values(to_return_value(request.return_values));
        for (name, value) in key_attributes(&request.key) {
            builder = builder.key(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("DynamoDB DeleteItem failed: {e}")))?;

        Ok(DeleteResponse {
            attributes: response.attributes().map(attributes_to_item),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_attributes_use_the_table_key_names() {
        let key = Key {
            user_id: "u1".to_string(),
            todo_id: "t1".to_string(),
        };
        let attributes = key_attributes(&key);
        assert_eq!(attributes[0].0, "userId");
        assert_eq!(attributes[0].1, AttributeValue::S("u1".to_string()));
        assert_eq!(attributes[1].0, "todoId");
        assert_eq!(attributes[1].1, AttributeValue::S("t1".to_string()));
    }

    #[test]
    fn return_value_mapping_is_exhaustive() {
        assert_eq!(to_return_value(ReturnValues::None), ReturnValue::None);
        assert_eq!(to_return_value(ReturnValues::AllOld), ReturnValue::AllOld);
        assert_eq!(to_return_value(ReturnValues::AllNew), ReturnValue::AllNew);
    }
}
