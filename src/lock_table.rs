use std::time::Duration;

use crate::{domain::LockTableStore, errors::LockTableError, models::LOCK_KEY_ATTRIBUTE};
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client as DynamoDbClient,
    error::SdkError,
    types::{AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus},
};
use backoff::ExponentialBackoffBuilder;
use tracing;

/// Polling bound for a freshly created table, matching the AWS CLI
/// `table-exists` waiter: every 20 seconds, 25 attempts.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            max_wait: Duration::from_secs(20 * 25),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DynamoDbLockTableStore {
    client: DynamoDbClient,
    wait: WaitPolicy,
}

impl DynamoDbLockTableStore {
    pub fn new(client: DynamoDbClient) -> Self {
        Self {
            client,
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Current status of the table, `None` when DynamoDB says it does not exist.
    async fn table_status(&self, table: &str) -> Result<Option<TableStatus>, LockTableError> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(resp) => Ok(resp.table().and_then(|t| t.table_status()).cloned()),
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_resource_not_found_exception() =>
            {
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("DynamoDB: Failed to describe table '{}'", table))
                .into()),
        }
    }
}

#[async_trait]
impl LockTableStore for DynamoDbLockTableStore {
    async fn create_table(&self, table: &str) -> Result<(), LockTableError> {
        tracing::debug!(table = %table, "DynamoDB: Creating lock table");

        self.client
            .create_table()
            .table_name(table)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(LOCK_KEY_ATTRIBUTE)
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name(LOCK_KEY_ATTRIBUTE)
                    .key_type(KeyType::Hash)
                    .build()?,
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|sdk_err| {
                let reason = match &sdk_err {
                    SdkError::ServiceError(service_err) => service_err
                        .err()
                        .meta()
                        .code()
                        .unwrap_or("unknown service error")
                        .to_string(),
                    other => other.to_string(),
                };
                tracing::debug!(table = %table, error = %sdk_err, "DynamoDB: CreateTable failed");
                LockTableError::CreateFailed(reason)
            })?;

        tracing::debug!(table = %table, "DynamoDB: CreateTable accepted");
        Ok(())
    }

    async fn wait_until_active(&self, table: &str) -> Result<(), LockTableError> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.wait.interval)
            .with_max_interval(self.wait.interval)
            .with_multiplier(1.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(Some(self.wait.max_wait))
            .build();

        backoff::future::retry(policy, || async move {
            match self.table_status(table).await {
                Ok(Some(TableStatus::Active)) => Ok(()),
                Ok(Some(TableStatus::Creating)) => {
                    tracing::debug!(table = %table, "DynamoDB: Waiting for table to become ACTIVE");
                    Err(backoff::Error::transient(LockTableError::NotActive {
                        table: table.to_string(),
                        status: TableStatus::Creating.as_str().to_string(),
                    }))
                }
                // DescribeTable can lag behind a successful CreateTable.
                Ok(None) => Err(backoff::Error::transient(LockTableError::NotFound(
                    table.to_string(),
                ))),
                Ok(Some(other)) => Err(backoff::Error::permanent(LockTableError::NotActive {
                    table: table.to_string(),
                    status: other.as_str().to_string(),
                })),
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await?;

        tracing::info!(table = %table, "DynamoDB: Table is ACTIVE");
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, LockTableError> {
        let status = self.table_status(table).await?;
        if let Some(status) = &status {
            tracing::debug!(table = %table, status = %status.as_str(), "DynamoDB: Table found");
        }
        Ok(status.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region, retry::RetryConfig};
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_runtime_api::http::{Request, Response, StatusCode};
    use aws_smithy_types::body::SdkBody;

    const TABLE: &str = "terraform-locks-acme";
    const NOT_FOUND: &str = r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#;

    fn json_response(status: u16, body: &'static str) -> ReplayEvent {
        let mut response = Response::new(StatusCode::try_from(status).unwrap(), SdkBody::from(body));
        response
            .headers_mut()
            .insert("content-type", "application/x-amz-json-1.0");
        ReplayEvent::new(Request::empty(), response)
    }

    fn described(status: &str) -> ReplayEvent {
        let body = format!(r#"{{"Table":{{"TableName":"{TABLE}","TableStatus":"{status}"}}}}"#);
        let mut response = Response::new(StatusCode::try_from(200).unwrap(), SdkBody::from(body));
        response
            .headers_mut()
            .insert("content-type", "application/x-amz-json-1.0");
        ReplayEvent::new(Request::empty(), response)
    }

    fn not_found() -> ReplayEvent {
        json_response(400, NOT_FOUND)
    }

    fn quick_wait() -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(50),
        }
    }

    fn replay_store(events: Vec<ReplayEvent>) -> (DynamoDbLockTableStore, StaticReplayClient) {
        let http_client = StaticReplayClient::new(events);
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .http_client(http_client.clone())
            .retry_config(RetryConfig::disabled())
            .build();
        let store = DynamoDbLockTableStore::new(DynamoDbClient::from_conf(config))
            .with_wait_policy(quick_wait());
        (store, http_client)
    }

    #[test]
    fn default_wait_matches_cli_waiter() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(20));
        assert_eq!(policy.max_wait, Duration::from_secs(500));
    }

    #[tokio::test]
    async fn create_requests_lock_id_key_on_demand() {
        let (store, http_client) = replay_store(vec![json_response(
            200,
            r#"{"TableDescription":{"TableName":"terraform-locks-acme","TableStatus":"CREATING"}}"#,
        )]);

        store.create_table(TABLE).await.unwrap();

        let request = http_client.actual_requests().next().unwrap();
        let body = std::str::from_utf8(request.body().bytes().unwrap()).unwrap();
        assert!(body.contains(r#""AttributeName":"LockID""#));
        assert!(body.contains(r#""KeyType":"HASH""#));
        assert!(body.contains(r#""BillingMode":"PAY_PER_REQUEST""#));
    }

    #[tokio::test]
    async fn create_conflict_reports_service_code() {
        let (store, _) = replay_store(vec![json_response(
            400,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceInUseException","message":"Table already exists: terraform-locks-acme"}"#,
        )]);

        let err = store.create_table(TABLE).await.unwrap_err();
        assert!(matches!(err, LockTableError::CreateFailed(ref code) if code == "ResourceInUseException"));
    }

    #[tokio::test]
    async fn creating_table_becomes_active() {
        let (store, http_client) = replay_store(vec![described("CREATING"), described("ACTIVE")]);

        store.wait_until_active(TABLE).await.unwrap();
        assert_eq!(http_client.actual_requests().count(), 2);
    }

    #[tokio::test]
    async fn table_not_yet_visible_is_waited_for() {
        let (store, http_client) = replay_store(vec![not_found(), described("ACTIVE")]);

        store.wait_until_active(TABLE).await.unwrap();
        assert_eq!(http_client.actual_requests().count(), 2);
    }

    #[tokio::test]
    async fn deleting_table_fails_without_waiting() {
        let (store, http_client) = replay_store(vec![described("DELETING"), described("ACTIVE")]);

        let err = store.wait_until_active(TABLE).await.unwrap_err();
        assert!(matches!(err, LockTableError::NotActive { ref status, .. } if status == "DELETING"));
        assert_eq!(http_client.actual_requests().count(), 1);
    }

    #[tokio::test]
    async fn table_stuck_creating_times_out() {
        let events = (0..50).map(|_| described("CREATING")).collect();
        let (store, http_client) = replay_store(events);

        let err = store.wait_until_active(TABLE).await.unwrap_err();
        assert!(matches!(err, LockTableError::NotActive { ref status, .. } if status == "CREATING"));
        assert!(http_client.actual_requests().count() < 50);
    }

    #[tokio::test]
    async fn missing_table_does_not_exist() {
        let (store, _) = replay_store(vec![not_found()]);
        assert!(!store.table_exists(TABLE).await.unwrap());
    }

    #[tokio::test]
    async fn described_table_exists() {
        let (store, _) = replay_store(vec![described("ACTIVE")]);
        assert!(store.table_exists(TABLE).await.unwrap());
    }

    #[tokio::test]
    async fn failed_describe_is_a_backend_error() {
        let (store, _) = replay_store(vec![json_response(
            400,
            r#"{"__type":"com.amazon.coral.service#AccessDeniedException","message":"not authorized to perform dynamodb:DescribeTable"}"#,
        )]);

        let err = store.table_exists(TABLE).await.unwrap_err();
        assert!(matches!(err, LockTableError::BackendError(_)));
    }
}
