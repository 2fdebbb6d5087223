//! End-to-end runs against LocalStack. Start it with `localstack start` and run
//! `cargo test -- --ignored`.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use tf_backend_bootstrap::{
    ProvisioningWorkflow, ResourceNames,
    aws_clients,
    config::AwsSettings,
    identity::StsIdentityCheck,
    lock_table::{DynamoDbLockTableStore, WaitPolicy},
    models::{NamingScheme, ProvisioningRequest, ResourceStatus},
    storage::S3BucketStore,
};
use uuid::Uuid;

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const TEST_REGION: &str = "eu-west-1";

async fn localstack_workflow() -> ProvisioningWorkflow {
    let settings = AwsSettings::new(Some(LOCALSTACK_ENDPOINT.to_string()));
    let credentials = Credentials::new("test", "test", None, None, "localstack");
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(LOCALSTACK_ENDPOINT)
        .region(Region::new(TEST_REGION))
        .credentials_provider(credentials)
        .load()
        .await;

    let tables = DynamoDbLockTableStore::new(aws_clients::create_dynamodb_client(&sdk_config))
        .with_wait_policy(WaitPolicy {
            interval: std::time::Duration::from_millis(200),
            max_wait: std::time::Duration::from_secs(10),
        });

    ProvisioningWorkflow::new(
        Arc::new(StsIdentityCheck::new(
            aws_clients::create_sts_client(&sdk_config),
            &sdk_config,
        )),
        Arc::new(S3BucketStore::new(aws_clients::create_s3_client(
            &sdk_config,
            &settings,
        ))),
        Arc::new(tables),
    )
}

#[tokio::test]
#[ignore = "requires localstack"]
async fn provisioning_twice_is_idempotent() {
    let workflow = localstack_workflow().await;
    let postfix = format!("it-{}", Uuid::new_v4().simple());
    let request = ProvisioningRequest::new(TEST_REGION, "test", postfix, NamingScheme::Postfix);
    let names = ResourceNames::derive(&request);

    let first = workflow.provision(&request).await.unwrap();
    assert_eq!(first.bucket, Some(ResourceStatus::Created));
    assert_eq!(first.table, Some(ResourceStatus::Created));

    let second = workflow.provision(&request).await.unwrap();
    assert_eq!(second.bucket, Some(ResourceStatus::AlreadyExisted));
    assert_eq!(second.table, Some(ResourceStatus::AlreadyExisted));

    let backend = second.backend_config.unwrap();
    assert_eq!(backend.bucket, names.bucket);
    assert_eq!(backend.dynamodb_table, names.table);
}
