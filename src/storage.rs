use crate::{domain::BucketStore, errors::StorageError};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client as S3Client,
    error::SdkError,
    types::{
        BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
        VersioningConfiguration,
    },
};
use tracing;

/// us-east-1 rejects an explicit location constraint.
const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct S3BucketStore {
    client: S3Client,
}

impl S3BucketStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

fn location_constraint(region: &str) -> Option<CreateBucketConfiguration> {
    if region == DEFAULT_S3_REGION {
        return None;
    }
    Some(
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build(),
    )
}

#[async_trait]
impl BucketStore for S3BucketStore {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError> {
        tracing::debug!(bucket = %bucket, region = %region, "S3: Creating bucket");

        let mut create_bucket_req_builder = self.client.create_bucket().bucket(bucket);
        if let Some(config) = location_constraint(region) {
            create_bucket_req_builder = create_bucket_req_builder.create_bucket_configuration(config);
        }

        create_bucket_req_builder.send().await.map_err(|sdk_err| {
            let reason = match &sdk_err {
                SdkError::ServiceError(service_err) => service_err
                    .err()
                    .meta()
                    .code()
                    .unwrap_or("unknown service error")
                    .to_string(),
                other => other.to_string(),
            };
            tracing::debug!(bucket = %bucket, error = %sdk_err, "S3: CreateBucket failed");
            StorageError::CreateFailed(reason)
        })?;

        tracing::debug!(bucket = %bucket, "S3: Bucket created");
        Ok(())
    }

    async fn enable_versioning(&self, bucket: &str) -> Result<(), StorageError> {
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .context(format!("S3: Failed to enable versioning on bucket '{}'", bucket))?;

        tracing::debug!(bucket = %bucket, "S3: Versioning enabled");
        Ok(())
    }

    /// Pages through ListBuckets looking for an exact name match.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        let mut continuation_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_buckets()
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .context("S3: Failed to list buckets")?;

            if resp.buckets().iter().any(|b| b.name() == Some(bucket)) {
                return Ok(true);
            }

            match resp.continuation_token() {
                Some(token) if !token.is_empty() => continuation_token = Some(token.to_string()),
                _ => return Ok(false),
            }
        }
    }
}
