use std::sync::Arc;

use crate::{
    config::validate_request,
    domain::{BucketStore, IdentityCheck, LockTableStore},
    errors::{LockTableError, ProvisionError, StorageError},
    models::{
        BackendConfig, NamingScheme, ProvisioningRequest, ProvisioningResult, ResourceNames,
        ResourceStatus,
    },
};
use tracing;

/// Provisions the state bucket and lock table for a Terraform S3 backend.
///
/// The steps are gated: the table is only attempted once the bucket is in
/// place, and a backend descriptor is only produced once both are. Any
/// creation failure is followed by a single existence check so that re-runs
/// against already-provisioned resources succeed.
#[derive(Clone)]
pub struct ProvisioningWorkflow {
    identity: Arc<dyn IdentityCheck>,
    buckets: Arc<dyn BucketStore>,
    tables: Arc<dyn LockTableStore>,
}

impl ProvisioningWorkflow {
    pub fn new(
        identity: Arc<dyn IdentityCheck>,
        buckets: Arc<dyn BucketStore>,
        tables: Arc<dyn LockTableStore>,
    ) -> Self {
        Self {
            identity,
            buckets,
            tables,
        }
    }

    pub async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisioningResult, ProvisionError> {
        validate_request(request)?;
        let names = ResourceNames::derive(request);
        tracing::info!(bucket = %names.bucket, table = %names.table, region = %request.region, "Provisioning Terraform backend");

        self.check_credentials(request).await?;

        let mut result = ProvisioningResult::default();

        let bucket_status = self
            .ensure_bucket(&names.bucket, &request.region)
            .await
            .map_err(|source| ProvisionError::BucketProvision {
                bucket: names.bucket.clone(),
                source,
            })?;
        result.bucket = Some(bucket_status);

        let table_status = self
            .ensure_table(&names.table)
            .await
            .map_err(|source| ProvisionError::TableProvision {
                table: names.table.clone(),
                source,
            })?;
        result.table = Some(table_status);

        result.backend_config = Some(BackendConfig::new(&names, &request.region));
        tracing::info!(bucket = %bucket_status, table = %table_status, "Terraform backend is ready");
        Ok(result)
    }

    async fn check_credentials(&self, request: &ProvisioningRequest) -> Result<(), ProvisionError> {
        let identity = self
            .identity
            .caller_identity()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "AWS credentials check failed"))?;
        tracing::info!(account = ?identity.account, arn = ?identity.arn, "AWS credentials verified");

        if request.naming == NamingScheme::AccountEnvironment {
            if let Some(account) = identity.account.as_deref() {
                if account != request.account_id_or_postfix {
                    tracing::warn!(
                        requested = %request.account_id_or_postfix,
                        actual = %account,
                        "Requested account id does not match the credentials' account; names will still use the requested id"
                    );
                }
            }
        }
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str, region: &str) -> Result<ResourceStatus, StorageError> {
        match self.buckets.create_bucket(bucket, region).await {
            Ok(()) => {
                tracing::info!(bucket = %bucket, "S3 bucket created");
                if let Err(e) = self.buckets.enable_versioning(bucket).await {
                    tracing::warn!(bucket = %bucket, error = %e, "Could not enable versioning on S3 bucket");
                }
                Ok(ResourceStatus::Created)
            }
            Err(create_err) => {
                tracing::debug!(bucket = %bucket, error = %create_err, "Bucket creation failed, checking whether it already exists");
                match self.buckets.bucket_exists(bucket).await {
                    Ok(true) => {
                        tracing::info!(bucket = %bucket, "S3 bucket already exists, no new bucket created");
                        Ok(ResourceStatus::AlreadyExisted)
                    }
                    Ok(false) => {
                        tracing::error!(bucket = %bucket, error = %create_err, "S3 bucket could not be created");
                        Err(create_err)
                    }
                    Err(lookup_err) => {
                        tracing::error!(bucket = %bucket, error = %create_err, lookup_error = %lookup_err, "S3 bucket could not be created or found");
                        Err(create_err)
                    }
                }
            }
        }
    }

    async fn ensure_table(&self, table: &str) -> Result<ResourceStatus, LockTableError> {
        match self.tables.create_table(table).await {
            Ok(()) => {
                tracing::info!(table = %table, "DynamoDB table creation started, waiting for it to become active");
                self.tables.wait_until_active(table).await.inspect_err(|e| {
                    tracing::error!(table = %table, error = %e, "DynamoDB table did not become active")
                })?;
                Ok(ResourceStatus::Created)
            }
            Err(create_err) => {
                tracing::debug!(table = %table, error = %create_err, "Table creation failed, checking whether it already exists");
                match self.tables.table_exists(table).await {
                    Ok(true) => {
                        tracing::info!(table = %table, "DynamoDB table already exists, no new table created");
                        Ok(ResourceStatus::AlreadyExisted)
                    }
                    Ok(false) => {
                        tracing::error!(table = %table, error = %create_err, "DynamoDB table could not be created");
                        Err(create_err)
                    }
                    Err(lookup_err) => {
                        tracing::error!(table = %table, error = %create_err, lookup_error = %lookup_err, "DynamoDB table could not be created or found");
                        Err(create_err)
                    }
                }
            }
        }
    }
}
