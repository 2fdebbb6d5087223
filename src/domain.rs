use crate::errors::{IdentityError, LockTableError, StorageError};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Who the resolved credentials belong to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
}

/// Confirms that the ambient credentials can talk to AWS at all.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityCheck: Send + Sync + 'static {
    async fn caller_identity(&self) -> Result<CallerIdentity, IdentityError>;
}

/// Bucket operations needed for the state bucket.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BucketStore: Send + Sync + 'static {
    /// Creates the bucket in `region`.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError>;

    /// Turns on object versioning for the bucket.
    async fn enable_versioning(&self, bucket: &str) -> Result<(), StorageError>;

    /// Returns whether a bucket with this name is visible to the caller.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;
}

/// Table operations needed for the lock table.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LockTableStore: Send + Sync + 'static {
    /// Creates the table keyed on `LockID` with on-demand billing.
    async fn create_table(&self, table: &str) -> Result<(), LockTableError>;

    /// Blocks until the table reports ACTIVE, or fails once the wait bound is hit.
    async fn wait_until_active(&self, table: &str) -> Result<(), LockTableError>;

    async fn table_exists(&self, table: &str) -> Result<bool, LockTableError>;
}
