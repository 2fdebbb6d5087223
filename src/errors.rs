use aws_smithy_types::error::operation::BuildError;
use thiserror::Error;

use crate::config::ConfigError;

// --- Collaborator Errors ---

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("No AWS credentials provider is configured")]
    NoCredentialsProvider,

    #[error("AWS credentials could not be resolved: {0}")]
    Unresolved(String),

    #[error("Identity backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Bucket creation failed: {0}")]
    CreateFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum LockTableError {
    #[error("Failed to build DynamoDB request: {0}")]
    Build(#[from] BuildError),

    #[error("Table creation failed: {0}")]
    CreateFailed(String),

    #[error("Table '{table}' is not active yet (status: {status})")]
    NotActive { table: String, status: String },

    #[error("Table '{0}' was not found")]
    NotFound(String),

    #[error("Lock table backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

// --- Workflow Error ---

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("AWS credentials are not usable")]
    Credentials(#[source] IdentityError),

    #[error("Could not provision S3 bucket '{bucket}'")]
    BucketProvision {
        bucket: String,
        #[source]
        source: StorageError,
    },

    #[error("Could not provision DynamoDB table '{table}'")]
    TableProvision {
        table: String,
        #[source]
        source: LockTableError,
    },
}

impl ProvisionError {
    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProvisionError::Config(_) => 2,
            ProvisionError::Credentials(_) => 3,
            ProvisionError::BucketProvision { .. } => 4,
            ProvisionError::TableProvision { .. } => 5,
        }
    }
}

impl From<IdentityError> for ProvisionError {
    fn from(err: IdentityError) -> Self {
        ProvisionError::Credentials(err)
    }
}
