//! Provisions the S3 state bucket and DynamoDB lock table behind a Terraform
//! S3 remote-state backend, then describes the backend block that uses them.

pub mod aws_clients;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod lock_table;
pub mod models;
pub mod provisioning;
pub mod storage;

pub use errors::ProvisionError;
pub use models::{BackendConfig, ProvisioningRequest, ProvisioningResult, ResourceNames};
pub use provisioning::ProvisioningWorkflow;
