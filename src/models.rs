use serde::Serialize;
use std::fmt;

pub const BUCKET_PREFIX: &str = "terraform-state-";
pub const TABLE_PREFIX: &str = "terraform-locks-";
/// State key written into every generated backend block.
pub const STATE_KEY: &str = "terraform/state";
/// Hash key of the lock table, as Terraform's S3 backend expects it.
pub const LOCK_KEY_ATTRIBUTE: &str = "LockID";

/// How the resource-name suffix is derived from a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingScheme {
    /// The configured postfix is used as-is.
    Postfix,
    /// `<account id>-<environment>`.
    AccountEnvironment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub region: String,
    pub environment: String,
    pub account_id_or_postfix: String,
    pub naming: NamingScheme,
}

impl ProvisioningRequest {
    pub fn new(
        region: impl Into<String>,
        environment: impl Into<String>,
        account_id_or_postfix: impl Into<String>,
        naming: NamingScheme,
    ) -> Self {
        Self {
            region: region.into(),
            environment: environment.into(),
            account_id_or_postfix: account_id_or_postfix.into(),
            naming,
        }
    }

    /// Name suffix shared by the bucket and the table.
    pub fn suffix(&self) -> String {
        match self.naming {
            NamingScheme::Postfix => self.account_id_or_postfix.clone(),
            NamingScheme::AccountEnvironment => {
                format!("{}-{}", self.account_id_or_postfix, self.environment)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceNames {
    pub bucket: String,
    pub table: String,
}

impl ResourceNames {
    pub fn derive(request: &ProvisioningRequest) -> Self {
        let suffix = request.suffix();
        Self {
            bucket: format!("{BUCKET_PREFIX}{suffix}"),
            table: format!("{TABLE_PREFIX}{suffix}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceStatus {
    Created,
    AlreadyExisted,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceStatus::Created => f.write_str("created"),
            ResourceStatus::AlreadyExisted => f.write_str("already existed"),
        }
    }
}

/// Settings to paste into the `backend "s3"` block of a Terraform configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendConfig {
    pub bucket: String,
    pub key: String,
    pub region: String,
    pub dynamodb_table: String,
}

impl BackendConfig {
    pub fn new(names: &ResourceNames, region: &str) -> Self {
        Self {
            bucket: names.bucket.clone(),
            key: STATE_KEY.to_string(),
            region: region.to_string(),
            dynamodb_table: names.table.clone(),
        }
    }
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "terraform {{")?;
        writeln!(f, "  backend \"s3\" {{")?;
        writeln!(f, "    bucket         = \"{}\"", self.bucket)?;
        writeln!(f, "    key            = \"{}\"", self.key)?;
        writeln!(f, "    region         = \"{}\"", self.region)?;
        writeln!(f, "    dynamodb_table = \"{}\"", self.dynamodb_table)?;
        writeln!(f, "  }}")?;
        write!(f, "}}")
    }
}

/// Outcome of one provisioning run. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub bucket: Option<ResourceStatus>,
    pub table: Option<ResourceStatus>,
    pub backend_config: Option<BackendConfig>,
}

impl ProvisioningResult {
    pub fn bucket_created_or_exists(&self) -> bool {
        self.bucket.is_some()
    }

    pub fn table_created_or_exists(&self) -> bool {
        self.table.is_some()
    }

    /// True only when both resources are in place and a descriptor was produced.
    pub fn is_ready(&self) -> bool {
        self.bucket_created_or_exists()
            && self.table_created_or_exists()
            && self.backend_config.is_some()
    }
}
