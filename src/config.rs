use regex::Regex;
use std::{collections::HashMap, path::Path, sync::LazyLock};
use thiserror::Error;

use crate::models::{NamingScheme, ProvisioningRequest, ResourceNames};

pub const KEY_REGION: &str = "AWS_REGION";
pub const KEY_ENVIRONMENT: &str = "ENVIRONMENT";
pub const KEY_POSTFIX: &str = "POSTFIX";
/// Label used in errors for the positional account id.
pub const KEY_ACCOUNT_ID: &str = "AWS_ACCOUNT_ID";

// S3 general purpose bucket names; anything S3 accepts is also a valid DynamoDB table name.
static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("valid bucket regex"));

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Missing mandatory config key: {0}")]
    MissingKey(String),
    #[error("Value for {0} must not be empty")]
    EmptyValue(String),
    #[error("'{name}' is not a valid S3 bucket name (lowercase letters, digits, '.' and '-', 3-63 characters)")]
    InvalidName { name: String },
    #[error(transparent)]
    DotEnvError(#[from] dotenvy::Error),
}

/// Settings for the AWS clients that are not part of the request itself.
#[derive(Clone, Debug, Default)]
pub struct AwsSettings {
    // Optional endpoint for LocalStack
    pub endpoint_url: Option<String>,
}

impl AwsSettings {
    pub fn new(endpoint_url: Option<String>) -> Self {
        // An empty AWS_ENDPOINT_URL means "no override".
        let endpoint_url = endpoint_url.filter(|url| !url.trim().is_empty());
        Self { endpoint_url }
    }
}

/// Loads a request from a key=value file.
///
/// `AWS_REGION`, `ENVIRONMENT` and `POSTFIX` are mandatory; anything else in the
/// file is ignored. Names are derived from the postfix alone.
///
/// Values go through dotenv substitution, so `$VAR` and `${VAR}` are expanded
/// from the process environment. A value that expands into something S3 would
/// reject is caught by [`validate_request`].
pub fn load_request_file(path: impl AsRef<Path>) -> Result<ProvisioningRequest, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(config_file = %path.display(), "Reading provisioning config");

    let entries = dotenvy::from_path_iter(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut values = HashMap::new();
    for entry in entries {
        let (key, value) = entry?;
        values.insert(key, value);
    }

    let region = required(&values, KEY_REGION)?;
    let environment = required(&values, KEY_ENVIRONMENT)?;
    let postfix = required(&values, KEY_POSTFIX)?;

    let request = ProvisioningRequest::new(region, environment, postfix, NamingScheme::Postfix);
    validate_request(&request)?;
    Ok(request)
}

/// Builds a request from the three positional arguments.
pub fn request_from_args(
    region: &str,
    environment: &str,
    account_id: &str,
) -> Result<ProvisioningRequest, ConfigError> {
    let request = ProvisioningRequest::new(
        region.trim(),
        environment.trim(),
        account_id.trim(),
        NamingScheme::AccountEnvironment,
    );
    validate_request(&request)?;
    Ok(request)
}

/// Every field of a request must be non-empty, and the derived resource names
/// usable, before any AWS call.
pub fn validate_request(request: &ProvisioningRequest) -> Result<(), ConfigError> {
    let id_key = match request.naming {
        NamingScheme::Postfix => KEY_POSTFIX,
        NamingScheme::AccountEnvironment => KEY_ACCOUNT_ID,
    };
    for (key, value) in [
        (KEY_REGION, &request.region),
        (KEY_ENVIRONMENT, &request.environment),
        (id_key, &request.account_id_or_postfix),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()));
        }
    }

    let names = ResourceNames::derive(request);
    if !BUCKET_NAME.is_match(&names.bucket) {
        return Err(ConfigError::InvalidName { name: names.bucket });
    }
    Ok(())
}

fn required(values: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    let value = values
        .get(key)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?
        .trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value.to_string())
}
