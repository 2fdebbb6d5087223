use crate::config::AwsSettings;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sts::Client as StsClient;
use tracing;

// Creates the base AWS SDK configuration for the requested region.
// Uses the default credential provider chain (env vars, profiles, SSO, IMDS...).
pub async fn create_sdk_config(region: &str, settings: &AwsSettings) -> SdkConfig {
    tracing::info!(sdk_region = %region, "Setting SDK region");

    let mut config_loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    if let Some(endpoint_url) = &settings.endpoint_url {
        tracing::info!("Using endpoint override: {}", endpoint_url);
        config_loader = config_loader.endpoint_url(endpoint_url);
    } else {
        tracing::debug!("Using default AWS endpoints and credential resolution.");
    }

    config_loader.load().await
}

pub fn create_sts_client(sdk_config: &SdkConfig) -> StsClient {
    StsClient::new(sdk_config)
}

pub fn create_dynamodb_client(sdk_config: &SdkConfig) -> DynamoDbClient {
    DynamoDbClient::new(sdk_config)
}

// Endpoint overrides (LocalStack and friends) rarely serve virtual-hosted bucket URLs.
pub fn create_s3_client(sdk_config: &SdkConfig, settings: &AwsSettings) -> S3Client {
    let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
        .force_path_style(settings.endpoint_url.is_some())
        .build();
    S3Client::from_conf(s3_config)
}
