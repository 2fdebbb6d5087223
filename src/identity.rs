use crate::{
    domain::{CallerIdentity, IdentityCheck},
    errors::IdentityError,
};
use anyhow::Context;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_sts::Client as StsClient;

/// Resolves credentials from the SDK chain and asks STS who they belong to.
#[derive(Debug, Clone)]
pub struct StsIdentityCheck {
    client: StsClient,
    credentials: Option<SharedCredentialsProvider>,
}

impl StsIdentityCheck {
    pub fn new(client: StsClient, sdk_config: &SdkConfig) -> Self {
        Self {
            client,
            credentials: sdk_config.credentials_provider(),
        }
    }
}

#[async_trait]
impl IdentityCheck for StsIdentityCheck {
    async fn caller_identity(&self) -> Result<CallerIdentity, IdentityError> {
        let provider = self
            .credentials
            .as_ref()
            .ok_or(IdentityError::NoCredentialsProvider)?;

        // Resolve locally first so a missing profile is reported as such, not as a network error.
        provider
            .provide_credentials()
            .await
            .map_err(|e| IdentityError::Unresolved(e.to_string()))?;

        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .context("STS: Failed to call sts:GetCallerIdentity")?;

        let identity = CallerIdentity {
            account: output.account().map(str::to_string),
            arn: output.arn().map(str::to_string),
        };
        tracing::debug!(account = ?identity.account, arn = ?identity.arn, "STS: Caller identity resolved");
        Ok(identity)
    }
}
