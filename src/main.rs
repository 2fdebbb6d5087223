use std::{error::Error, process::ExitCode, sync::Arc};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tf_backend_bootstrap::{
    ProvisionError, ProvisioningResult, ProvisioningWorkflow, aws_clients,
    cli::{self, Cli},
    config::AwsSettings,
    identity::StsIdentityCheck,
    lock_table::DynamoDbLockTableStore,
    storage::S3BucketStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout only carries the backend block.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tf_backend_bootstrap=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match run(&cli).await {
        Ok(result) => result,
        Err(err) => {
            report(&err);
            return ExitCode::from(err.exit_code());
        }
    };

    let Some(backend) = result.backend_config else {
        eprintln!("Error: provisioning finished without a backend configuration");
        return ExitCode::FAILURE;
    };

    match cli::render(&backend, cli.output) {
        Ok(rendered) => {
            if cli.output == cli::OutputFormat::Hcl {
                eprintln!("Add the following block to your Terraform configuration:");
            }
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: could not render backend configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ProvisioningResult, ProvisionError> {
    // Input problems are reported before any client is built.
    let request = cli.command.request()?;
    let settings = AwsSettings::new(cli.endpoint_url.clone());

    let sdk_config = aws_clients::create_sdk_config(&request.region, &settings).await;

    tracing::debug!("Initializing AWS STS, S3 and DynamoDB clients...");
    let identity = StsIdentityCheck::new(aws_clients::create_sts_client(&sdk_config), &sdk_config);
    let buckets = S3BucketStore::new(aws_clients::create_s3_client(&sdk_config, &settings));
    let tables = DynamoDbLockTableStore::new(aws_clients::create_dynamodb_client(&sdk_config));

    let workflow = ProvisioningWorkflow::new(Arc::new(identity), Arc::new(buckets), Arc::new(tables));
    workflow.provision(&request).await
}

fn report(err: &ProvisionError) {
    eprintln!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    if matches!(err, ProvisionError::Credentials(_)) {
        eprintln!("Check that AWS credentials are configured (e.g. `aws configure` or AWS_PROFILE).");
    }
}
