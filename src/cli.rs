use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    config::{self, ConfigError},
    models::{BackendConfig, ProvisioningRequest},
};

pub const DEFAULT_CONFIG_FILE: &str = "backend.conf";

#[derive(Parser, Debug)]
#[command(name = "tf-backend-bootstrap")]
#[command(about = "Create the S3 bucket and DynamoDB lock table for a Terraform remote-state backend")]
#[command(version)]
pub struct Cli {
    /// Endpoint override for S3, DynamoDB and STS (e.g. LocalStack)
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// How to print the backend configuration
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Hcl)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read AWS_REGION, ENVIRONMENT and POSTFIX from a key=value file
    FromFile {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Name resources after an account id and environment
    FromArgs {
        aws_region: String,
        environment: String,
        aws_account_id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Hcl,
    Json,
}

impl Commands {
    pub fn request(&self) -> Result<ProvisioningRequest, ConfigError> {
        match self {
            Commands::FromFile { config } => config::load_request_file(config),
            Commands::FromArgs {
                aws_region,
                environment,
                aws_account_id,
            } => config::request_from_args(aws_region, environment, aws_account_id),
        }
    }
}

pub fn render(backend: &BackendConfig, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Hcl => Ok(backend.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(backend),
    }
}
