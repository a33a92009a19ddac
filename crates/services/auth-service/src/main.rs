//! Auth Service - creates users against an embedded store and prints them.

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_service_lib::config::{AuthServiceConfig, ConfirmationMatch};
use common::ServiceConfig;

#[derive(Parser)]
#[command(name = "auth-service")]
#[command(about = "User creation with confirmation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create users and wait for each creation to be confirmed
    Create {
        /// Names of the users to create
        #[arg(required = true)]
        names: Vec<String>,
        /// Confirmation timeout in milliseconds
        #[arg(long, env = "AUTH_SERVICE_CONFIRMATION_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
        /// Event matching policy (first-event | identifier)
        #[arg(long = "match", env = "AUTH_SERVICE_CONFIRMATION_MATCH")]
        confirmation_match: Option<ConfirmationMatch>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let service_config = ServiceConfig::from_env("auth-service");

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| service_config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            names,
            timeout_ms,
            confirmation_match,
        } => {
            let mut config = AuthServiceConfig::from_env();
            if let Some(ms) = timeout_ms {
                config.confirmation_timeout = std::time::Duration::from_millis(ms);
            }
            if let Some(mode) = confirmation_match {
                config.confirmation_match = mode;
            }

            match auth_service_lib::run_embedded(&config, names).await {
                Ok(users) => {
                    for user in users {
                        println!("{}", serde_json::to_string(&user)?);
                    }
                }
                Err(e) => {
                    error!("{} failed: {} ({})", service_config.service_name, e, e.code());
                    return Err(e.user_message().into());
                }
            }
        }
    }

    Ok(())
}
