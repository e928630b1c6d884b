use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use royalty_desk::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "royalty_desk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => cli::commands::init(config, force).await,
        Commands::Serve { host, port } => cli::commands::serve(config, host, port).await,
        Commands::Login { username, remember } => {
            cli::commands::login(config, username, remember).await
        }
        Commands::Status { format } => cli::commands::status(config, format).await,
        Commands::Logout { yes } => cli::commands::logout(config, yes).await,
        Commands::Shell => cli::commands::shell(config).await,
        Commands::Doctor => cli::commands::doctor(config).await,
    }
}
