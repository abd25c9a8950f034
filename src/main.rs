//! booth-auth CLI binary entry point.

use booth_auth::cli::{AuthCommands, Cli, Commands};
use booth_auth::config::BoothConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("booth_auth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> booth_auth::error::Result<()> {
    let config = BoothConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => booth_auth::cli::auth::handle_login(&config, &args).await,
            AuthCommands::Refresh(args) => {
                booth_auth::cli::auth::handle_refresh(&config, &args).await
            }
            AuthCommands::Status(args) => {
                booth_auth::cli::auth::handle_status(&config, &args).await
            }
            AuthCommands::Logout(args) => {
                booth_auth::cli::auth::handle_logout(&config, &args).await
            }
        },
    }
}
