//! fortuna-auth CLI binary entry point.

use clap::Parser;
use fortuna_auth::cli::{auth, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match auth::build_client(cli.config.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Status => auth::handle_status(&client),
        Commands::Login(args) => auth::handle_login(&client, &args.id_token).await,
        Commands::Logout => auth::handle_logout(&client).await,
        Commands::Refresh => auth::handle_refresh(&client).await,
        Commands::Get(args) => auth::handle_get(&client, &args.path).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
