//! CLI entry point for fortuna-auth.

pub mod auth;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fortuna API credential tool
#[derive(Parser, Debug)]
#[command(name = "fortuna-auth", version, about = "Fortuna API credential tool")]
pub struct Cli {
    /// TOML config file (environment variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show stored credential status
    Status,
    /// Exchange a Google ID token for API credentials
    Login(LoginArgs),
    /// Revoke and forget stored credentials
    Logout,
    /// Force one token refresh
    Refresh,
    /// Send an authenticated GET request and print the response
    Get(GetArgs),
}

/// Arguments for `fortuna-auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Google ID token obtained from the sign-in flow
    #[arg(long)]
    pub id_token: String,
}

/// Arguments for `fortuna-auth get`.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// API path, e.g. /api/user/profile/
    pub path: String,
}
