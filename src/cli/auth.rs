//! CLI command handlers.

use std::path::Path;
use std::sync::Arc;

use crate::auth::{FileCredentialStore, SessionService};
use crate::client::FortunaClient;
use crate::config::ClientConfig;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Build the client from an optional config file plus environment.
pub fn build_client(config_path: Option<&Path>) -> Result<FortunaClient, Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::from_env()?,
    };
    let store = Arc::new(FileCredentialStore::from_config(&config)?);
    Ok(FortunaClient::builder().config(config).store(store).build()?)
}

/// Handle `fortuna-auth status`.
pub fn handle_status(client: &FortunaClient) -> CliResult {
    let status = SessionService::new(client.clone()).status();
    println!("🔐 Authentication Status\n");
    println!("  API: {}", client.config().base_url);
    println!(
        "  Access token: {}",
        if status.logged_in { "✅ Stored" } else { "❌ Not stored" }
    );
    println!(
        "  Refresh token: {}",
        if status.has_refresh_token { "✅ Stored" } else { "❌ Not stored" }
    );
    Ok(())
}

/// Handle `fortuna-auth login --id-token <token>`.
pub async fn handle_login(client: &FortunaClient, id_token: &str) -> CliResult {
    let login = SessionService::new(client.clone())
        .login_with_google(id_token)
        .await?;
    let kind = if login.is_new_user { "Signed up" } else { "Logged in" };
    println!("✅ {kind} as {} (user {})", login.email, login.user_id);
    if login.needs_additional_info {
        println!("📋 Profile incomplete: birth data is still required");
    }
    Ok(())
}

/// Handle `fortuna-auth logout`.
pub async fn handle_logout(client: &FortunaClient) -> CliResult {
    SessionService::new(client.clone()).logout().await?;
    println!("✅ Logged out");
    Ok(())
}

/// Handle `fortuna-auth refresh`.
pub async fn handle_refresh(client: &FortunaClient) -> CliResult {
    match SessionService::new(client.clone()).refresh_now().await {
        Ok(_) => {
            println!("✅ Access token refreshed");
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ Refresh failed; stored credentials were cleared");
            Err(err.into())
        }
    }
}

/// Handle `fortuna-auth get <path>`.
pub async fn handle_get(client: &FortunaClient, path: &str) -> CliResult {
    let resp = client.get(path).send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    println!("{status}");
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
