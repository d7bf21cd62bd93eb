//! fortuna-auth: authenticated request pipeline for the Fortuna API.
//!
//! Attaches bearer credentials to outbound requests, detects expired tokens,
//! refreshes them once no matter how many requests noticed, and retries each
//! failed request exactly once.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use fortuna_auth::prelude::*;
//!
//! # async fn example() -> fortuna_auth::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileCredentialStore::from_config(&config)?);
//! let client = FortunaClient::builder().config(config).store(store).build()?;
//!
//! let resp = client.get("/api/core/fortune/tomorrow/").send().await?;
//! println!("{}", resp.status());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
