//! `popwatch` - POP3 mailbox poller
//!
//! Polls one mailbox on a fixed interval and prints every new message to
//! stdout as a JSON line. Logs go to stderr.
//!
//! Usage: `popwatch [CONFIG_PATH]`

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use popwatch_core::{JsonLinesSink, Poller, SqliteStateRepository, spawn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "popwatch=info,popwatch_core=info,popwatch_pop3=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(settings::default_config_path, PathBuf::from);
    let password = std::env::var(settings::PASSWORD_ENV).ok();
    let config = settings::load_config(&config_path, password).await?;

    let db_path = settings::state_db_path().await?;
    let store = SqliteStateRepository::new(&db_path.to_string_lossy())
        .await
        .with_context(|| format!("opening state database {}", db_path.display()))?;

    let sink = JsonLinesSink::new(tokio::io::stdout());
    let poller = Poller::new(config, store, sink)?;

    info!(
        mailbox = %poller.mailbox(),
        config = %config_path.display(),
        "Starting popwatch"
    );

    let handle = spawn(Arc::new(poller));
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    info!("Shutting down");
    handle.stop().await;
    Ok(())
}
