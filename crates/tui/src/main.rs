mod app;
mod block_font;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use memo_core::{
    config::{self, AppConfig},
    FileGateway, Gateway, JsonFileStore, LocalStore,
};
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(
        config = %config_path.display(),
        data_dir = %config.data_dir.display(),
        "Starting memo"
    );

    let gateway: Arc<dyn Gateway> = Arc::new(FileGateway::new(config.data_dir.clone()));
    let store: Arc<dyn LocalStore> = Arc::new(JsonFileStore::new(config.data_dir.clone()));

    let mut app = app::MemoApp::new(&config, gateway, store, Handle::current());
    app.run().await
}

/// Log to `logs/memo.log`; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("memo.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
