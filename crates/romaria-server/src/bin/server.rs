//! romaria webhook server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! SQLite store and serves the provider webhooks over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use romaria_gateway::{
  HttpMessenger, MessagingConfig, PaymentConfig, PixClient,
};
use romaria_server::{AppState, FsBlobStore, ServerConfig};
use romaria_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Romaria registration bot server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROMARIA").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let messenger = HttpMessenger::new(MessagingConfig {
    base_url:     server_cfg.messaging.base_url.clone(),
    token:        server_cfg.messaging.token.clone(),
    timeout_secs: server_cfg.messaging.timeout_secs,
  })
  .context("failed to build messaging client")?;

  let gateway = PixClient::new(PaymentConfig {
    base_url:         server_cfg.payments.base_url.clone(),
    token:            server_cfg.payments.token.clone(),
    timeout_secs:     server_cfg.payments.timeout_secs,
    notification_url: server_cfg.payments.notification_url.clone(),
    provider_name:    server_cfg.payments.provider_name.clone(),
  })
  .context("failed to build payment client")?;

  let blobs = FsBlobStore::new(expand_tilde(&server_cfg.blob_dir));

  let state = AppState::new(
    Arc::new(store),
    Arc::new(messenger),
    Arc::new(gateway),
    Arc::new(blobs),
    server_cfg.clone(),
  );

  let app = romaria_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
