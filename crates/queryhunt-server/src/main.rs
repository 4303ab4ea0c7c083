//! queryhunt-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid by
//! `QUERYHUNT_*` environment variables, opens the sandbox store and serves
//! the game API over HTTP until interrupted.
//!
//! Nested keys use a double underscore, e.g. `QUERYHUNT_STORY__URL`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use queryhunt_server::{ServerConfig, build_state, router, sweeper};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "QueryHunt game server")]
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
    .add_source(
      config::Environment::with_prefix("QUERYHUNT")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let state = build_state(&server_cfg)
    .await
    .context("failed to assemble game")?;

  let cancel = CancellationToken::new();
  let sweeper = tokio::spawn(sweeper::run(
    Arc::clone(&state.game),
    server_cfg.session_ttl(),
    server_cfg.sweep_interval(),
    cancel.clone(),
  ));

  let app = router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  cancel.cancel();
  let _ = sweeper.await;
  tracing::info!("server stopped");

  Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to install Ctrl+C handler");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
    () = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}
