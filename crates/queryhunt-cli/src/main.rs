//! `queryhunt`: play QueryHunt from the terminal.
//!
//! # Usage
//!
//! ```text
//! queryhunt --url http://localhost:8080 --player detective42
//! queryhunt --config ~/.config/queryhunt/config.toml
//! ```
//!
//! Lines starting with `:` are commands (`:help` lists them); anything else
//! is sent to the server as a SELECT query.

mod client;
mod command;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client::{ApiClient, ApiConfig, SessionView};
use command::Command;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";
const DEFAULT_IDENTITY_HEADER: &str = "x-player-token";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "queryhunt", about = "Solve a SQL murder mystery from the terminal")]
struct Args {
  /// Path to a TOML config file (url, player, identity_header).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the QueryHunt server (default: http://localhost:8080).
  #[arg(long, env = "QUERYHUNT_URL")]
  url: Option<String>,

  /// Player token; letters, digits and `_` only. A fresh one is generated
  /// when omitted.
  #[arg(long, env = "QUERYHUNT_PLAYER")]
  player: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:             String,
  #[serde(default)]
  player:          String,
  #[serde(default)]
  identity_header: String,
}

fn non_empty(s: String) -> Option<String> { (!s.is_empty()).then_some(s) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // Flags and env override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url:        args
      .url
      .or_else(|| non_empty(file_cfg.url))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    player:          args
      .player
      .or_else(|| non_empty(file_cfg.player))
      .unwrap_or_else(|| format!("p{}", uuid::Uuid::new_v4().simple())),
    identity_header: non_empty(file_cfg.identity_header)
      .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_string()),
  };
  tracing::debug!(url = %api_config.base_url, player = %api_config.player, "connecting");

  let client = ApiClient::new(api_config)?;
  repl(&client).await
}

// ─── REPL ─────────────────────────────────────────────────────────────────────

async fn repl(client: &ApiClient) -> Result<()> {
  let mut stdout = tokio::io::stdout();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  say(
    &mut stdout,
    &format!(
      "QueryHunt: playing as {}. Type :start to begin, :help for commands.\n",
      client.player()
    ),
  )
  .await?;

  loop {
    stdout.write_all(b"queryhunt> ").await?;
    stdout.flush().await?;

    let Some(line) = lines.next_line().await.context("reading stdin")? else {
      break;
    };

    let reply = match command::parse(&line) {
      Command::Empty => continue,
      Command::Quit => break,
      Command::Help => Ok(command::HELP.to_string()),
      Command::Unknown(word) => Ok(format!("unknown command :{word} (try :help)\n")),
      Command::Start => {
        say(&mut stdout, "Generating a new mystery...\n").await?;
        client
          .start()
          .await
          .map(|g| format!("{}\n\n(sandbox: {})\n", g.story, g.schema))
      }
      Command::Sql(sql) => client.query(sql).await.map(|o| render::table(&o)),
      Command::Hint => client.hint().await.map(|h| format!("{h}\n")),
      Command::Accuse(name) => client.accuse(name).await.map(|a| {
        let mut s = format!("{}\n", a.message);
        if a.correct {
          if let Some(share) = a.share {
            s.push_str(&format!("{share}\n"));
          }
          if let Some(user) = a.username {
            s.push_str(&format!("Recorded on the leaderboard as {user}.\n"));
          }
        }
        s
      }),
      Command::Schema => client.schema().await.map(|tables| {
        tables
          .iter()
          .map(|t| format!("-- {}\n{}\n", t.name, t.ddl.trim()))
          .collect::<Vec<_>>()
          .join("\n")
      }),
      Command::Status => client.status().await.map(describe),
    };

    match reply {
      Ok(text) => say(&mut stdout, &text).await?,
      Err(e) => say(&mut stdout, &format!("error: {e}\n")).await?,
    }
  }

  say(&mut stdout, "bye\n").await
}

fn describe(view: SessionView) -> String {
  match view {
    SessionView::Idle { state } => format!("state: {state}\n"),
    SessionView::Playing(s) => format!(
      "state: {}\nqueries: {}\nhints: {}\naccusations: {}\n",
      s.state,
      s.queries.len(),
      s.hints.len(),
      s.accusations.len()
    ),
  }
}

async fn say(out: &mut tokio::io::Stdout, text: &str) -> Result<()> {
  out.write_all(text.as_bytes()).await?;
  out.flush().await?;
  Ok(())
}
