//! Async HTTP client wrapping the QueryHunt JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use queryhunt_core::{
  session::{PlayerSession, SessionState},
  store::QueryOutput,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

/// Connection settings for the QueryHunt API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url:        String,
  /// Identity sent with every request; names the player's sandbox.
  pub player:          String,
  pub identity_header: String,
}

// ─── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartedGame {
  pub schema: String,
  pub story:  String,
}

#[derive(Debug, Deserialize)]
pub struct Accusation {
  pub correct:  bool,
  pub message:  String,
  #[serde(default)]
  pub share:    Option<String>,
  #[serde(default)]
  pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TableInfo {
  pub name: String,
  pub ddl:  String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SessionView {
  Playing(PlayerSession),
  Idle { state: SessionState },
}

#[derive(Deserialize)]
struct HintBody {
  hint: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the QueryHunt REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    // Story generation can take a while.
    let client = Client::builder()
      .timeout(Duration::from_secs(180))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn player(&self) -> &str { &self.config.player }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn identified(&self, req: RequestBuilder) -> RequestBuilder {
    req.header(self.config.identity_header.as_str(), self.config.player.as_str())
  }

  async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    let resp = self
      .identified(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    decode(what, resp).await
  }

  /// `POST /game`
  pub async fn start(&self) -> Result<StartedGame> {
    self.send("POST /game", self.client.post(self.url("/game"))).await
  }

  /// `GET /game`
  pub async fn status(&self) -> Result<SessionView> {
    self.send("GET /game", self.client.get(self.url("/game"))).await
  }

  /// `POST /game/query`
  pub async fn query(&self, sql: &str) -> Result<QueryOutput> {
    let req = self.client.post(self.url("/game/query")).json(&json!({ "sql": sql }));
    self.send("POST /game/query", req).await
  }

  /// `POST /game/hint`
  pub async fn hint(&self) -> Result<String> {
    let body: HintBody = self.send("POST /game/hint", self.client.post(self.url("/game/hint"))).await?;
    Ok(body.hint)
  }

  /// `POST /game/accuse`
  pub async fn accuse(&self, name: &str) -> Result<Accusation> {
    let req = self.client.post(self.url("/game/accuse")).json(&json!({ "name": name }));
    self.send("POST /game/accuse", req).await
  }

  /// `GET /schema`
  pub async fn schema(&self) -> Result<Vec<TableInfo>> {
    self.send("GET /schema", self.client.get(self.url("/schema"))).await
  }
}

/// Deserialize a success body, or surface the server's `{"error": ...}`
/// message as-is.
async fn decode<T: DeserializeOwned>(what: &str, resp: Response) -> Result<T> {
  let status = resp.status();
  if status.is_success() {
    return resp.json().await.with_context(|| format!("deserialising {what}"));
  }
  match resp.json::<ErrorBody>().await {
    Ok(body) => Err(anyhow!(body.error)),
    Err(_) => Err(anyhow!("{what} → {status}")),
  }
}
