//! Handlers for `/game` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/game` | Start (or restart) a game, 201 |
//! | `GET`  | `/game` | Current session, `{"state":"no_session"}` if none |
//! | `POST` | `/game/query` | Body: `{"sql":"SELECT ..."}` |
//! | `POST` | `/game/hint` | Streams a hint and returns it whole |
//! | `POST` | `/game/accuse` | Body: `{"name":"Jane Doe"}` |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use queryhunt_core::{
  narrator::{HintService, StoryWorkflow},
  session::{PlayerSession, SessionState},
  store::{QueryOutput, SandboxStore},
};
use queryhunt_game::Accusation;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, player::Player};

// ─── Start ────────────────────────────────────────────────────────────────────

/// `POST /game`
pub async fn start<S, W, H>(
  State(state): State<AppState<S, W, H>>,
  Player(schema): Player,
) -> Result<impl IntoResponse, ApiError>
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  let started = state.game.start(&schema).await?;
  Ok((StatusCode::CREATED, Json(started)))
}

// ─── View ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SessionView {
  Playing(PlayerSession),
  Idle { state: SessionState },
}

/// `GET /game`
pub async fn view<S, W, H>(
  State(state): State<AppState<S, W, H>>,
  Player(schema): Player,
) -> Json<SessionView>
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  let view = match state.game.view(&schema).await {
    Some(session) => SessionView::Playing(session),
    None => SessionView::Idle { state: SessionState::NoSession },
  };
  Json(view)
}

// ─── Query ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryBody {
  pub sql: String,
}

/// `POST /game/query`, body: `{"sql":"SELECT * FROM Suspects"}`
pub async fn query<S, W, H>(
  State(state): State<AppState<S, W, H>>,
  Player(schema): Player,
  Json(body): Json<QueryBody>,
) -> Result<Json<QueryOutput>, ApiError>
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  Ok(Json(state.game.query(&schema, &body.sql).await?))
}

// ─── Hint ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HintResponse {
  pub hint: String,
}

/// `POST /game/hint`
pub async fn hint<S, W, H>(
  State(state): State<AppState<S, W, H>>,
  Player(schema): Player,
) -> Result<Json<HintResponse>, ApiError>
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  let hint = state.game.hint(&schema).await?;
  Ok(Json(HintResponse { hint }))
}

// ─── Accuse ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AccuseBody {
  pub name: String,
}

/// `POST /game/accuse`, body: `{"name":"Jane Doe"}`
pub async fn accuse<S, W, H>(
  State(state): State<AppState<S, W, H>>,
  Player(schema): Player,
  Json(body): Json<AccuseBody>,
) -> Result<Json<Accusation>, ApiError>
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  Ok(Json(state.game.accuse(&schema, &body.name).await?))
}
