//! Game loop tests against the in-memory SQLite sandbox with scripted
//! narrators.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use futures::{StreamExt, stream};
use queryhunt_core::{
  SchemaName,
  ValidatedQuery,
  leaderboard::LeaderboardEntry,
  narrator::{HintRequest, HintService, HintStream, Mystery, StoryWorkflow},
  session::SessionState,
  store::{QueryOutput, SandboxStore},
  tables::GameTable,
};
use queryhunt_store_sqlite::SqliteSandbox;

use crate::{Game, GameError, Provisioned, error::WRONG_ACCUSATION_MESSAGE};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

/// Returns the same mystery every time, or fails when it has none.
struct FakeStory(Option<Mystery>);

impl StoryWorkflow for FakeStory {
  type Error = FakeError;

  async fn generate(&self) -> Result<Mystery, FakeError> {
    self.0.clone().ok_or_else(|| FakeError("workflow timed out".into()))
  }
}

/// Streams fixed fragments and remembers every request it was given.
#[derive(Clone, Default)]
struct FakeHints {
  fragments: Vec<Result<&'static str, &'static str>>,
  seen:      Arc<Mutex<Vec<HintRequest>>>,
}

impl FakeHints {
  fn streaming(fragments: &[&'static str]) -> Self {
    Self { fragments: fragments.iter().copied().map(Ok).collect(), ..Self::default() }
  }

  fn requests(&self) -> Vec<HintRequest> { self.seen.lock().unwrap().clone() }
}

impl HintService for FakeHints {
  type Error = FakeError;

  async fn hint(&self, request: HintRequest) -> Result<HintStream<FakeError>, FakeError> {
    self.seen.lock().unwrap().push(request);
    let items: Vec<Result<String, FakeError>> = self
      .fragments
      .iter()
      .copied()
      .map(|f| f.map(str::to_owned).map_err(|e| FakeError(e.to_owned())))
      .collect();
    Ok(stream::iter(items).boxed())
  }
}

/// Delegates to a real sandbox but can be told to fail drops or leaderboard
/// writes.
struct FailingStore {
  inner:            Arc<SqliteSandbox>,
  fail_drop:        bool,
  fail_leaderboard: bool,
}

fn detached() -> queryhunt_store_sqlite::Error {
  std::io::Error::other("disk detached").into()
}

impl SandboxStore for FailingStore {
  type Error = queryhunt_store_sqlite::Error;

  async fn schema_exists(&self, schema: &SchemaName) -> Result<bool, Self::Error> {
    self.inner.schema_exists(schema).await
  }

  async fn create_schema_and_tables(&self, schema: &SchemaName) -> Result<(), Self::Error> {
    self.inner.create_schema_and_tables(schema).await
  }

  async fn reset_schema(&self, schema: &SchemaName) -> Result<(), Self::Error> {
    self.inner.reset_schema(schema).await
  }

  async fn drop_schema(&self, schema: &SchemaName) -> Result<(), Self::Error> {
    if self.fail_drop {
      return Err(detached());
    }
    self.inner.drop_schema(schema).await
  }

  async fn list_schemas(&self) -> Result<Vec<SchemaName>, Self::Error> {
    self.inner.list_schemas().await
  }

  async fn execute_maintenance(
    &self,
    schema: &SchemaName,
    statements: &[String],
  ) -> Result<(), Self::Error> {
    self.inner.execute_maintenance(schema, statements).await
  }

  async fn run_query(
    &self,
    schema: &SchemaName,
    query: &ValidatedQuery,
  ) -> Result<QueryOutput, Self::Error> {
    self.inner.run_query(schema, query).await
  }

  async fn ground_truth(&self, schema: &SchemaName) -> Result<Vec<String>, Self::Error> {
    self.inner.ground_truth(schema).await
  }

  async fn row_counts(&self, schema: &SchemaName) -> Result<Vec<(GameTable, u64)>, Self::Error> {
    self.inner.row_counts(schema).await
  }

  async fn insert_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<(), Self::Error> {
    if self.fail_leaderboard {
      return Err(detached());
    }
    self.inner.insert_leaderboard_entry(entry).await
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

const STORY: &str = "Lord Ashcombe lies dead in the library of Blackwood Manor.";

fn statements() -> Vec<String> {
  [
    "INSERT INTO Victim VALUES (1, 'Lord Ashcombe', 67, 'Collector', '2024-10-31 23:10:00', 'Library');",
    "INSERT INTO Suspects VALUES (1, 'Jane Doe', 34, 'Niece', 'Inheritance'), (2, 'Tom Reed', 51, 'Butler', 'Dismissal');",
    "INSERT INTO Alibis VALUES (1, 1, 'At the opera', 0, '2024-10-31 23:00:00'), (2, 2, 'Polishing silver', 1, '2024-10-31 23:00:00');",
    "INSERT INTO CrimeScene VALUES (1, 'Library', 'Overturned chair', 1, 1);",
    "INSERT INTO Evidence VALUES (1, 'Opera ticket stub, unused', 'Library', 1, 1);",
    "INSERT INTO Murderer VALUES (1, 1, 'Jane Doe');",
  ]
  .into_iter()
  .map(str::to_owned)
  .collect()
}

fn mystery() -> Mystery { Mystery { story: STORY.into(), statements: statements() } }

type TestGame = Game<SqliteSandbox, FakeStory, FakeHints>;

async fn game_with(story: FakeStory, hints: FakeHints) -> (TestGame, Arc<SqliteSandbox>) {
  let store = Arc::new(SqliteSandbox::open_in_memory().await.expect("in-memory store"));
  (Game::new(store.clone(), story, hints), store)
}

async fn game() -> (TestGame, Arc<SqliteSandbox>) {
  game_with(FakeStory(Some(mystery())), FakeHints::streaming(&["Check ", "the alibis."])).await
}

async fn failing_game(
  fail_drop: bool,
  fail_leaderboard: bool,
) -> (Game<FailingStore, FakeStory, FakeHints>, Arc<SqliteSandbox>) {
  let inner = Arc::new(SqliteSandbox::open_in_memory().await.expect("in-memory store"));
  let store = FailingStore { inner: inner.clone(), fail_drop, fail_leaderboard };
  let game = Game::new(Arc::new(store), FakeStory(Some(mystery())), FakeHints::default());
  (game, inner)
}

fn schema(name: &str) -> SchemaName { SchemaName::parse(name).unwrap() }

async fn counts(store: &SqliteSandbox, schema: &SchemaName) -> Vec<u64> {
  store
    .row_counts(schema)
    .await
    .unwrap()
    .into_iter()
    .map(|(_, n)| n)
    .collect()
}

// ─── End-to-end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_game_is_solved_recorded_and_torn_down() {
  let (game, store) = game().await;
  let a = schema("userA");

  let started = game.start(&a).await.unwrap();
  assert_eq!(started.schema, a);
  assert_eq!(started.story, STORY);
  assert_eq!(counts(&store, &a).await, vec![1, 2, 2, 1, 1, 1]);

  let out = game.query(&a, "SELECT * FROM Suspects;").await.unwrap();
  assert_eq!(out.rows.len(), 2);
  assert_eq!(out.columns[1], "name");

  let verdict = game.accuse(&a, "  Jane Doe  ").await.unwrap();
  assert!(verdict.correct);
  assert!(verdict.elapsed_secs.is_some());
  assert!(verdict.share.unwrap().starts_with("I solved the QueryHunt game in "));
  let username = verdict.username.expect("leaderboard username");

  let entries = store.leaderboard_entries().await.unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].username, username);
  assert!(!store.schema_exists(&a).await.unwrap());

  let session = game.view(&a).await.unwrap();
  assert_eq!(session.state, SessionState::Completed);
  assert_eq!(session.queries, vec!["SELECT * FROM Suspects;".to_string()]);
  assert_eq!(session.accusations, vec!["  Jane Doe  ".to_string()]);
  assert!(session.ended_at.is_some());

  assert!(matches!(
    game.query(&a, "SELECT 1").await,
    Err(GameError::AlreadyCompleted)
  ));
}

#[tokio::test]
async fn second_game_after_completion_creates_fresh_schema() {
  let (game, store) = game().await;
  let a = schema("userA");

  let first = game.start(&a).await.unwrap();
  game.query(&a, "SELECT * FROM Victim").await.unwrap();
  assert!(game.accuse(&a, "Jane Doe").await.unwrap().correct);
  assert!(!store.schema_exists(&a).await.unwrap());

  let second = game.start(&a).await.unwrap();
  assert_ne!(first.game_id, second.game_id);
  assert_eq!(counts(&store, &a).await, vec![1, 2, 2, 1, 1, 1]);

  let session = game.view(&a).await.unwrap();
  assert_eq!(session.state, SessionState::Active);
  assert!(session.queries.is_empty());
  assert!(session.accusations.is_empty());
}

#[tokio::test]
async fn abandoned_game_is_recycled_on_reentry() {
  let (game, store) = game().await;
  let b = schema("userB");

  game.start(&b).await.unwrap();
  game.query(&b, "SELECT name FROM Suspects").await.unwrap();

  // The abandoned schema is still there; provisioning resets it.
  assert_eq!(game.sandbox().provision(&b).await.unwrap(), Provisioned::Reset);
  assert_eq!(counts(&store, &b).await, vec![0; 6]);

  // A full restart repopulates without key collisions.
  game.start(&b).await.unwrap();
  assert_eq!(counts(&store, &b).await, vec![1, 2, 2, 1, 1, 1]);
  assert!(game.view(&b).await.unwrap().queries.is_empty());
}

#[tokio::test]
async fn players_are_isolated() {
  let (game, _) = game().await;
  let (a, b) = (schema("userA"), schema("userB"));
  game.start(&a).await.unwrap();
  game.start(&b).await.unwrap();

  assert!(game.accuse(&a, "Jane Doe").await.unwrap().correct);

  let out = game.query(&b, "SELECT name FROM Murderer").await.unwrap();
  assert_eq!(out.rows, vec![vec![serde_json::json!("Jane Doe")]]);
  assert_eq!(game.view(&b).await.unwrap().state, SessionState::Active);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_queries_never_reach_history() {
  let (game, store) = game().await;
  let a = schema("userA");
  game.start(&a).await.unwrap();

  for bad in ["SELECT 1; DROP TABLE Victim;", "delete from Victim", "   ", "UPDATE Suspects SET age = 1"] {
    let err = game.query(&a, bad).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidQuery), "{bad}");
    assert_eq!(
      err.to_string(),
      "Wrong query syntax or non-Select statement. Please provide a valid SQL query."
    );
  }

  assert!(game.view(&a).await.unwrap().queries.is_empty());
  assert_eq!(counts(&store, &a).await, vec![1, 2, 2, 1, 1, 1]);
}

#[tokio::test]
async fn execution_errors_are_verbatim_and_recorded() {
  let (game, _) = game().await;
  let a = schema("userA");
  game.start(&a).await.unwrap();

  let err = game.query(&a, "SELECT * FROM Witnesses").await.unwrap_err();
  let GameError::Execution(message) = err else {
    panic!("expected an execution error, got {err:?}");
  };
  assert!(message.contains("no such table"), "{message}");

  let session = game.view(&a).await.unwrap();
  assert_eq!(session.queries, vec!["SELECT * FROM Witnesses".to_string()]);
  assert_eq!(session.state, SessionState::Active);
}

#[tokio::test]
async fn turns_without_a_game_are_refused() {
  let (game, _) = game().await;
  let a = schema("userA");

  assert!(game.view(&a).await.is_none());
  assert!(matches!(game.query(&a, "SELECT 1").await, Err(GameError::NotStarted)));
  assert!(matches!(game.hint(&a).await, Err(GameError::NotStarted)));
  assert!(matches!(game.accuse(&a, "Jane Doe").await, Err(GameError::NotStarted)));
}

// ─── Accusations ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_accusation_keeps_game_running() {
  let (game, store) = game().await;
  let a = schema("userA");
  game.start(&a).await.unwrap();

  let verdict = game.accuse(&a, "jane doe").await.unwrap();
  assert!(!verdict.correct);
  assert_eq!(verdict.message, WRONG_ACCUSATION_MESSAGE);
  assert!(verdict.username.is_none());

  assert!(matches!(game.accuse(&a, "   ").await, Err(GameError::EmptyAccusation)));

  let session = game.view(&a).await.unwrap();
  assert_eq!(session.state, SessionState::Active);
  assert_eq!(session.accusations, vec!["jane doe".to_string()]);
  assert!(store.schema_exists(&a).await.unwrap());
  assert!(store.leaderboard_entries().await.unwrap().is_empty());
}

// ─── Generation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn story_failure_leaves_game_unstarted() {
  let (game, _) = game_with(FakeStory(None), FakeHints::default()).await;
  let a = schema("userA");

  let err = game.start(&a).await.unwrap_err();
  assert!(matches!(err, GameError::Generation(_)));
  assert_eq!(err.to_string(), "Oops...something went wrong. Please try again!");

  assert_eq!(game.view(&a).await.unwrap().state, SessionState::Provisioning);
  assert!(matches!(game.query(&a, "SELECT 1").await, Err(GameError::NotStarted)));
}

#[tokio::test]
async fn destructive_population_is_refused() {
  let mut bad = mystery();
  bad.statements.push("DELETE FROM Alibis;".into());
  let (game, store) = game_with(FakeStory(Some(bad)), FakeHints::default()).await;
  let a = schema("userA");

  let err = game.start(&a).await.unwrap_err();
  assert!(matches!(err, GameError::Generation(_)));
  // Nothing was executed.
  assert_eq!(counts(&store, &a).await, vec![0; 6]);
}

#[tokio::test]
async fn mystery_needs_exactly_one_murderer() {
  let mut bad = mystery();
  bad.statements.push("INSERT INTO Murderer VALUES (2, 2, 'Tom Reed');".into());
  let (game, _) = game_with(FakeStory(Some(bad)), FakeHints::default()).await;
  let a = schema("userA");

  let err = game.start(&a).await.unwrap_err();
  assert!(err.detail().unwrap().contains("found 2"), "{err:?}");
}

// ─── Hints ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn hints_are_concatenated_and_grounded_in_history() {
  let hints = FakeHints::streaming(&["Check ", "the ", "alibis."]);
  let (game, _) = game_with(FakeStory(Some(mystery())), hints.clone()).await;
  let game = game.with_hint_language("Japanese");
  let a = schema("userA");
  game.start(&a).await.unwrap();
  game.query(&a, "SELECT * FROM Alibis").await.unwrap();

  assert_eq!(game.hint(&a).await.unwrap(), "Check the alibis.");
  game.hint(&a).await.unwrap();

  let requests = hints.requests();
  assert_eq!(requests.len(), 2);
  assert_eq!(requests[0].story, STORY);
  assert_eq!(requests[0].queries, vec!["SELECT * FROM Alibis".to_string()]);
  assert!(requests[0].hints.is_empty());
  assert_eq!(requests[0].language, "Japanese");
  assert_eq!(requests[1].hints, vec!["Check the alibis.".to_string()]);

  assert_eq!(game.view(&a).await.unwrap().hints.len(), 2);
}

#[tokio::test]
async fn broken_hint_stream_is_not_recorded() {
  let hints = FakeHints { fragments: vec![Ok("Check "), Err("connection reset")], ..FakeHints::default() };
  let (game, _) = game_with(FakeStory(Some(mystery())), hints).await;
  let a = schema("userA");
  game.start(&a).await.unwrap();

  assert!(matches!(game.hint(&a).await, Err(GameError::Generation(_))));
  assert!(game.view(&a).await.unwrap().hints.is_empty());
}

// ─── Concurrency and expiry ──────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_starts_for_one_identity_are_serialised() {
  let (game, store) = game().await;
  let a = schema("userA");

  let (first, second) = tokio::join!(game.start(&a), game.start(&a));
  let (first, second) = (first.unwrap(), second.unwrap());
  assert_ne!(first.game_id, second.game_id);
  assert_eq!(counts(&store, &a).await, vec![1, 2, 2, 1, 1, 1]);
}

#[tokio::test]
async fn sweep_expires_idle_sessions_and_orphans() {
  let (game, store) = game().await;
  let (a, b, ghost) = (schema("userA"), schema("userB"), schema("ghost"));
  game.start(&a).await.unwrap();
  game.start(&b).await.unwrap();
  store.create_schema_and_tables(&ghost).await.unwrap();

  // Nothing is idle yet; only the unowned schema goes.
  let report = game.sweep(Utc::now(), Duration::hours(1)).await.unwrap();
  assert!(report.expired.is_empty());
  assert_eq!(report.orphans, vec![ghost.clone()]);
  assert!(store.schema_exists(&a).await.unwrap());

  let later = Utc::now() + Duration::hours(2);
  let mut report = game.sweep(later, Duration::hours(1)).await.unwrap();
  report.expired.sort();
  assert_eq!(report.expired, vec![a.clone(), b.clone()]);
  assert!(report.orphans.is_empty());

  assert!(store.list_schemas().await.unwrap().is_empty());
  assert!(game.view(&a).await.is_none());
  assert_eq!(game.tracked_sessions(), 0);

  // An expired player simply starts over.
  game.start(&a).await.unwrap();
  assert!(game.view(&a).await.unwrap().is_active());
}

#[tokio::test]
async fn sweep_forgets_completed_sessions_once_idle() {
  let (game, store) = game().await;
  let a = schema("userA");
  game.start(&a).await.unwrap();
  game.accuse(&a, "Jane Doe").await.unwrap();

  let report = game.sweep(Utc::now() + Duration::hours(2), Duration::hours(1)).await.unwrap();
  assert!(report.expired.is_empty());
  assert!(game.view(&a).await.is_none());
  assert_eq!(store.leaderboard_entries().await.unwrap().len(), 1);
}

// ─── Best-effort endings ─────────────────────────────────────────────────────

#[tokio::test]
async fn failed_teardown_still_solves_and_records() {
  let (game, store) = failing_game(true, false).await;
  let a = schema("userA");
  game.start(&a).await.unwrap();

  let verdict = game.accuse(&a, "Jane Doe").await.unwrap();
  assert!(verdict.correct);
  let username = verdict.username.expect("leaderboard username");

  let entries = store.leaderboard_entries().await.unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].username, username);
  // The drop failed, so the sandbox is still there.
  assert!(store.schema_exists(&a).await.unwrap());
  assert_eq!(game.view(&a).await.unwrap().state, SessionState::Completed);
}

#[tokio::test]
async fn failed_leaderboard_write_omits_username() {
  let (game, store) = failing_game(false, true).await;
  let a = schema("userA");
  game.start(&a).await.unwrap();

  let verdict = game.accuse(&a, "Jane Doe").await.unwrap();
  assert!(verdict.correct);
  assert!(verdict.username.is_none());
  assert!(verdict.elapsed.is_some());

  assert!(store.leaderboard_entries().await.unwrap().is_empty());
  assert!(!store.schema_exists(&a).await.unwrap());
  assert_eq!(game.view(&a).await.unwrap().state, SessionState::Completed);
}
