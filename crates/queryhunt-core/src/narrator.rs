//! External collaborators: story generation and hint retrieval.
//!
//! Both are thin seams over third-party services. The game only needs a
//! narrative plus the statements that populate a sandbox, and a finite stream
//! of hint text fragments.

use std::future::Future;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

// ─── Story ───────────────────────────────────────────────────────────────────

/// A freshly generated mystery: the narrative shown to the player and the
/// INSERT statements that fill the six game tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mystery {
  pub story:      String,
  /// Executed in order inside the player's sandbox. Must leave exactly one
  /// row in `Murderer`.
  pub statements: Vec<String>,
}

pub trait StoryWorkflow: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Generate a new, solvable mystery.
  fn generate(&self) -> impl Future<Output = Result<Mystery, Self::Error>> + Send + '_;
}

// ─── Hints ───────────────────────────────────────────────────────────────────

/// A finite, non-restartable sequence of hint text fragments.
pub type HintStream<E> = BoxStream<'static, Result<String, E>>;

/// Everything a hint is grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct HintRequest {
  pub story:    String,
  pub queries:  Vec<String>,
  pub hints:    Vec<String>,
  /// Language the hint should be written in.
  pub language: String,
}

impl HintRequest {
  /// The full prompt sent to a language-model backed hint service.
  pub fn prompt(&self) -> String {
    let language = &self.language;
    let story = &self.story;
    let queries = render_list(&self.queries);
    let hints = render_list(&self.hints);
    format!(
      "You're an assistant helping a user with SQL murder mystery game.
Your goal is to provide a useful hint to a user and point them in the right direction towards identifying the correct murderer in the game.
Use your knowledge of the game schema.
Do not reveal the murderer.
Keep the hint short.
The hint should be in {language}.

In your hint, reference the game story:
---------------------
{story}
---------------------
Here are the user's SQL queries so far:
---------------------
{queries}
---------------------
Here are your previous hints:
---------------------
{hints}
---------------------
"
    )
  }
}

fn render_list(items: &[String]) -> String {
  if items.is_empty() {
    "(none)".to_owned()
  } else {
    items.join("\n")
  }
}

pub trait HintService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Start producing a hint. The caller consumes the stream to completion.
  fn hint(
    &self,
    request: HintRequest,
  ) -> impl Future<Output = Result<HintStream<Self::Error>, Self::Error>> + Send + '_;
}
