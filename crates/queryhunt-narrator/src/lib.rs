//! Story and hint collaborators for the game loop.
//!
//! Each collaborator has an HTTP implementation that talks to an external
//! service and an offline one that needs nothing but local files. The
//! [`StorySource`] and [`HintSource`] enums let the server pick either at
//! startup without making the game generic over the choice.

pub mod error;
pub mod fixture;
pub mod http;
pub mod knowledge;

use queryhunt_core::narrator::{HintRequest, HintService, HintStream, Mystery, StoryWorkflow};

pub use error::{Error, Result};
pub use fixture::FixtureStory;
pub use http::{HttpHintService, HttpStoryWorkflow};
pub use knowledge::KnowledgeBaseHints;

// ─── Story ───────────────────────────────────────────────────────────────────

pub enum StorySource {
  Http(HttpStoryWorkflow),
  Fixture(FixtureStory),
}

impl StoryWorkflow for StorySource {
  type Error = Error;

  async fn generate(&self) -> Result<Mystery> {
    match self {
      StorySource::Http(w) => w.generate().await,
      StorySource::Fixture(f) => f.generate().await,
    }
  }
}

// ─── Hints ───────────────────────────────────────────────────────────────────

pub enum HintSource {
  Http(HttpHintService),
  KnowledgeBase(KnowledgeBaseHints),
}

impl HintService for HintSource {
  type Error = Error;

  async fn hint(&self, request: HintRequest) -> Result<HintStream<Error>> {
    match self {
      HintSource::Http(h) => h.hint(request).await,
      HintSource::KnowledgeBase(k) => k.hint(request).await,
    }
  }
}
