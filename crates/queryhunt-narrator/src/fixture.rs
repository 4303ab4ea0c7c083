//! An offline story workflow that replays a mystery stored as TOML.
//!
//! ```toml
//! story = """Lord Ashcombe lies dead in the library..."""
//! statements = [
//!   "INSERT INTO Victim VALUES (...);",
//!   "INSERT INTO Murderer VALUES (...);",
//! ]
//! ```

use std::path::Path;

use queryhunt_core::narrator::{Mystery, StoryWorkflow};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FixtureStory {
  mystery: Mystery,
}

impl FixtureStory {
  pub fn from_toml(text: &str) -> Result<Self> {
    let mystery: Mystery = toml::from_str(text)?;
    if mystery.statements.is_empty() {
      return Err(Error::EmptyMystery);
    }
    Ok(Self { mystery })
  }

  pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
    let text = tokio::fs::read_to_string(path).await?;
    Self::from_toml(&text)
  }

  pub fn mystery(&self) -> &Mystery { &self.mystery }
}

impl StoryWorkflow for FixtureStory {
  type Error = Error;

  async fn generate(&self) -> Result<Mystery> { Ok(self.mystery.clone()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn replays_the_same_mystery() {
    let story = FixtureStory::from_toml(
      r#"
        story = "A body in the library."
        statements = ["INSERT INTO Murderer VALUES (1, 1, 'Jane Doe');"]
      "#,
    )
    .unwrap();

    let first = story.generate().await.unwrap();
    assert_eq!(first, story.generate().await.unwrap());
    assert_eq!(first.story, "A body in the library.");
  }

  #[test]
  fn rejects_malformed_fixtures() {
    assert!(matches!(FixtureStory::from_toml("story = 1"), Err(Error::Fixture(_))));
    assert!(matches!(
      FixtureStory::from_toml("story = \"s\"\nstatements = []"),
      Err(Error::EmptyMystery)
    ));
  }

  #[tokio::test]
  async fn bundled_fixture_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/blackwood-manor.toml");
    let story = FixtureStory::load(path).await.unwrap();
    let murderers = story
      .mystery()
      .statements
      .iter()
      .filter(|s| s.contains("INSERT INTO Murderer"))
      .count();
    assert_eq!(murderers, 1);
  }
}
