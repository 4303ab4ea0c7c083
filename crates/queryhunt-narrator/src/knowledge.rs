//! Offline hints drawn from a fixed knowledge base about the game schema.
//!
//! The next hint points at the first table, in investigation order, that the
//! player has not queried yet. Once every table has been looked at, general
//! join advice is handed out in turn. Hints already given are never repeated
//! while an unused one remains.

use futures::{StreamExt, stream};
use queryhunt_core::{
  narrator::{HintRequest, HintService, HintStream},
  tables::GameTable,
};

use crate::{Error, Result};

const TABLE_TIPS: &[(GameTable, &str)] = &[
  (
    GameTable::Victim,
    "Start with the Victim table: the time_of_death and location_of_death frame every alibi \
     you will check.",
  ),
  (
    GameTable::Suspects,
    "Look through Suspects and note each motive and relationship_to_victim. A strong motive is \
     not proof, but it narrows the field.",
  ),
  (
    GameTable::Alibis,
    "Join Alibis to Suspects on suspect_id and look for alibis where alibi_verified is false.",
  ),
  (
    GameTable::CrimeScene,
    "CrimeScene tells you where evidence_found is true. Compare its location with the victim's \
     location_of_death.",
  ),
  (
    GameTable::Evidence,
    "Evidence.points_to_suspect_id links each clue to a suspect. Count how many clues point at \
     each person.",
  ),
];

const GENERAL_TIPS: &[&str] = &[
  "Combine Evidence with Suspects and Alibis in one query: the murderer usually has both a clue \
   pointing at them and an unverified alibi.",
  "Compare alibi_time with the victim's time_of_death. An alibi that covers the wrong hour does \
   not clear anyone.",
  "Read the descriptions in Evidence carefully; they often contradict a suspect's alibi.",
];

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseHints;

impl KnowledgeBaseHints {
  /// The hint the player should see next.
  pub fn next_hint(&self, request: &HintRequest) -> &'static str {
    let queried = |table: GameTable| {
      let name = table.name().to_ascii_lowercase();
      request
        .queries
        .iter()
        .any(|q| q.to_ascii_lowercase().contains(&name))
    };
    let given = |tip: &str| request.hints.iter().any(|h| h == tip);

    let unused_table_tip = TABLE_TIPS
      .iter()
      .find(|(table, tip)| !queried(*table) && !given(tip))
      .map(|(_, tip)| *tip);

    unused_table_tip
      .or_else(|| GENERAL_TIPS.iter().copied().find(|tip| !given(tip)))
      .unwrap_or(GENERAL_TIPS[request.hints.len() % GENERAL_TIPS.len()])
  }
}

impl HintService for KnowledgeBaseHints {
  type Error = Error;

  async fn hint(&self, request: HintRequest) -> Result<HintStream<Error>> {
    let hint = self.next_hint(&request);
    let words: Vec<Result<String>> = hint
      .split_inclusive(' ')
      .map(|word| Ok(word.to_owned()))
      .collect();
    Ok(stream::iter(words).boxed())
  }
}
