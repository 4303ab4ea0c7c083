//! The fixed six-table game schema instantiated in every sandbox.
//!
//! The DDL is shared with the story-generation workflow, which writes INSERT
//! statements against exactly these tables and columns. Do not edit column
//! names or types without updating the workflow.

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator as _, IntoStaticStr};

/// One of the six tables in a sandbox schema.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, IntoStaticStr,
)]
pub enum GameTable {
  Victim,
  Suspects,
  Alibis,
  CrimeScene,
  Evidence,
  Murderer,
}

impl GameTable {
  /// Parents first: every table appears after the tables it references.
  pub const CREATION_ORDER: [GameTable; 6] = [
    GameTable::Victim,
    GameTable::Suspects,
    GameTable::Alibis,
    GameTable::CrimeScene,
    GameTable::Evidence,
    GameTable::Murderer,
  ];

  /// Children first: deleting rows in this order never violates a foreign
  /// key.
  pub const RESET_ORDER: [GameTable; 6] = [
    GameTable::Evidence,
    GameTable::Murderer,
    GameTable::Alibis,
    GameTable::CrimeScene,
    GameTable::Suspects,
    GameTable::Victim,
  ];

  pub fn name(self) -> &'static str { self.into() }

  /// Tables this table holds foreign keys into.
  pub fn references(self) -> &'static [GameTable] {
    match self {
      GameTable::Victim | GameTable::Suspects => &[],
      GameTable::Alibis | GameTable::Murderer => &[GameTable::Suspects],
      GameTable::CrimeScene => &[GameTable::Victim],
      GameTable::Evidence => &[GameTable::Suspects, GameTable::CrimeScene],
    }
  }

  /// `CREATE TABLE` statement for this table.
  pub fn ddl(self) -> &'static str {
    match self {
      GameTable::Victim => VICTIM_DDL,
      GameTable::Suspects => SUSPECTS_DDL,
      GameTable::Alibis => ALIBIS_DDL,
      GameTable::CrimeScene => CRIME_SCENE_DDL,
      GameTable::Evidence => EVIDENCE_DDL,
      GameTable::Murderer => MURDERER_DDL,
    }
  }

  pub fn all() -> impl Iterator<Item = GameTable> { GameTable::iter() }
}

// ─── DDL ─────────────────────────────────────────────────────────────────────

const VICTIM_DDL: &str = "CREATE TABLE Victim (
    victim_id INT NOT NULL,
    name VARCHAR(100),
    age INT,
    occupation VARCHAR(100),
    time_of_death DATETIME,
    location_of_death VARCHAR(100),
    PRIMARY KEY (victim_id)
);";

const SUSPECTS_DDL: &str = "CREATE TABLE Suspects (
    suspect_id INT NOT NULL,
    name VARCHAR(100),
    age INT,
    relationship_to_victim VARCHAR(100),
    motive VARCHAR(100),
    PRIMARY KEY (suspect_id)
);";

const ALIBIS_DDL: &str = "CREATE TABLE Alibis (
    alibi_id INT NOT NULL,
    suspect_id INT,
    alibi VARCHAR(255),
    alibi_verified BOOLEAN,
    alibi_time DATETIME,
    PRIMARY KEY (alibi_id),
    FOREIGN KEY (suspect_id) REFERENCES Suspects(suspect_id)
);";

const CRIME_SCENE_DDL: &str = "CREATE TABLE CrimeScene (
    scene_id INT NOT NULL,
    location VARCHAR(100),
    description TEXT,
    evidence_found BOOLEAN,
    victim_id INT,
    PRIMARY KEY (scene_id),
    FOREIGN KEY (victim_id) REFERENCES Victim(victim_id)
);";

const EVIDENCE_DDL: &str = "CREATE TABLE Evidence (
    evidence_id INT NOT NULL,
    description TEXT,
    found_at_location VARCHAR(100),
    points_to_suspect_id INT,
    scene_id INT,
    PRIMARY KEY (evidence_id),
    FOREIGN KEY (points_to_suspect_id) REFERENCES Suspects(suspect_id),
    FOREIGN KEY (scene_id) REFERENCES CrimeScene(scene_id)
);";

const MURDERER_DDL: &str = "CREATE TABLE Murderer (
    murderer_id INT NOT NULL,
    suspect_id INT,
    name VARCHAR(100),
    PRIMARY KEY (murderer_id),
    FOREIGN KEY (suspect_id) REFERENCES Suspects(suspect_id)
);";

#[cfg(test)]
mod tests {
  use super::*;

  fn position(order: &[GameTable], t: GameTable) -> usize {
    order.iter().position(|x| *x == t).unwrap()
  }

  #[test]
  fn orders_cover_every_table_once() {
    for order in [GameTable::CREATION_ORDER, GameTable::RESET_ORDER] {
      for t in GameTable::all() {
        assert_eq!(order.iter().filter(|x| **x == t).count(), 1, "{t}");
      }
    }
  }

  #[test]
  fn creation_order_puts_parents_first() {
    for t in GameTable::all() {
      for parent in t.references() {
        assert!(
          position(&GameTable::CREATION_ORDER, *parent)
            < position(&GameTable::CREATION_ORDER, t),
          "{parent} must be created before {t}"
        );
      }
    }
  }

  #[test]
  fn reset_order_puts_children_first() {
    for t in GameTable::all() {
      for parent in t.references() {
        assert!(
          position(&GameTable::RESET_ORDER, t)
            < position(&GameTable::RESET_ORDER, *parent),
          "{t} must be emptied before {parent}"
        );
      }
    }
  }

  #[test]
  fn ddl_names_its_table_and_references() {
    for t in GameTable::all() {
      assert!(t.ddl().starts_with(&format!("CREATE TABLE {} (", t.name())));
      for parent in t.references() {
        assert!(t.ddl().contains(&format!("REFERENCES {}(", parent.name())));
      }
    }
  }
}
