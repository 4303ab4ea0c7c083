//! Leaderboard records and the display-name generator.

use chrono::NaiveDate;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

const ADJECTIVES: &[&str] = &[
  "Wacky", "Silly", "Cheerful", "Quirky", "Funky", "Zany", "Bubbly", "Gigantic",
  "Mischievous", "Goofy", "Bouncy", "Sneaky", "Jolly",
];

const ANIMALS: &[&str] = &[
  "Panda", "Kangaroo", "Penguin", "Platypus", "Llama", "Elephant", "Giraffe",
  "Dolphin", "Sloth", "Otter", "Chameleon", "Hedgehog", "Moose",
];

/// One finished game. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  pub username: String,
  pub date:     NaiveDate,
  pub time_sec: i64,
}

/// Adjective + animal + four digits, e.g. `SneakyOtter4821`.
///
/// Collisions are possible and are not checked.
pub fn generate_username<R: Rng + ?Sized>(rng: &mut R) -> String {
  let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Anonymous");
  let animal = ANIMALS.choose(rng).copied().unwrap_or("Sleuth");
  let number: u16 = rng.gen_range(1000..=9999);
  format!("{adjective}{animal}{number}")
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  #[test]
  fn username_is_adjective_animal_four_digits() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
      let name = generate_username(&mut rng);
      let adjective = ADJECTIVES.iter().find(|a| name.starts_with(**a)).unwrap();
      let rest = &name[adjective.len()..];
      let animal = ANIMALS.iter().find(|a| rest.starts_with(**a)).unwrap();
      let digits = &rest[animal.len()..];
      assert_eq!(digits.len(), 4, "{name}");
      let n: u16 = digits.parse().unwrap();
      assert!((1000..=9999).contains(&n));
    }
  }
}
