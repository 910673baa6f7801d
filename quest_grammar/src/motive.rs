//! Motives: thematic reasons an NPC hands out a quest.
//!
//! A motive only decides which pre-authored rule generation starts from; it has no
//! structural effect on the quest.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motive {
    Knowledge,
    Comfort,
    Reputation,
    Serenity,
    Protection,
    Conquest,
    Wealth,
    Ability,
    Equipment,
}

impl Motive {
    pub const ALL: [Motive; 9] = [
        Motive::Knowledge,
        Motive::Comfort,
        Motive::Reputation,
        Motive::Serenity,
        Motive::Protection,
        Motive::Conquest,
        Motive::Wealth,
        Motive::Ability,
        Motive::Equipment,
    ];

    /// Name of the grammar rule generation starts from for this motive.
    pub fn start_rule(self) -> &'static str {
        match self {
            Motive::Knowledge => "Knowledge",
            Motive::Comfort => "Comfort",
            Motive::Reputation => "Reputation",
            Motive::Serenity => "Serenity",
            Motive::Protection => "Protection",
            Motive::Conquest => "Conquest",
            Motive::Wealth => "Wealth",
            Motive::Ability => "Ability",
            Motive::Equipment => "Equipment",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Motive {
        *Motive::ALL.choose(rng).unwrap_or(&Motive::Knowledge)
    }
}

impl Display for Motive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.start_rule())
    }
}

impl FromStr for Motive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Motive::ALL
            .into_iter()
            .find(|m| m.start_rule().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown motive '{s}'"))
    }
}
