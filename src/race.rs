use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    #[serde(rename = "T")]
    Terran,
    #[serde(rename = "Z")]
    Zerg,
    #[serde(rename = "P")]
    Protoss,
}

pub const ALL_RACES: [Race; 3] = [Race::Terran, Race::Zerg, Race::Protoss];

impl Race {
    /// Reads a race from a label such as "Terran", "zerg" or "P".
    ///
    /// Placeholder labels ("Race Picker", "Random", "Declared") have no concrete race.
    pub fn from_label(label: &str) -> Option<Race> {
        match label.trim().chars().next()?.to_ascii_uppercase() {
            'T' => Some(Race::Terran),
            'Z' => Some(Race::Zerg),
            'P' => Some(Race::Protoss),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Race::Terran => 'T',
            Race::Zerg => 'Z',
            Race::Protoss => 'P',
        }
    }

    /// The race this one is favoured against in the T→Z→P→T cycle.
    pub fn prey(self) -> Race {
        match self {
            Race::Terran => Race::Zerg,
            Race::Zerg => Race::Protoss,
            Race::Protoss => Race::Terran,
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Returns whether the "active" race won, e.g. T beating Z, Z beating P and P beating T.
///
/// Mirrors have no active race and yield `None`.
pub fn check_active_win(winner: Race, loser: Race) -> Option<bool> {
    if winner == loser {
        return None;
    }
    Some(winner.prey() == loser)
}

/// An unordered race pairing, written with the active race first (TvZ, ZvP, PvT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Matchup {
    first: Race,
    second: Race,
}

impl Matchup {
    pub fn of(a: Race, b: Race) -> Matchup {
        if a == b || a.prey() == b {
            Matchup { first: a, second: b }
        } else {
            Matchup { first: b, second: a }
        }
    }

    pub fn is_mirror(self) -> bool {
        self.first == self.second
    }

    pub fn label(self) -> String {
        format!("{}v{}", self.first, self.second)
    }
}

impl fmt::Display for Matchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.first, self.second)
    }
}

pub const ALL_MATCHUPS: [Matchup; 6] = [
    Matchup { first: Race::Zerg, second: Race::Zerg },
    Matchup { first: Race::Protoss, second: Race::Protoss },
    Matchup { first: Race::Terran, second: Race::Terran },
    Matchup { first: Race::Zerg, second: Race::Protoss },
    Matchup { first: Race::Protoss, second: Race::Terran },
    Matchup { first: Race::Terran, second: Race::Zerg },
];

pub const CANONICAL_MATCHUPS: [Matchup; 3] = [
    Matchup { first: Race::Zerg, second: Race::Protoss },
    Matchup { first: Race::Protoss, second: Race::Terran },
    Matchup { first: Race::Terran, second: Race::Zerg },
];

/// Label of an ordered race pair from the first race's perspective, e.g. "PvZ".
pub fn permutation_label(own: Race, opponent: Race) -> String {
    format!("{own}v{opponent}")
}

pub fn all_permutations() -> Vec<(Race, Race)> {
    let mut out = Vec::with_capacity(9);
    for own in ALL_RACES {
        for opponent in ALL_RACES {
            out.push((own, opponent));
        }
    }
    out
}
