use crate::types::Phase;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const PAIR_SEPARATOR: &str = "_vs_";

/// Identifies one player pairing's replays:
/// `{phase}/week{N}/{teamA}_vs_{teamB}/tier{T}/{playerA}_vs_{playerB}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    pub season: u32,
    pub phase: Phase,
    pub week: u32,
    pub teams: (String, String),
    pub tier: u32,
    pub players: (String, String),
}

impl GroupKey {
    pub fn segments(&self) -> [String; 5] {
        [
            self.phase.as_str().to_string(),
            format!("week{}", self.week),
            join_pair(&self.teams.0, &self.teams.1),
            format!("tier{}", self.tier),
            join_pair(&self.players.0, &self.players.1),
        ]
    }

    /// Directory holding this group's replays below the season's replay root.
    pub fn replay_dir(&self, replays_root: &Path) -> PathBuf {
        self.segments()
            .iter()
            .fold(replays_root.to_path_buf(), |path, segment| path.join(segment))
    }

    pub fn relative_dir(&self) -> String {
        self.segments().join("/")
    }
}

pub fn join_pair(a: &str, b: &str) -> String {
    format!("{a}{PAIR_SEPARATOR}{b}")
}

pub fn split_pair(raw: &str) -> Option<(String, String)> {
    let (a, b) = raw.split_once(PAIR_SEPARATOR)?;
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some((a.to_string(), b.to_string()))
}

fn parse_numbered_dir(raw: &str, prefix: &str) -> Option<u32> {
    raw.strip_prefix(prefix)?.parse().ok()
}

pub fn parse_week_dir(raw: &str) -> Option<u32> {
    parse_numbered_dir(raw, "week")
}

pub fn parse_tier_dir(raw: &str) -> Option<u32> {
    parse_numbered_dir(raw, "tier")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> GroupKey {
        GroupKey {
            season: 8,
            phase: Phase::Regular,
            week: 3,
            teams: ("Alpha Squad".to_string(), "Beta Crew".to_string()),
            tier: 2,
            players: ("PlayerA".to_string(), "PlayerB".to_string()),
        }
    }

    #[test]
    fn test_replay_dir_layout() {
        assert_eq!(
            key().replay_dir(Path::new("/data/s8/replays")),
            PathBuf::from("/data/s8/replays/regular/week3/Alpha Squad_vs_Beta Crew/tier2/PlayerA_vs_PlayerB")
        );
        assert_eq!(
            key().relative_dir(),
            "regular/week3/Alpha Squad_vs_Beta Crew/tier2/PlayerA_vs_PlayerB"
        );
    }

    #[test]
    fn test_dir_name_parsing() {
        assert_eq!(parse_week_dir("week12"), Some(12));
        assert_eq!(parse_week_dir("weekly"), None);
        assert_eq!(parse_tier_dir("tier0"), Some(0));
        assert_eq!(split_pair("A_vs_B"), Some(("A".to_string(), "B".to_string())));
        assert_eq!(split_pair("_vs_B"), None);
        assert_eq!(split_pair("AvsB"), None);
    }
}
