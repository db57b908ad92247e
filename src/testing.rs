//! Fixtures shared by the unit tests.

use crate::error::{Result, StatsError};
use crate::race::Race;
use crate::replay::{ParseOutcome, ReplayParser};
use crate::types::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

/// Answers by file name and counts how often it was asked. Unknown files are not replays.
#[derive(Debug, Default)]
pub struct MockParser {
    records: BTreeMap<String, ReplayRecord>,
    failing: BTreeSet<String>,
    calls: usize,
}

impl MockParser {
    pub fn add(&mut self, file_name: &str, record: ReplayRecord) {
        self.records.insert(file_name.to_string(), record);
    }

    pub fn fail(&mut self, file_name: &str) {
        self.failing.insert(file_name.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl ReplayParser for MockParser {
    fn parse(&mut self, path: &Path) -> Result<ParseOutcome> {
        self.calls += 1;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if self.failing.contains(&name) {
            return Err(StatsError::Parser {
                path: path.to_path_buf(),
                message: "unexpected EOF".to_string(),
            });
        }
        Ok(match self.records.get(&name) {
            Some(record) => ParseOutcome::Replay(record.clone()),
            None => ParseOutcome::NotAReplay,
        })
    }
}

/// Creates an empty replay file below `{root}/replays`.
pub fn write_replay(root: &Path, relative: &str) -> PathBuf {
    let path = root.join("replays").join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"").unwrap();
    path
}

fn side(id: u8, name: &str, race: Race, apm: u32) -> ReplayTeam {
    ReplayTeam {
        id,
        players: vec![ReplayPlayer {
            name: name.to_string(),
            race,
            apm,
            eapm: apm - 40,
            is_observer: false,
        }],
    }
}

/// A 1v1 on Polypoid. `winner` is the winning team id (1 or 2, 0 for unknown).
pub fn duel(race_a: Race, race_b: Race, winner: u8, frames: u32) -> ReplayRecord {
    ReplayRecord {
        frames,
        duration_ms: frames as u64 * MS_PER_FRAME,
        start_time_ms: Some(1_700_000_000_000),
        map_name: "Polypoid".to_string(),
        game_type: "tvb".to_string(),
        winner_team: Some(winner).filter(|w| *w != 0),
        teams: vec![side(1, "PlayerA", race_a, 200), side(2, "PlayerB", race_b, 160)],
    }
}
