use crate::format::{average, make_percentage, median, ms_to_duration, rounded_average, DurationFormat};
use crate::race::Race;
use crate::report::{ApmSummary, DurationSummary, GameDurationRecord, GameDurations, WinRate};
use serde::Serialize;

/// Identifies the game behind a shortest/longest record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub file: String,
    pub matchup: String,
    pub players: (String, String),
    pub races: Vec<Race>,
    pub tier: u32,
    pub week: u32,
    pub teams: (String, String),
    pub section: &'static str,
}

#[derive(Debug, Clone)]
struct TrackedGame {
    duration_ms: u64,
    info: GameInfo,
}

impl TrackedGame {
    fn record(&self) -> GameDurationRecord {
        GameDurationRecord {
            info: self.info.clone(),
            duration_ms: self.duration_ms,
            duration: ms_to_duration(self.duration_ms, DurationFormat::SHORT),
        }
    }
}

fn summary(duration_ms: Option<u64>) -> Option<DurationSummary> {
    duration_ms.map(|duration_ms| DurationSummary {
        duration_ms,
        duration: ms_to_duration(duration_ms, DurationFormat::SHORT),
    })
}

/// Shortest, longest, average and median game length of a bucket.
#[derive(Debug, Clone, Default)]
pub struct DurationTracker {
    shortest: Option<TrackedGame>,
    longest: Option<TrackedGame>,
    samples: Vec<u64>,
}

impl DurationTracker {
    /// On equal durations the game seen last holds the record.
    pub fn record(&mut self, duration_ms: u64, info: &GameInfo) {
        if self.shortest.as_ref().map_or(true, |game| duration_ms <= game.duration_ms) {
            self.shortest = Some(TrackedGame {
                duration_ms,
                info: info.clone(),
            });
        }
        if self.longest.as_ref().map_or(true, |game| duration_ms >= game.duration_ms) {
            self.longest = Some(TrackedGame {
                duration_ms,
                info: info.clone(),
            });
        }
        self.samples.push(duration_ms);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn finish(&self) -> GameDurations {
        GameDurations {
            shortest: self.shortest.as_ref().map(TrackedGame::record),
            longest: self.longest.as_ref().map(TrackedGame::record),
            average: summary(average(&self.samples)),
            median: summary(median(&self.samples)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApmTracker {
    apm: Vec<u32>,
    eapm: Vec<u32>,
}

impl ApmTracker {
    pub fn record(&mut self, apm: u32, eapm: u32) {
        self.apm.push(apm);
        self.eapm.push(eapm);
    }

    pub fn finish(&self) -> ApmSummary {
        let widen = |items: &[u32]| items.iter().map(|v| *v as u64).collect::<Vec<u64>>();
        ApmSummary {
            samples: self.apm.len(),
            average_apm: rounded_average(&self.apm),
            average_eapm: rounded_average(&self.eapm),
            median_apm: median(&widen(&self.apm)),
            median_eapm: median(&widen(&self.eapm)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinRateTracker {
    pub played: u64,
    pub won: u64,
}

impl WinRateTracker {
    pub fn record(&mut self, won: bool) {
        self.played += 1;
        if won {
            self.won += 1;
        }
    }

    pub fn add_played(&mut self, amount: u64) {
        self.played += amount;
    }

    pub fn add_won(&mut self, amount: u64) {
        self.won += amount;
    }

    pub fn finish(&self) -> WinRate {
        WinRate {
            played: self.played,
            won: self.won,
            lost: self.played - self.won,
            percentage: make_percentage(self.won, self.played),
        }
    }
}
