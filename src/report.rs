use crate::error::{Result, StatsError};
use crate::format::{ms_to_duration, ms_to_iso_duration, DurationFormat};
use crate::race::Race;
use crate::trackers::GameInfo;
use crate::types::{CasterStats, TeamStanding, VodRecord};
use crate::vods::{caster_stats, total_vod_duration_ms};
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path};

// ── Durations ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDurationRecord {
    pub info: GameInfo,
    pub duration_ms: u64,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationSummary {
    pub duration_ms: u64,
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDurations {
    pub shortest: Option<GameDurationRecord>,
    pub longest: Option<GameDurationRecord>,
    pub average: Option<DurationSummary>,
    pub median: Option<DurationSummary>,
}

// ── Rates ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApmSummary {
    pub samples: usize,
    #[serde(rename = "averageAPM")]
    pub average_apm: Option<u32>,
    #[serde(rename = "averageEAPM")]
    pub average_eapm: Option<u32>,
    #[serde(rename = "medianAPM")]
    pub median_apm: Option<u64>,
    #[serde(rename = "medianEAPM")]
    pub median_eapm: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRate {
    pub played: u64,
    pub won: u64,
    pub lost: u64,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupWinRate {
    pub played: u64,
    pub won: u64,
    pub win_rate: Option<String>,
    /// Difference against the season-wide rate of the same matchup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_rate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTypes {
    pub types: BTreeMap<String, u64>,
    pub tvb_percentage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastCounts {
    pub played: u64,
    pub cast: u64,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRate {
    #[serde(flatten)]
    pub totals: CastCounts,
    pub per_week: BTreeMap<u32, CastCounts>,
    pub per_tier: BTreeMap<u32, CastCounts>,
}

// ── Sections ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VodSummary {
    pub count: usize,
    pub total_duration_ms: u64,
    pub total_duration: String,
    pub total_duration_iso: String,
    pub casters: Vec<CasterStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStats {
    pub game_durations: GameDurations,
    pub game_types: GameTypes,
    pub cast_rate: CastRate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vods: Option<VodSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub tier: u32,
    pub games_played: u64,
    pub apm: BTreeMap<Race, ApmSummary>,
    pub game_durations: GameDurations,
    pub game_types: GameTypes,
    pub win_rates: BTreeMap<String, MatchupWinRate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWins {
    pub matches: WinRate,
    pub sets: WinRate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub alias: String,
    pub team_name: String,
    pub stats_regular: Option<TeamStanding>,
    pub stats_playoffs: Option<TeamStanding>,
    pub game_durations: GameDurations,
    pub match_wins: MatchWins,
    pub most_improved_players: Vec<String>,
    /// Ordered race pairs from this team's perspective, e.g. "PvZ".
    pub win_rates: BTreeMap<String, WinRate>,
    pub cast_rate: CastCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStats {
    pub map_name: String,
    pub games_played: u64,
    pub game_durations: GameDurations,
    pub win_rates: BTreeMap<String, MatchupWinRate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupStats {
    pub is_mirror: bool,
    pub games_played: u64,
    pub games_won: u64,
    pub games_lost: u64,
    pub game_durations: GameDurations,
    /// Win rate of the active race; mirrors have none.
    pub win_rate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceGamesPlayed {
    pub v_self: u64,
    pub v_all: u64,
    #[serde(rename = "vZ")]
    pub v_z: u64,
    #[serde(rename = "vT")]
    pub v_t: u64,
    #[serde(rename = "vP")]
    pub v_p: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceStats {
    pub apm: ApmSummary,
    pub games_played: RaceGamesPlayed,
    pub games_played_vs_other: u64,
    pub games_won_vs_other: u64,
    pub games_lost_vs_other: u64,
    pub win_rate: Option<String>,
    pub mirror_rate: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatus {
    pub known_winner: u64,
    pub unknown_winner: u64,
    pub active_race_won: u64,
    pub passive_race_won: u64,
}

/// The finished statistics of one season.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsTree {
    pub season: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub general: GeneralStats,
    pub per_tier: BTreeMap<u32, TierStats>,
    /// Ordered by regular season standing.
    pub per_team: Vec<TeamStats>,
    pub per_map: Vec<MapStats>,
    pub per_matchup: BTreeMap<String, MatchupStats>,
    pub per_race: BTreeMap<Race, RaceStats>,
    pub match_status: MatchStatus,
}

impl StatsTree {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StatsError::Data(format!("serialize stats: {e}")))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StatsError::io("create output dir", parent, e))?;
        }
        fs::write(path, self.to_json_pretty()?).map_err(|e| StatsError::io("write stats", path, e))
    }

    pub fn team(&self, alias: &str) -> Option<&TeamStats> {
        self.per_team.iter().find(|team| team.alias == alias)
    }

    pub fn map(&self, name: &str) -> Option<&MapStats> {
        self.per_map.iter().find(|map| map.map_name == name)
    }
}

pub fn vod_summary(vods: &[VodRecord]) -> VodSummary {
    let total = total_vod_duration_ms(vods);
    VodSummary {
        count: vods.len(),
        total_duration_ms: total,
        total_duration: ms_to_duration(total, DurationFormat::SHORT),
        total_duration_iso: ms_to_iso_duration(total),
        casters: caster_stats(vods),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vod_summary() {
        let vods: Vec<VodRecord> = serde_json::from_value(serde_json::json!([
            {"url": "a", "lengthSeconds": 5400, "meta": {"casters": ["Caster1"]}},
            {"url": "b", "lengthSeconds": 86_400, "meta": {"casters": ["Caster2"]}}
        ]))
        .unwrap();
        let summary = vod_summary(&vods);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_duration, "1:01:30:00");
        assert_eq!(summary.total_duration_iso, "P1DT1H30M");
        assert_eq!(summary.casters[0].name, "Caster2");
    }

    #[test]
    fn test_cast_rate_flattens_totals() {
        let mut rate = CastRate {
            totals: CastCounts {
                played: 4,
                cast: 1,
                percentage: Some("25.00%".to_string()),
            },
            ..Default::default()
        };
        rate.per_week.insert(1, CastCounts::default());
        let value = serde_json::to_value(&rate).unwrap();
        assert_eq!(value["played"], 4);
        assert_eq!(value["percentage"], "25.00%");
        assert!(value["perWeek"]["1"].is_object());
    }
}
