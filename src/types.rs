use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt};

use crate::race::Race;

// ── Constants ──────────────────────────────────────────────────────────

/// Milliseconds per frame at the "fastest" game speed.
pub const MS_PER_FRAME: u64 = 42;
pub const REPLAY_EXTENSION: &str = "rep";
pub const NOT_A_REPLAY_MESSAGE: &str = "not a replay file";

// ── Season phases ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preseason,
    Regular,
    Playoffs,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Preseason => "preseason",
            Phase::Regular => "regular",
            Phase::Playoffs => "playoffs",
        }
    }

    /// Prefix of the weekly results files, e.g. `playoffs_week2_results.json`.
    pub fn results_prefix(self) -> &'static str {
        match self {
            Phase::Regular => "",
            Phase::Playoffs => "playoffs_",
            Phase::Preseason => "preseason_",
        }
    }

    /// Section label used on replay game info.
    pub fn section_label(self) -> &'static str {
        match self {
            Phase::Regular => "regular_season",
            Phase::Playoffs => "playoffs",
            Phase::Preseason => "preseason",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Season data ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub title_aliases: Vec<String>,
    #[serde(default)]
    pub tl_logo_image: Option<String>,
    #[serde(default)]
    pub use_alias_in_results: bool,
}

impl Team {
    /// Short name used as the key in misc data and reports.
    pub fn alias(&self) -> &str {
        self.title_aliases.first().map(String::as_str).unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegularSeasonInfo {
    pub map_pool: BTreeMap<String, Vec<String>>,
    pub weeks: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayoffsInfo {
    pub results: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub season_number: u32,
    pub teams: Vec<Team>,
    #[serde(default)]
    pub regular_season: RegularSeasonInfo,
    #[serde(default)]
    pub playoffs: PlayoffsInfo,
}

impl SeasonRecord {
    pub fn team_by_name(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.name == name)
    }

    pub fn team_by_alias(&self, alias: &str) -> Option<&Team> {
        self.teams
            .iter()
            .find(|team| team.title_aliases.iter().any(|a| a == alias))
    }

    /// Resolves a full team name from either its name or one of its aliases.
    pub fn full_team_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.team_by_name(raw)
            .or_else(|| self.team_by_alias(raw))
            .map(|team| team.name.as_str())
            .unwrap_or(raw)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMiscData {
    pub most_improved_players: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeasonMiscData {
    pub teams: BTreeMap<String, TeamMiscData>,
}

// ── Match results ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlayer {
    pub name: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub tier: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub player1: MatchPlayer,
    pub player2: MatchPlayer,
    #[serde(default)]
    pub walkover: bool,
    #[serde(default)]
    pub inactive_players: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResultRecord {
    pub team1: String,
    pub team2: String,
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// Which side won a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchWinner {
    Player1,
    Player2,
    Draw,
}

/// Result weeks of one season, keyed by week number.
#[derive(Debug, Clone, Default)]
pub struct SeasonResults {
    pub regular: BTreeMap<u32, Vec<MatchResultRecord>>,
    pub playoffs: BTreeMap<u32, Vec<MatchResultRecord>>,
}

impl SeasonResults {
    /// All weeks of every phase, regular season first.
    pub fn flattened(&self) -> Vec<(Phase, u32, &[MatchResultRecord])> {
        let regular = self
            .regular
            .iter()
            .map(|(week, records)| (Phase::Regular, *week, records.as_slice()));
        let playoffs = self
            .playoffs
            .iter()
            .map(|(week, records)| (Phase::Playoffs, *week, records.as_slice()));
        regular.chain(playoffs).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTotals {
    pub matches_played: u32,
    pub matches_won: u32,
    pub real_matches_played: u32,
    pub real_matches_won: u32,
    pub maps_played: u32,
    pub maps_won: u32,
    pub matchups_won: u32,
    pub matchups_drawn: u32,
}

impl TeamTotals {
    pub fn merge(&mut self, other: &TeamTotals) {
        self.matches_played += other.matches_played;
        self.matches_won += other.matches_won;
        self.real_matches_played += other.real_matches_played;
        self.real_matches_won += other.real_matches_won;
        self.maps_played += other.maps_played;
        self.maps_won += other.maps_won;
        self.matchups_won += other.matchups_won;
        self.matchups_drawn += other.matchups_drawn;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub name: String,
    pub n: usize,
    pub played_weeks: u32,
    #[serde(flatten)]
    pub totals: TeamTotals,
    pub matches_won_p: Option<String>,
    pub maps_won_p: Option<String>,
    pub real_matches_won_p: Option<String>,
    pub playoffs_bracket: Option<String>,
}

// ── VOD metadata ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodMeta {
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub tiers: Vec<u32>,
    #[serde(default)]
    pub team_matchup: Vec<String>,
    #[serde(default)]
    pub groups: Vec<(u32, u32)>,
    #[serde(default)]
    pub casters: Vec<String>,
    #[serde(default)]
    pub is_preseason: bool,
    #[serde(default)]
    pub is_showmatch: bool,
    #[serde(default)]
    pub is_hype_video: bool,
    #[serde(default, rename = "isMOTW")]
    pub is_motw: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodRecord {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub length_seconds: u64,
    #[serde(default)]
    pub meta: VodMeta,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastGroupStatus {
    pub was_cast: bool,
    pub vods: Vec<VodRecord>,
}

/// Extra `vod.meta` fields a section requires, compared by exact equality.
#[derive(Debug, Clone, Default)]
pub struct SectionMeta {
    pub meta_match: Map<String, Value>,
}

impl SectionMeta {
    pub fn for_phase(phase: Phase) -> SectionMeta {
        let mut meta_match = Map::new();
        meta_match.insert("isPreseason".into(), Value::Bool(phase == Phase::Preseason));
        meta_match.insert("isShowmatch".into(), Value::Bool(false));
        meta_match.insert("isHypeVideo".into(), Value::Bool(false));
        SectionMeta { meta_match }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CasterStats {
    pub name: String,
    pub casts: u32,
    pub time_cast_ms: u64,
    pub time_cast: String,
    pub time_cast_in_hours: String,
}

// ── Replay records ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayPlayer {
    pub name: String,
    pub race: Race,
    pub apm: u32,
    pub eapm: u32,
    #[serde(default)]
    pub is_observer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayTeam {
    pub id: u8,
    pub players: Vec<ReplayPlayer>,
}

impl ReplayTeam {
    /// The player who represents this team in a 1v1 game.
    pub fn lead_player(&self) -> Option<&ReplayPlayer> {
        self.players.iter().find(|player| !player.is_observer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub frames: u32,
    pub duration_ms: u64,
    pub start_time_ms: Option<i64>,
    pub map_name: String,
    pub game_type: String,
    pub winner_team: Option<u8>,
    pub teams: Vec<ReplayTeam>,
}

impl ReplayRecord {
    pub fn winning_team(&self) -> Option<&ReplayTeam> {
        let winner = self.winner_team?;
        self.teams.iter().find(|team| team.id == winner)
    }

    pub fn losing_team(&self) -> Option<&ReplayTeam> {
        let winner = self.winner_team?;
        self.teams.iter().find(|team| team.id != winner)
    }

    /// Races of the first two teams' lead players.
    pub fn lead_races(&self) -> Option<(Race, Race)> {
        let a = self.teams.first()?.lead_player()?.race;
        let b = self.teams.get(1)?.lead_player()?.race;
        Some((a, b))
    }

    pub fn races(&self) -> Vec<Race> {
        self.teams
            .iter()
            .flat_map(|team| team.players.iter().map(|player| player.race))
            .collect()
    }
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub data_dir: String,
    pub season: u32,
    pub screp_path: String,
    pub screp_args: Vec<String>,
    pub output_path: String,
    pub use_real_matches: bool,
    pub ignored_game_frames: Vec<u32>,
    pub map_aliases: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let map_aliases = [
            ("Untitled Scenario", "Butter"),
            ("Bombasticlipse", "Eclipse"),
            ("Sylphid", "Neo Sylphid"),
        ]
        .into_iter()
        .map(|(raw, name)| (raw.to_string(), name.to_string()))
        .collect();
        Self {
            data_dir: "data".to_string(),
            season: 0,
            screp_path: "screp".to_string(),
            screp_args: Vec::new(),
            output_path: String::new(),
            use_real_matches: false,
            ignored_game_frames: vec![644, 1032],
            map_aliases,
        }
    }
}

/// Options the stats pass takes from the config.
#[derive(Debug, Clone)]
pub struct StatsOptions {
    pub ignored_game_frames: Vec<u32>,
    pub map_aliases: BTreeMap<String, String>,
    pub use_real_matches: bool,
}

impl StatsOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ignored_game_frames: config.ignored_game_frames.clone(),
            map_aliases: config.map_aliases.clone(),
            use_real_matches: config.use_real_matches,
        }
    }

    /// Returns a map name normalized to its standard name.
    pub fn normalized_map_name(&self, raw: &str) -> String {
        self.map_aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
