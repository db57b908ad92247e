use crate::error::{Result, StatsError};
use crate::format::{ms_to_duration, DurationFormat};
use crate::layout::{parse_tier_dir, parse_week_dir, split_pair, GroupKey};
use crate::race::{Matchup, Race};
use crate::replay_cache::ReplayCache;
use crate::types::*;
use crate::vods::group_cast_status;
use chrono::DateTime;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
    process::Command,
};

// ── Replay parsing ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Replay(ReplayRecord),
    /// The parser rejected the file as not being a replay at all.
    NotAReplay,
}

pub trait ReplayParser {
    fn parse(&mut self, path: &Path) -> Result<ParseOutcome>;
}

/// Runs the `screp` command line tool and reads its JSON output.
#[derive(Debug, Clone)]
pub struct ScrepParser {
    command: String,
    args: Vec<String>,
}

impl ScrepParser {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.screp_path.clone(), config.screp_args.clone())
    }
}

impl ReplayParser for ScrepParser {
    fn parse(&mut self, path: &Path) -> Result<ParseOutcome> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|e| StatsError::Parser {
                path: path.to_path_buf(),
                message: format!("run {}: {e}", self.command),
            })?;
        if !output.status.success() {
            let message = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stderr),
                String::from_utf8_lossy(&output.stdout)
            );
            if message.contains(NOT_A_REPLAY_MESSAGE) {
                return Ok(ParseOutcome::NotAReplay);
            }
            return Err(StatsError::Parser {
                path: path.to_path_buf(),
                message: message.trim().to_string(),
            });
        }
        let parsed: ScrepOutput = serde_json::from_slice(&output.stdout).map_err(|e| StatsError::json(path, e))?;
        Ok(ParseOutcome::Replay(record_from_screp(parsed)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrepOutput {
    pub header: ScrepHeader,
    #[serde(default)]
    pub computed: Option<ScrepComputed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrepHeader {
    pub frames: u32,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub map: String,
    #[serde(rename = "Type", default)]
    pub game_type: Option<ScrepNamed>,
    #[serde(default)]
    pub players: Vec<ScrepPlayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrepNamed {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrepPlayer {
    #[serde(rename = "ID")]
    pub id: u8,
    pub name: String,
    #[serde(default)]
    pub team: u8,
    pub race: ScrepNamed,
    #[serde(default)]
    pub observer: bool,
    #[serde(rename = "Type", default)]
    pub player_type: Option<ScrepNamed>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrepComputed {
    #[serde(default)]
    pub winner_team: u8,
    #[serde(default)]
    pub player_descs: Vec<ScrepPlayerDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScrepPlayerDesc {
    #[serde(rename = "PlayerID")]
    pub player_id: u8,
    #[serde(rename = "APM", default)]
    pub apm: u32,
    #[serde(rename = "EAPM", default)]
    pub eapm: u32,
}

pub fn clean_map_name(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string()
}

pub fn parse_start_time_ms(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw).ok().map(|parsed| parsed.timestamp_millis())
}

pub fn record_from_screp(output: ScrepOutput) -> ReplayRecord {
    let header = output.header;
    let computed = output.computed.unwrap_or_default();
    let mut winner_team = Some(computed.winner_team).filter(|team| *team != 0);

    let mut by_team: BTreeMap<u8, Vec<ReplayPlayer>> = BTreeMap::new();
    let mut solo: Vec<ReplayPlayer> = Vec::new();
    for player in &header.players {
        let is_human = player
            .player_type
            .as_ref()
            .map(|kind| kind.name.is_empty() || kind.name == "Human")
            .unwrap_or(true);
        if !is_human {
            continue;
        }
        let Some(race) = Race::from_label(&player.race.name) else {
            tracing::debug!("skipping player {} with race {:?}", player.name, player.race.name);
            continue;
        };
        let desc = computed.player_descs.iter().find(|desc| desc.player_id == player.id);
        let parsed = ReplayPlayer {
            name: player.name.clone(),
            race,
            apm: desc.map(|d| d.apm).unwrap_or(0),
            eapm: desc.map(|d| d.eapm).unwrap_or(0),
            is_observer: player.observer,
        };
        solo.push(parsed.clone());
        by_team.entry(player.team).or_default().push(parsed);
    }

    let mut teams: Vec<ReplayTeam> = by_team
        .into_iter()
        .map(|(id, players)| ReplayTeam { id, players })
        .collect();
    if teams.len() < 2 && solo.len() >= 2 {
        // Melee games put everyone on one team; treat each player as their own side.
        winner_team = None;
        teams = solo
            .into_iter()
            .enumerate()
            .map(|(n, player)| ReplayTeam {
                id: (n + 1) as u8,
                players: vec![player],
            })
            .collect();
    }

    ReplayRecord {
        frames: header.frames,
        duration_ms: header.frames as u64 * MS_PER_FRAME,
        start_time_ms: header.start_time.as_deref().and_then(parse_start_time_ms),
        map_name: clean_map_name(&header.map),
        game_type: header
            .game_type
            .map(|kind| kind.short_name.to_ascii_lowercase())
            .unwrap_or_default(),
        winner_team,
        teams,
    }
}

// ── Replay files ───────────────────────────────────────────────────────

pub fn collect_rep_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| StatsError::io("read dir", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StatsError::io("read dir entry", dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext == REPLAY_EXTENSION {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn collect_subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| StatsError::io("read dir", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StatsError::io("read dir entry", dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            dirs.push((name.to_string(), path.clone()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFile {
    /// Path relative to the replay root, `/`-separated.
    pub file: String,
    pub record: ReplayRecord,
}

#[derive(Debug, Clone, Default)]
pub struct MatchupInfo {
    pub total_duration_ms: u64,
    /// Race matchup of the last replay read.
    pub matchup: Option<Matchup>,
    pub earliest_ms: Option<i64>,
    pub latest_ms: Option<i64>,
    /// Ordered by embedded start time; replays without one go last.
    pub replays: Vec<ReplayFile>,
}

#[derive(Debug, Clone)]
pub struct PairingInfo {
    pub key: GroupKey,
    pub info: MatchupInfo,
}

#[derive(Debug, Clone)]
pub struct TierGroup {
    pub tier: u32,
    pub duration_ms: u64,
    pub matchup_counts: BTreeMap<String, u32>,
    pub cast_status: CastGroupStatus,
    pub pairings: Vec<PairingInfo>,
}

#[derive(Debug, Clone)]
pub struct TeamMatchupGroup {
    /// Full team names as written in the directory name.
    pub teams: (String, String),
    pub tiers: Vec<TierGroup>,
}

#[derive(Debug, Clone)]
pub struct WeekGroups {
    pub phase: Phase,
    pub week: u32,
    pub matchups: Vec<TeamMatchupGroup>,
}

/// One replay together with the group it was played in.
#[derive(Debug, Clone)]
pub struct ReplayEntry {
    pub key: GroupKey,
    pub file: String,
    pub record: ReplayRecord,
}

// ── Replay index ───────────────────────────────────────────────────────

/// Resolves replay files below a season's replay root, through the cache first.
pub struct ReplayIndex<P: ReplayParser> {
    root: PathBuf,
    cache: ReplayCache,
    parser: P,
}

impl<P: ReplayParser> ReplayIndex<P> {
    pub fn new(root: impl Into<PathBuf>, cache: ReplayCache, parser: P) -> Self {
        Self {
            root: root.into(),
            cache,
            parser,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn flush(&mut self) -> Result<()> {
        self.cache.flush()
    }

    /// Cache key of a replay: its path relative to the replay root.
    pub fn relative_key(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(raw) => Some(raw.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn replay_info(&mut self, path: &Path) -> Result<Option<ReplayRecord>> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let key = self.relative_key(&full);
        if let Some(cached) = self.cache.get(&key)? {
            return Ok(cached);
        }
        let record = match self.parser.parse(&full)? {
            ParseOutcome::Replay(record) => Some(record),
            ParseOutcome::NotAReplay => {
                tracing::warn!("{} is not a replay file", full.display());
                None
            }
        };
        tracing::debug!("parsed replay {key}");
        self.cache.insert(key, record.clone())?;
        Ok(record)
    }

    /// Every replay of a directory in file name order.
    pub fn unsorted_replay_info(&mut self, dir: &Path) -> Result<Vec<ReplayFile>> {
        let mut out = Vec::new();
        for path in collect_rep_files(dir)? {
            if let Some(record) = self.replay_info(&path)? {
                out.push(ReplayFile {
                    file: self.relative_key(&path),
                    record,
                });
            }
        }
        Ok(out)
    }

    pub fn matchup_info(&mut self, dir: &Path) -> Result<MatchupInfo> {
        let mut replays = self.unsorted_replay_info(dir)?;
        let mut info = MatchupInfo::default();
        for replay in &replays {
            info.total_duration_ms += replay.record.duration_ms;
            if let Some((a, b)) = replay.record.lead_races() {
                info.matchup = Some(Matchup::of(a, b));
            }
            if let Some(start) = replay.record.start_time_ms {
                info.earliest_ms = Some(info.earliest_ms.map_or(start, |v| v.min(start)));
                info.latest_ms = Some(info.latest_ms.map_or(start, |v| v.max(start)));
            }
        }
        replays.sort_by(|a, b| {
            let key = |r: &ReplayFile| (r.record.start_time_ms.is_none(), r.record.start_time_ms);
            key(a).cmp(&key(b)).then_with(|| a.file.cmp(&b.file))
        });
        info.replays = replays;
        Ok(info)
    }

    /// Finds the race opposite `known` in the first readable replay of a player pairing.
    pub fn determine_unknown_race(&mut self, known: Race, dir: &Path) -> Result<Option<Race>> {
        if !dir.is_dir() {
            tracing::warn!("no replays at {} to resolve an unknown race", dir.display());
            return Ok(None);
        }
        for path in collect_rep_files(dir)? {
            let Some(record) = self.replay_info(&path)? else {
                continue;
            };
            if let Some((a, b)) = record.lead_races() {
                return Ok(Some(if a == known { b } else { a }));
            }
        }
        Ok(None)
    }

    /// Walks `{phase}/week{N}/{teamA}_vs_{teamB}/tier{T}/{playerA}_vs_{playerB}` for the
    /// regular season and the playoffs.
    pub fn scan_season(&mut self, season: &SeasonRecord, vods: &[VodRecord]) -> Result<Vec<WeekGroups>> {
        let mut weeks = Vec::new();
        for phase in [Phase::Regular, Phase::Playoffs] {
            let phase_dir = self.root.join(phase.as_str());
            if !phase_dir.is_dir() {
                tracing::debug!("no {phase} replays at {}", phase_dir.display());
                continue;
            }
            let section = SectionMeta::for_phase(phase);
            let mut phase_weeks = Vec::new();
            for (name, week_dir) in collect_subdirs(&phase_dir)? {
                let Some(week) = parse_week_dir(&name) else {
                    tracing::warn!("skipping unexpected directory {}", week_dir.display());
                    continue;
                };
                let matchups = self.scan_week(season, vods, &section, phase, week, &week_dir)?;
                phase_weeks.push(WeekGroups { phase, week, matchups });
            }
            phase_weeks.sort_by_key(|w| w.week);
            weeks.extend(phase_weeks);
        }
        Ok(weeks)
    }

    fn scan_week(
        &mut self,
        season: &SeasonRecord,
        vods: &[VodRecord],
        section: &SectionMeta,
        phase: Phase,
        week: u32,
        week_dir: &Path,
    ) -> Result<Vec<TeamMatchupGroup>> {
        let mut matchups = Vec::new();
        for (name, matchup_dir) in collect_subdirs(week_dir)? {
            let Some(teams) = split_pair(&name) else {
                tracing::warn!("skipping unexpected directory {}", matchup_dir.display());
                continue;
            };
            let mut tiers = Vec::new();
            for (name, tier_dir) in collect_subdirs(&matchup_dir)? {
                let Some(tier) = parse_tier_dir(&name) else {
                    tracing::warn!("skipping unexpected directory {}", tier_dir.display());
                    continue;
                };
                let mut group = TierGroup {
                    tier,
                    duration_ms: 0,
                    matchup_counts: BTreeMap::new(),
                    cast_status: group_cast_status(section, tier, week, &teams.0, &teams.1, vods, season),
                    pairings: Vec::new(),
                };
                for (name, pair_dir) in collect_subdirs(&tier_dir)? {
                    let Some(players) = split_pair(&name) else {
                        tracing::warn!("skipping unexpected directory {}", pair_dir.display());
                        continue;
                    };
                    let info = self.matchup_info(&pair_dir)?;
                    group.duration_ms += info.total_duration_ms;
                    if let Some(matchup) = info.matchup {
                        *group.matchup_counts.entry(matchup.label()).or_default() += 1;
                    }
                    let key = GroupKey {
                        season: season.season_number,
                        phase,
                        week,
                        teams: teams.clone(),
                        tier,
                        players,
                    };
                    group.pairings.push(PairingInfo { key, info });
                }
                tiers.push(group);
            }
            tiers.sort_by_key(|t| t.tier);
            matchups.push(TeamMatchupGroup { teams, tiers });
        }
        Ok(matchups)
    }
}

/// The flat replay list the stats pass consumes.
pub fn flatten_replays(weeks: &[WeekGroups]) -> Vec<ReplayEntry> {
    weeks
        .iter()
        .flat_map(|week| week.matchups.iter())
        .flat_map(|matchup| matchup.tiers.iter())
        .flat_map(|tier| tier.pairings.iter())
        .flat_map(|pairing| {
            pairing.info.replays.iter().map(|replay| ReplayEntry {
                key: pairing.key.clone(),
                file: replay.file.clone(),
                record: replay.record.clone(),
            })
        })
        .collect()
}

/// Lists every group's playtime and race matchups, e.g. for a Discord post.
pub fn casting_groups_overview(weeks: &[WeekGroups], season: &SeasonRecord, only_uncast: bool) -> String {
    let alias = |name: &str| {
        season
            .team_by_name(name)
            .map(|team| team.alias().to_string())
            .unwrap_or_else(|| name.to_string())
    };
    let mut buffer = Vec::new();
    for week in weeks {
        let label = match week.phase {
            Phase::Regular => format!("Week {}", week.week),
            phase => format!("{} week {}", capitalize(phase.as_str()), week.week),
        };
        for matchup in &week.matchups {
            let tiers: Vec<&TierGroup> = matchup
                .tiers
                .iter()
                .filter(|tier| !only_uncast || !tier.cast_status.was_cast)
                .collect();
            if tiers.is_empty() {
                continue;
            }
            buffer.push(format!(
                "\n{label}, **{}** vs **{}**\n",
                alias(&matchup.teams.0),
                alias(&matchup.teams.1)
            ));
            for tier in tiers {
                let races = tier
                    .matchup_counts
                    .iter()
                    .map(|(matchup, amount)| format!("{matchup}: {amount}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                buffer.push(format!(
                    "• **Tier {}** - playtime: {}, matchups: {races}",
                    tier.tier,
                    ms_to_duration(tier.duration_ms, DurationFormat::SHORT)
                ));
            }
        }
    }
    buffer.join("\n").trim().to_string()
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{duel, write_replay, MockParser};

    fn open_index(dir: &Path, parser: MockParser) -> ReplayIndex<MockParser> {
        let cache = ReplayCache::open(dir.join("cache").join("replays.json")).unwrap();
        ReplayIndex::new(dir.join("replays"), cache, parser)
    }

    #[test]
    fn test_cache_hit_skips_parser() {
        let dir = tempfile::tempdir().unwrap();
        let rep = write_replay(dir.path(), "regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB/g1.rep");
        let mut parser = MockParser::default();
        parser.add("g1.rep", duel(Race::Terran, Race::Zerg, 1, 10_000));

        let mut index = open_index(dir.path(), parser);
        let first = index.replay_info(&rep).unwrap();
        let second = index.replay_info(&rep).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(index.parser().calls(), 1);
        drop(index);

        let mut index = open_index(dir.path(), MockParser::default());
        let relative = Path::new("regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB/g1.rep");
        assert_eq!(index.replay_info(relative).unwrap(), first);
        assert_eq!(index.parser().calls(), 0);
    }

    #[test]
    fn test_not_a_replay_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let rep = write_replay(dir.path(), "regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB/junk.rep");
        let mut index = open_index(dir.path(), MockParser::default());
        assert_eq!(index.replay_info(&rep).unwrap(), None);
        assert_eq!(index.replay_info(&rep).unwrap(), None);
        assert_eq!(index.parser().calls(), 1);
    }

    #[test]
    fn test_parser_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let rep = write_replay(dir.path(), "regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB/bad.rep");
        let mut parser = MockParser::default();
        parser.fail("bad.rep");
        let mut index = open_index(dir.path(), parser);
        assert!(matches!(index.replay_info(&rep), Err(StatsError::Parser { .. })));
    }

    #[test]
    fn test_matchup_info_sorts_by_start_time() {
        let dir = tempfile::tempdir().unwrap();
        let pair = "regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB";
        for name in ["a.rep", "b.rep", "c.rep", "notes.txt"] {
            write_replay(dir.path(), &format!("{pair}/{name}"));
        }
        let mut parser = MockParser::default();
        let mut late = duel(Race::Zerg, Race::Protoss, 1, 20_000);
        late.start_time_ms = Some(2_000);
        let mut early = duel(Race::Terran, Race::Zerg, 2, 10_000);
        early.start_time_ms = Some(1_000);
        let mut unknown = duel(Race::Terran, Race::Zerg, 1, 5_000);
        unknown.start_time_ms = None;
        parser.add("a.rep", late);
        parser.add("b.rep", unknown);
        parser.add("c.rep", early);

        let mut index = open_index(dir.path(), parser);
        let info = index.matchup_info(&dir.path().join("replays").join(pair)).unwrap();
        let files: Vec<&str> = info.replays.iter().map(|r| r.file.rsplit('/').next().unwrap()).collect();
        assert_eq!(files, vec!["c.rep", "a.rep", "b.rep"]);
        assert_eq!(info.total_duration_ms, 35_000 * 42);
        assert_eq!(info.earliest_ms, Some(1_000));
        assert_eq!(info.latest_ms, Some(2_000));
        assert_eq!(info.matchup.map(|m| m.label()), Some("TvZ".to_string()));
    }

    #[test]
    fn test_empty_directory_has_no_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let pair = dir.path().join("replays").join("empty");
        fs::create_dir_all(&pair).unwrap();
        let mut index = open_index(dir.path(), MockParser::default());
        let info = index.matchup_info(&pair).unwrap();
        assert_eq!(info.earliest_ms, None);
        assert_eq!(info.latest_ms, None);
        assert!(info.matchup.is_none());
    }

    #[test]
    fn test_determine_unknown_race() {
        let dir = tempfile::tempdir().unwrap();
        let pair = "regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB";
        write_replay(dir.path(), &format!("{pair}/g1.rep"));
        let mut parser = MockParser::default();
        parser.add("g1.rep", duel(Race::Protoss, Race::Zerg, 1, 10_000));
        let mut index = open_index(dir.path(), parser);
        let pair_dir = dir.path().join("replays").join(pair);
        assert_eq!(index.determine_unknown_race(Race::Zerg, &pair_dir).unwrap(), Some(Race::Protoss));
        assert_eq!(index.determine_unknown_race(Race::Protoss, &pair_dir).unwrap(), Some(Race::Zerg));
        let missing = dir.path().join("replays").join("nowhere");
        assert_eq!(index.determine_unknown_race(Race::Zerg, &missing).unwrap(), None);
    }

    #[test]
    fn test_determine_unknown_race_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let pair = "regular/week2/Alpha_vs_Beta/tier3/PlayerC_vs_PlayerD";
        write_replay(dir.path(), &format!("{pair}/a_junk.rep"));
        write_replay(dir.path(), &format!("{pair}/b_game.rep"));
        let mut parser = MockParser::default();
        parser.add("b_game.rep", duel(Race::Terran, Race::Protoss, 2, 9_000));
        let mut index = open_index(dir.path(), parser);
        let pair_dir = dir.path().join("replays").join(pair);
        // The junk file is memoised as not a replay and must not end the search.
        assert_eq!(index.replay_info(&pair_dir.join("a_junk.rep")).unwrap(), None);
        assert_eq!(index.determine_unknown_race(Race::Protoss, &pair_dir).unwrap(), Some(Race::Terran));
        assert_eq!(index.parser().calls(), 2);
    }

    #[test]
    fn test_scan_season_and_overview() {
        let dir = tempfile::tempdir().unwrap();
        write_replay(dir.path(), "regular/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB/g1.rep");
        write_replay(dir.path(), "regular/week1/Alpha_vs_Beta/tier1/PlayerC_vs_PlayerD/g2.rep");
        write_replay(dir.path(), "regular/week1/Alpha_vs_Beta/tier2/PlayerE_vs_PlayerF/g3.rep");
        write_replay(dir.path(), "playoffs/week1/Alpha_vs_Beta/tier1/PlayerA_vs_PlayerB/g4.rep");
        let mut parser = MockParser::default();
        parser.add("g1.rep", duel(Race::Terran, Race::Zerg, 1, 1_000));
        parser.add("g2.rep", duel(Race::Zerg, Race::Terran, 2, 2_000));
        parser.add("g3.rep", duel(Race::Protoss, Race::Protoss, 1, 3_000));
        parser.add("g4.rep", duel(Race::Zerg, Race::Protoss, 1, 4_000));

        let season: SeasonRecord = serde_json::from_value(serde_json::json!({
            "seasonNumber": 8,
            "teams": [
                {"name": "Alpha", "titleAliases": ["ALP"]},
                {"name": "Beta", "titleAliases": ["BET"]}
            ]
        }))
        .unwrap();
        let vods: Vec<VodRecord> = serde_json::from_value(serde_json::json!([{
            "url": "https://www.youtube.com/watch?v=abc",
            "lengthSeconds": 3600,
            "meta": {"season": 8, "week": 1, "tiers": [2], "teamMatchup": ["Alpha", "Beta"]}
        }]))
        .unwrap();

        let mut index = open_index(dir.path(), parser);
        let weeks = index.scan_season(&season, &vods).unwrap();
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].phase, Phase::Regular);
        let tiers = &weeks[0].matchups[0].tiers;
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].matchup_counts.get("TvZ"), Some(&2));
        assert_eq!(tiers[0].duration_ms, 3_000 * 42);
        assert!(!tiers[0].cast_status.was_cast);
        assert!(tiers[1].cast_status.was_cast);

        let entries = flatten_replays(&weeks);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].key.players, ("PlayerA".to_string(), "PlayerB".to_string()));
        assert_eq!(entries[3].key.phase, Phase::Playoffs);

        let overview = casting_groups_overview(&weeks, &season, true);
        assert!(overview.starts_with("Week 1, **ALP** vs **BET**"));
        assert!(overview.contains("• **Tier 1** - playtime: 2:06, matchups: TvZ: 2"));
        assert!(!overview.contains("Tier 2"));
        assert!(overview.contains("Playoffs week 1"));
    }

    #[test]
    fn test_record_from_screp_output() {
        let raw = serde_json::json!({
            "Header": {
                "Frames": 21_430,
                "StartTime": "2023-05-01T19:30:00Z",
                "Map": "\u{3}Polypoid\u{1} ",
                "Type": {"Name": "Top vs Bottom", "ShortName": "TvB"},
                "Players": [
                    {"ID": 0, "Name": "PlayerA", "Team": 1, "Race": {"Name": "Zerg"}, "Observer": false, "Type": {"Name": "Human"}},
                    {"ID": 1, "Name": "PlayerB", "Team": 2, "Race": {"Name": "Terran"}, "Observer": false, "Type": {"Name": "Human"}},
                    {"ID": 2, "Name": "Watcher", "Team": 2, "Race": {"Name": "Protoss"}, "Observer": true, "Type": {"Name": "Human"}}
                ]
            },
            "Computed": {
                "WinnerTeam": 2,
                "PlayerDescs": [
                    {"PlayerID": 0, "APM": 250, "EAPM": 190},
                    {"PlayerID": 1, "APM": 180, "EAPM": 150}
                ]
            }
        });
        let record = record_from_screp(serde_json::from_value(raw).unwrap());
        assert_eq!(record.map_name, "Polypoid");
        assert_eq!(record.game_type, "tvb");
        assert_eq!(record.duration_ms, 21_430 * 42);
        assert_eq!(record.winner_team, Some(2));
        assert_eq!(record.start_time_ms, Some(1_682_969_400_000));
        assert_eq!(record.winning_team().and_then(|t| t.lead_player()).map(|p| p.apm), Some(180));
        assert_eq!(record.lead_races(), Some((Race::Zerg, Race::Terran)));
        assert_eq!(record.teams[1].players.len(), 2);
    }
}
