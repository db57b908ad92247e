use crate::config::SeasonPaths;
use crate::error::{Result, StatsError};
use crate::format::make_percentage;
use crate::types::*;
use serde::de::DeserializeOwned;
use std::{cmp::Ordering, collections::BTreeMap, fs, io::ErrorKind, path::Path};

/// Bracket labels for the sets listed in `playoffs.results`, best first.
pub const PLAYOFFS_LABELS: [[&str; 2]; 3] = [["Champions", "Runners-up"], ["3-4", "3-4"], ["5-6", "5-6"]];

fn read_json<T: DeserializeOwned>(path: &Path, action: &'static str) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|e| StatsError::io(action, path, e))?;
    serde_json::from_str(&data).map_err(|e| StatsError::json(path, e))
}

/// Reads a season's static data, weekly results and VOD list from disk.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    paths: SeasonPaths,
}

impl ResultRepository {
    pub fn new(paths: SeasonPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &SeasonPaths {
        &self.paths
    }

    pub fn season_data(&self) -> Result<SeasonRecord> {
        read_json(&self.paths.season_data(), "read season data")
    }

    pub fn misc_data(&self) -> Result<SeasonMiscData> {
        let path = self.paths.season_misc_data();
        if !path.is_file() {
            tracing::debug!("no misc data at {}", path.display());
            return Ok(SeasonMiscData::default());
        }
        read_json(&path, "read season misc data")
    }

    /// Number of `{prefix}week*_results.json` files for a phase.
    pub fn played_weeks(&self, phase: Phase) -> Result<u32> {
        let base = self.paths.season_base();
        let entries = match fs::read_dir(&base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StatsError::io("read dir", &base, e)),
        };
        let prefix = format!("{}week", phase.results_prefix());
        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StatsError::io("read dir entry", &base, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) && name.ends_with("_results.json") && entry.path().is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn week_results(&self, phase: Phase, week: u32) -> Result<Vec<MatchResultRecord>> {
        read_json(&self.paths.week_results(phase, week), "read week results")
    }

    fn phase_results(&self, phase: Phase) -> Result<BTreeMap<u32, Vec<MatchResultRecord>>> {
        let mut weeks = BTreeMap::new();
        for week in 1..=self.played_weeks(phase)? {
            weeks.insert(week, self.week_results(phase, week)?);
        }
        Ok(weeks)
    }

    pub fn season_results(&self) -> Result<SeasonResults> {
        Ok(SeasonResults {
            regular: self.phase_results(Phase::Regular)?,
            playoffs: self.phase_results(Phase::Playoffs)?,
        })
    }

    /// The season's VOD list; a season without one has no VODs.
    pub fn vods(&self) -> Result<Vec<VodRecord>> {
        let path = self.paths.vods();
        if !path.is_file() {
            tracing::warn!("no VOD data at {}; every group counts as uncast", path.display());
            return Ok(Vec::new());
        }
        read_json(&path, "read vods")
    }

    /// Merges every played week of a phase into per-team totals.
    pub fn all_week_results(&self, phase: Phase) -> Result<(BTreeMap<String, TeamTotals>, u32)> {
        phase_totals(&self.phase_results(phase)?, phase)
    }
}

/// Per-team totals over already loaded weeks, plus the number of weeks.
pub fn phase_totals(
    weeks: &BTreeMap<u32, Vec<MatchResultRecord>>,
    phase: Phase,
) -> Result<(BTreeMap<String, TeamTotals>, u32)> {
    let mut teams: BTreeMap<String, TeamTotals> = BTreeMap::new();
    for (week, records) in weeks {
        for (team, totals) in week_totals(records, phase, *week)? {
            teams.entry(team).or_default().merge(&totals);
        }
    }
    Ok((teams, weeks.len() as u32))
}

/// Resolves who won a walkover. `None` when the match was played.
pub fn walkover_winner(m: &Match) -> Result<Option<MatchWinner>> {
    if !m.walkover {
        return Ok(None);
    }
    let inactive = m.inactive_players.first();
    if inactive == Some(&m.player1.name) {
        return Ok(Some(MatchWinner::Player2));
    }
    if inactive == Some(&m.player2.name) {
        return Ok(Some(MatchWinner::Player1));
    }
    Err(StatsError::InvalidWalkover {
        player1: m.player1.name.clone(),
        player2: m.player2.name.clone(),
        inactive: m.inactive_players.clone(),
    })
}

pub fn match_winner(m: &Match) -> Result<MatchWinner> {
    if let Some(winner) = walkover_winner(m)? {
        return Ok(winner);
    }
    Ok(match m.player1.score.cmp(&m.player2.score) {
        Ordering::Greater => MatchWinner::Player1,
        Ordering::Less => MatchWinner::Player2,
        Ordering::Equal => MatchWinner::Draw,
    })
}

/// Per-team totals for one week of results.
pub fn week_totals(records: &[MatchResultRecord], phase: Phase, week: u32) -> Result<BTreeMap<String, TeamTotals>> {
    let mut teams: BTreeMap<String, TeamTotals> = BTreeMap::new();
    for record in records {
        let mut first = TeamTotals::default();
        let mut second = TeamTotals::default();
        for m in &record.matches {
            let winner = match_winner(m)?;
            if !m.walkover && m.player1.score == 0 && m.player2.score == 0 {
                continue;
            }
            let maps = m.player1.score + m.player2.score;
            for side in [&mut first, &mut second] {
                side.matches_played += 1;
                side.maps_played += maps;
                if !m.walkover && winner != MatchWinner::Draw {
                    side.real_matches_played += 1;
                }
            }
            first.maps_won += m.player1.score;
            second.maps_won += m.player2.score;
            match winner {
                MatchWinner::Player1 => {
                    first.matches_won += 1;
                    if !m.walkover {
                        first.real_matches_won += 1;
                    }
                }
                MatchWinner::Player2 => {
                    second.matches_won += 1;
                    if !m.walkover {
                        second.real_matches_won += 1;
                    }
                }
                MatchWinner::Draw => {}
            }
        }

        let by_matches = first.matches_won.cmp(&second.matches_won);
        match by_matches.then_with(|| first.maps_won.cmp(&second.maps_won)) {
            Ordering::Greater => first.matchups_won += 1,
            Ordering::Less => second.matchups_won += 1,
            Ordering::Equal => {
                tracing::warn!(
                    "draw in number of wins and number of maps: {} vs {} ({phase} week {week})",
                    record.team1,
                    record.team2
                );
                first.matchups_drawn += 1;
                second.matchups_drawn += 1;
            }
        }

        teams.entry(record.team1.clone()).or_default().merge(&first);
        teams.entry(record.team2.clone()).or_default().merge(&second);
    }
    Ok(teams)
}

fn ratio(won: u32, played: u32) -> f64 {
    if played == 0 {
        0.0
    } else {
        won as f64 / played as f64
    }
}

fn compare_totals(a: &TeamTotals, b: &TeamTotals, use_real_matches: bool) -> Ordering {
    let match_ratio = |t: &TeamTotals| {
        if use_real_matches {
            ratio(t.real_matches_won, t.real_matches_played)
        } else {
            ratio(t.matches_won, t.matches_played)
        }
    };
    a.matchups_won
        .cmp(&b.matchups_won)
        .then_with(|| match_ratio(a).total_cmp(&match_ratio(b)))
        .then_with(|| ratio(a.maps_won, a.maps_played).total_cmp(&ratio(b.maps_won, b.maps_played)))
}

fn standing(name: &str, totals: &TeamTotals, weeks_played: u32) -> TeamStanding {
    TeamStanding {
        name: name.to_string(),
        n: 0,
        played_weeks: weeks_played,
        totals: totals.clone(),
        matches_won_p: make_percentage(totals.matches_won as u64, totals.matches_played as u64),
        maps_won_p: make_percentage(totals.maps_won as u64, totals.maps_played as u64),
        real_matches_won_p: make_percentage(totals.real_matches_won as u64, totals.real_matches_played as u64),
        playoffs_bracket: None,
    }
}

/// Orders teams by matchups won, then match win ratio, then map win ratio.
///
/// Playoffs standings follow the bracket sets of the season data instead.
pub fn standings(
    totals: &BTreeMap<String, TeamTotals>,
    weeks_played: u32,
    season: &SeasonRecord,
    use_real_matches: bool,
    phase: Phase,
) -> Vec<TeamStanding> {
    let mut teams: Vec<TeamStanding> = totals
        .iter()
        .map(|(name, t)| standing(name, t, weeks_played))
        .collect();
    teams.sort_by(|a, b| {
        compare_totals(&b.totals, &a.totals, use_real_matches).then_with(|| a.name.cmp(&b.name))
    });
    for (n, team) in teams.iter_mut().enumerate() {
        team.n = n + 1;
    }
    if phase != Phase::Playoffs {
        return teams;
    }

    let mut bracket = Vec::new();
    for (set_n, set) in season.playoffs.results.iter().enumerate() {
        let mut set_teams: Vec<TeamStanding> = set
            .iter()
            .filter_map(|alias| {
                let name = season.full_team_name(alias);
                let found = teams.iter().find(|team| team.name == name).cloned();
                if found.is_none() {
                    tracing::warn!("playoffs team {alias} has no results");
                }
                found
            })
            .collect();
        set_teams.sort_by(|a, b| compare_totals(&b.totals, &a.totals, use_real_matches));
        for (m, mut team) in set_teams.into_iter().enumerate() {
            team.n = bracket.len() + 1;
            team.playoffs_bracket = PLAYOFFS_LABELS
                .get(set_n)
                .and_then(|labels| labels.get(m))
                .map(|label| label.to_string());
            bracket.push(team);
        }
    }
    bracket
}
