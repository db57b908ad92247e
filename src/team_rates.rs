use crate::error::Result;
use crate::layout::GroupKey;
use crate::race::{all_permutations, permutation_label, Race};
use crate::replay::{ReplayIndex, ReplayParser};
use crate::report::{MatchWins, WinRate};
use crate::trackers::WinRateTracker;
use crate::types::*;
use std::collections::BTreeMap;

/// A team's match, map and race-pair results over every result week.
#[derive(Debug, Clone, Default)]
pub struct TeamWinRates {
    pub games: WinRateTracker,
    pub maps: WinRateTracker,
    pub permutations: BTreeMap<(Race, Race), WinRateTracker>,
}

impl TeamWinRates {
    pub fn match_wins(&self) -> MatchWins {
        MatchWins {
            matches: self.games.finish(),
            sets: self.maps.finish(),
        }
    }

    /// All nine ordered race pairs, e.g. "PvZ" for this team's Protoss against Zerg.
    pub fn permutation_rates(&self) -> BTreeMap<String, WinRate> {
        all_permutations()
            .into_iter()
            .map(|(own, opponent)| {
                let rate = self.permutations.get(&(own, opponent)).copied().unwrap_or_default();
                (permutation_label(own, opponent), rate.finish())
            })
            .collect()
    }
}

/// Concrete races of both players. A placeholder race ("Race Picker", "Declared") is
/// read from the group's replay when the other player's race is known.
pub fn resolve_match_races<P: ReplayParser>(
    m: &Match,
    key: Option<&GroupKey>,
    index: &mut ReplayIndex<P>,
) -> Result<Option<(Race, Race)>> {
    let first = Race::from_label(&m.player1.race);
    let second = Race::from_label(&m.player2.race);
    let (known, unknown_first) = match (first, second) {
        (Some(a), Some(b)) => return Ok(Some((a, b))),
        (None, None) => return Ok(None),
        (Some(a), None) => (a, false),
        (None, Some(b)) => (b, true),
    };
    let Some(key) = key else {
        tracing::warn!(
            "cannot locate replays for {} vs {}; leaving the match out of matchup stats",
            m.player1.name,
            m.player2.name
        );
        return Ok(None);
    };
    let dir = key.replay_dir(index.root());
    let Some(resolved) = index.determine_unknown_race(known, &dir)? else {
        tracing::warn!("could not resolve the unknown race in {}", key.relative_dir());
        return Ok(None);
    };
    Ok(Some(if unknown_first {
        (resolved, known)
    } else {
        (known, resolved)
    }))
}

fn replay_key(season: &SeasonRecord, phase: Phase, week: u32, record: &MatchResultRecord, m: &Match) -> Option<GroupKey> {
    let tier = [m.player1.tier, m.player2.tier].into_iter().flatten().min()?;
    Some(GroupKey {
        season: season.season_number,
        phase,
        week,
        teams: (record.team1.clone(), record.team2.clone()),
        tier,
        players: (m.player1.name.clone(), m.player2.name.clone()),
    })
}

/// Replays every result week from one team's perspective. Draws and walkovers are left out.
pub fn team_win_rates<P: ReplayParser>(
    team: &Team,
    results: &SeasonResults,
    season: &SeasonRecord,
    index: &mut ReplayIndex<P>,
) -> Result<TeamWinRates> {
    let mut rates = TeamWinRates::default();
    for (phase, week, records) in results.flattened() {
        for record in records {
            let own_first = if record.team1 == team.name {
                true
            } else if record.team2 == team.name {
                false
            } else {
                continue;
            };
            for m in &record.matches {
                let (own, opponent) = if own_first {
                    (&m.player1, &m.player2)
                } else {
                    (&m.player2, &m.player1)
                };
                if m.walkover || own.score == opponent.score {
                    continue;
                }
                let won = own.score > opponent.score;
                rates.maps.add_played((own.score + opponent.score) as u64);
                rates.maps.add_won(own.score as u64);
                rates.games.record(won);

                let key = replay_key(season, phase, week, record, m);
                let Some((race1, race2)) = resolve_match_races(m, key.as_ref(), index)? else {
                    continue;
                };
                let pair = if own_first { (race1, race2) } else { (race2, race1) };
                rates.permutations.entry(pair).or_default().record(won);
            }
        }
    }
    Ok(rates)
}
