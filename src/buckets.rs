use crate::format::{differential_percentage, make_percentage};
use crate::race::{Matchup, Race, ALL_RACES, CANONICAL_MATCHUPS};
use crate::report::*;
use crate::trackers::{ApmTracker, DurationTracker, WinRateTracker};
use std::collections::BTreeMap;

// ── Shared tallies ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GameTypeTally {
    counts: BTreeMap<String, u64>,
}

impl GameTypeTally {
    pub fn add(&mut self, game_type: &str) {
        *self.counts.entry(game_type.to_string()).or_default() += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn finish(&self) -> GameTypes {
        let tvb = self.counts.get("tvb").copied().unwrap_or(0);
        GameTypes {
            types: self.counts.clone(),
            tvb_percentage: make_percentage(tvb, self.total()),
            total: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CastTally {
    pub played: u64,
    pub cast: u64,
}

impl CastTally {
    pub fn add(&mut self, was_cast: bool) {
        self.played += 1;
        if was_cast {
            self.cast += 1;
        }
    }

    pub fn finish(&self) -> CastCounts {
        CastCounts {
            played: self.played,
            cast: self.cast,
            percentage: make_percentage(self.cast, self.played),
        }
    }
}

/// Played and won counts per race matchup. Mirrors only ever count as played.
#[derive(Debug, Clone, Default)]
pub struct MatchupWins {
    rates: BTreeMap<Matchup, WinRateTracker>,
}

impl MatchupWins {
    pub fn record(&mut self, matchup: Matchup, active_race_won: Option<bool>) {
        self.rates
            .entry(matchup)
            .or_default()
            .record(active_race_won == Some(true));
    }

    pub fn get(&self, matchup: Matchup) -> WinRateTracker {
        self.rates.get(&matchup).copied().unwrap_or_default()
    }

    /// The canonical matchups, optionally compared against season-wide rates.
    pub fn finish(&self, season_rates: Option<&BTreeMap<Matchup, MatchupBucket>>) -> BTreeMap<String, MatchupWinRate> {
        CANONICAL_MATCHUPS
            .iter()
            .map(|matchup| {
                let rate = self.get(*matchup);
                let relative_rate = season_rates.and_then(|buckets| {
                    let regular = buckets.get(matchup)?.active_counts()?;
                    differential_percentage(regular, (rate.won, rate.played))
                });
                let entry = MatchupWinRate {
                    played: rate.played,
                    won: rate.won,
                    win_rate: make_percentage(rate.won, rate.played),
                    relative_rate,
                };
                (matchup.label(), entry)
            })
            .collect()
    }
}

// ── Buckets ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GlobalBucket {
    pub durations: DurationTracker,
    pub game_types: GameTypeTally,
    pub cast: CastTally,
    pub cast_per_week: BTreeMap<u32, CastTally>,
    pub cast_per_tier: BTreeMap<u32, CastTally>,
}

impl GlobalBucket {
    pub fn add_group(&mut self, week: u32, tier: u32, was_cast: bool) {
        self.cast.add(was_cast);
        self.cast_per_week.entry(week).or_default().add(was_cast);
        self.cast_per_tier.entry(tier).or_default().add(was_cast);
    }

    pub fn finish(&self, total_replays: usize) -> GeneralStats {
        let finish_all = |tallies: &BTreeMap<u32, CastTally>| {
            tallies
                .iter()
                .map(|(key, tally)| (*key, tally.finish()))
                .collect::<BTreeMap<_, _>>()
        };
        let mut game_types = self.game_types.finish();
        game_types.total = Some(total_replays);
        GeneralStats {
            game_durations: self.durations.finish(),
            game_types,
            cast_rate: CastRate {
                totals: self.cast.finish(),
                per_week: finish_all(&self.cast_per_week),
                per_tier: finish_all(&self.cast_per_tier),
            },
            vods: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TierBucket {
    pub tier: u32,
    pub games_played: u64,
    pub apm: BTreeMap<Race, ApmTracker>,
    pub durations: DurationTracker,
    pub game_types: GameTypeTally,
    pub matchups: MatchupWins,
}

impl TierBucket {
    pub fn new(tier: u32) -> Self {
        Self {
            tier,
            ..Default::default()
        }
    }

    pub fn finish(&self) -> TierStats {
        TierStats {
            tier: self.tier,
            games_played: self.games_played,
            apm: ALL_RACES
                .iter()
                .map(|race| (*race, self.apm.get(race).map(ApmTracker::finish).unwrap_or_default()))
                .collect(),
            game_durations: self.durations.finish(),
            game_types: self.game_types.finish(),
            win_rates: self.matchups.finish(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamBucket {
    pub alias: String,
    pub name: String,
    pub durations: DurationTracker,
    pub cast: CastTally,
}

impl TeamBucket {
    pub fn new(alias: &str, name: &str) -> Self {
        Self {
            alias: alias.to_string(),
            name: name.to_string(),
            durations: DurationTracker::default(),
            cast: CastTally::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapBucket {
    pub name: String,
    pub games_played: u64,
    pub durations: DurationTracker,
    pub matchups: MatchupWins,
}

impl MapBucket {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            games_played: 0,
            durations: DurationTracker::default(),
            matchups: MatchupWins::default(),
        }
    }

    pub fn finish(&self, season_rates: &BTreeMap<Matchup, MatchupBucket>) -> MapStats {
        MapStats {
            map_name: self.name.clone(),
            games_played: self.games_played,
            game_durations: self.durations.finish(),
            win_rates: self.matchups.finish(Some(season_rates)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchupBucket {
    pub matchup: Matchup,
    pub games_played: u64,
    /// Games won by the active race.
    pub games_won: u64,
    pub games_lost: u64,
    pub durations: DurationTracker,
}

impl MatchupBucket {
    pub fn new(matchup: Matchup) -> Self {
        Self {
            matchup,
            games_played: 0,
            games_won: 0,
            games_lost: 0,
            durations: DurationTracker::default(),
        }
    }

    /// Active-race `(won, played)`; mirrors have no active race.
    pub fn active_counts(&self) -> Option<(u64, u64)> {
        if self.matchup.is_mirror() {
            return None;
        }
        Some((self.games_won, self.games_played))
    }

    pub fn finish(&self) -> MatchupStats {
        let is_mirror = self.matchup.is_mirror();
        MatchupStats {
            is_mirror,
            games_played: self.games_played,
            games_won: self.games_won,
            games_lost: self.games_lost,
            game_durations: self.durations.finish(),
            win_rate: if is_mirror {
                None
            } else {
                make_percentage(self.games_won, self.games_played)
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RaceBucket {
    pub race: Race,
    pub apm: ApmTracker,
    pub games_played: u64,
    pub games_vs: BTreeMap<Race, u64>,
    pub played_vs_other: u64,
    pub won_vs_other: u64,
    pub lost_vs_other: u64,
}

impl RaceBucket {
    pub fn new(race: Race) -> Self {
        Self {
            race,
            apm: ApmTracker::default(),
            games_played: 0,
            games_vs: BTreeMap::new(),
            played_vs_other: 0,
            won_vs_other: 0,
            lost_vs_other: 0,
        }
    }

    pub fn add_game_vs(&mut self, opponent: Race) {
        self.games_played += 1;
        *self.games_vs.entry(opponent).or_default() += 1;
    }

    pub fn games_vs(&self, opponent: Race) -> u64 {
        self.games_vs.get(&opponent).copied().unwrap_or(0)
    }

    pub fn finish(&self) -> RaceStats {
        RaceStats {
            apm: self.apm.finish(),
            games_played: RaceGamesPlayed {
                v_self: self.games_vs(self.race),
                v_all: self.games_played,
                v_z: self.games_vs(Race::Zerg),
                v_t: self.games_vs(Race::Terran),
                v_p: self.games_vs(Race::Protoss),
            },
            games_played_vs_other: self.played_vs_other,
            games_won_vs_other: self.won_vs_other,
            games_lost_vs_other: self.lost_vs_other,
            win_rate: make_percentage(self.won_vs_other, self.played_vs_other),
            mirror_rate: make_percentage(self.games_vs(self.race), self.games_played),
        }
    }
}
