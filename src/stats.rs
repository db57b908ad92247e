use crate::buckets::*;
use crate::error::{Result, StatsError};
use crate::race::{check_active_win, Matchup, ALL_MATCHUPS, ALL_RACES, Race};
use crate::replay::{ReplayEntry, ReplayIndex, ReplayParser, WeekGroups};
use crate::report::{MatchStatus, StatsTree, TeamStats};
use crate::results::{phase_totals, standings};
use crate::team_rates::team_win_rates;
use crate::trackers::GameInfo;
use crate::types::*;
use std::collections::BTreeMap;

/// Running statistics over every replay of a season.
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    pub(crate) options: StatsOptions,
    pub(crate) global: GlobalBucket,
    pub(crate) tiers: BTreeMap<u32, TierBucket>,
    /// Keyed by team alias.
    pub(crate) teams: BTreeMap<String, TeamBucket>,
    pub(crate) maps: BTreeMap<String, MapBucket>,
    pub(crate) matchups: BTreeMap<Matchup, MatchupBucket>,
    pub(crate) races: BTreeMap<Race, RaceBucket>,
    pub(crate) status: MatchStatus,
    pub(crate) total_replays: usize,
}

impl StatsAccumulator {
    pub fn new(season: &SeasonRecord, options: StatsOptions) -> Self {
        Self {
            options,
            global: GlobalBucket::default(),
            tiers: BTreeMap::new(),
            teams: season
                .teams
                .iter()
                .map(|team| (team.alias().to_string(), TeamBucket::new(team.alias(), &team.name)))
                .collect(),
            maps: BTreeMap::new(),
            matchups: ALL_MATCHUPS.iter().map(|m| (*m, MatchupBucket::new(*m))).collect(),
            races: ALL_RACES.iter().map(|r| (*r, RaceBucket::new(*r))).collect(),
            status: MatchStatus::default(),
            total_replays: 0,
        }
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    fn team_alias(season: &SeasonRecord, name: &str) -> String {
        season
            .team_by_name(name)
            .map(|team| team.alias().to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Counts one replay. Replays without a known winner and loser are only tallied.
    pub fn add_replay(&mut self, entry: &ReplayEntry, season: &SeasonRecord) {
        self.total_replays += 1;
        let record = &entry.record;
        let winner = record.winning_team().and_then(|team| team.lead_player());
        let loser = record.losing_team().and_then(|team| team.lead_player());
        let (Some(winner), Some(loser), Some((race_a, race_b))) = (winner, loser, record.lead_races()) else {
            tracing::debug!("unknown winner in {}", entry.file);
            self.status.unknown_winner += 1;
            return;
        };
        self.status.known_winner += 1;

        let tier = self
            .tiers
            .entry(entry.key.tier)
            .or_insert_with(|| TierBucket::new(entry.key.tier));
        for team in &record.teams {
            if let Some(player) = team.lead_player() {
                tier.apm.entry(player.race).or_default().record(player.apm, player.eapm);
                if let Some(bucket) = self.races.get_mut(&player.race) {
                    bucket.apm.record(player.apm, player.eapm);
                }
            }
        }

        let matchup = Matchup::of(race_a, race_b);
        let is_mirror = matchup.is_mirror();
        let active_race_won = check_active_win(winner.race, loser.race);
        let map_name = self.options.normalized_map_name(&record.map_name);
        let map = self
            .maps
            .entry(map_name.clone())
            .or_insert_with(|| MapBucket::new(&map_name));

        self.global.game_types.add(&record.game_type);

        if self.options.ignored_game_frames.contains(&record.frames) {
            tracing::debug!("leaving {} ({} frames) out of game durations", entry.file, record.frames);
        } else {
            let teams = (
                Self::team_alias(season, &entry.key.teams.0),
                Self::team_alias(season, &entry.key.teams.1),
            );
            let info = GameInfo {
                file: entry.file.clone(),
                matchup: matchup.label(),
                players: entry.key.players.clone(),
                races: record.races(),
                tier: entry.key.tier,
                week: entry.key.week,
                teams: teams.clone(),
                section: entry.key.phase.section_label(),
            };
            let duration = record.duration_ms;
            self.global.durations.record(duration, &info);
            if let Some(bucket) = self.matchups.get_mut(&matchup) {
                bucket.durations.record(duration, &info);
            }
            tier.durations.record(duration, &info);
            map.durations.record(duration, &info);
            for alias in [teams.0, teams.1] {
                self.teams
                    .entry(alias.clone())
                    .or_insert_with(|| TeamBucket::new(&alias, &alias))
                    .durations
                    .record(duration, &info);
            }
            tier.game_types.add(&record.game_type);
        }

        if let Some(bucket) = self.races.get_mut(&race_a) {
            bucket.add_game_vs(race_b);
        }
        if let Some(bucket) = self.races.get_mut(&race_b) {
            bucket.add_game_vs(race_a);
        }

        if let Some(bucket) = self.matchups.get_mut(&matchup) {
            bucket.games_played += 1;
            if !is_mirror {
                if active_race_won == Some(true) {
                    bucket.games_won += 1;
                } else {
                    bucket.games_lost += 1;
                }
            }
        }
        if !is_mirror {
            if let Some(bucket) = self.races.get_mut(&winner.race) {
                bucket.played_vs_other += 1;
                bucket.won_vs_other += 1;
            }
            if let Some(bucket) = self.races.get_mut(&loser.race) {
                bucket.played_vs_other += 1;
                bucket.lost_vs_other += 1;
            }
            if active_race_won == Some(true) {
                self.status.active_race_won += 1;
            } else {
                self.status.passive_race_won += 1;
            }
        }

        map.games_played += 1;
        map.matchups.record(matchup, active_race_won);
        tier.games_played += 1;
        tier.matchups.record(matchup, active_race_won);
    }

    /// Counts played and cast groups of the regular season.
    pub fn add_cast_coverage(&mut self, weeks: &[WeekGroups], season: &SeasonRecord) {
        for week in weeks.iter().filter(|week| week.phase == Phase::Regular) {
            for matchup in &week.matchups {
                for tier in &matchup.tiers {
                    let was_cast = tier.cast_status.was_cast;
                    self.global.add_group(week.week, tier.tier, was_cast);
                    for name in [&matchup.teams.0, &matchup.teams.1] {
                        let alias = Self::team_alias(season, name);
                        self.teams
                            .entry(alias.clone())
                            .or_insert_with(|| TeamBucket::new(&alias, name))
                            .cast
                            .add(was_cast);
                    }
                }
            }
        }
    }

    /// Every count of known-winner games must agree across the matchup, race and map buckets.
    pub fn reconcile(&self) -> Result<()> {
        let matchups: u64 = self.matchups.values().map(|bucket| bucket.games_played).sum();
        let race_sides: u64 = self
            .races
            .values()
            .flat_map(|bucket| bucket.games_vs.values())
            .sum();
        let races = race_sides / 2;
        let known = self.status.known_winner;
        let maps: u64 = self.maps.values().map(|bucket| bucket.games_played).sum();
        if race_sides % 2 != 0 || matchups != races || races != known || known != maps {
            return Err(StatsError::Reconciliation {
                matchups,
                races,
                known,
                maps,
            });
        }
        Ok(())
    }
}

/// Builds the full statistics tree of a season.
pub fn extract_team_stats<P: ReplayParser>(
    season: &SeasonRecord,
    misc: &SeasonMiscData,
    weeks: &[WeekGroups],
    replays: &[ReplayEntry],
    results: &SeasonResults,
    index: &mut ReplayIndex<P>,
    options: &StatsOptions,
) -> Result<StatsTree> {
    let mut acc = StatsAccumulator::new(season, options.clone());
    for entry in replays {
        acc.add_replay(entry, season);
    }
    acc.add_cast_coverage(weeks, season);
    acc.reconcile()?;
    tracing::info!(
        "counted {} replays ({} with an unknown winner)",
        acc.status.known_winner,
        acc.status.unknown_winner
    );

    let (regular_totals, regular_weeks) = phase_totals(&results.regular, Phase::Regular)?;
    let regular = standings(&regular_totals, regular_weeks, season, options.use_real_matches, Phase::Regular);
    let (playoffs_totals, playoffs_weeks) = phase_totals(&results.playoffs, Phase::Playoffs)?;
    let playoffs = standings(&playoffs_totals, playoffs_weeks, season, options.use_real_matches, Phase::Playoffs);

    let mut per_team = Vec::with_capacity(acc.teams.len());
    for bucket in acc.teams.values() {
        let team = season.team_by_name(&bucket.name).cloned().unwrap_or_else(|| Team {
            name: bucket.name.clone(),
            title_aliases: vec![bucket.alias.clone()],
            tl_logo_image: None,
            use_alias_in_results: false,
        });
        let rates = team_win_rates(&team, results, season, index)?;
        per_team.push(TeamStats {
            alias: bucket.alias.clone(),
            team_name: bucket.name.clone(),
            stats_regular: regular.iter().find(|s| s.name == bucket.name).cloned(),
            stats_playoffs: playoffs.iter().find(|s| s.name == bucket.name).cloned(),
            game_durations: bucket.durations.finish(),
            match_wins: rates.match_wins(),
            most_improved_players: misc
                .teams
                .get(&bucket.alias)
                .map(|data| data.most_improved_players.clone())
                .unwrap_or_default(),
            win_rates: rates.permutation_rates(),
            cast_rate: bucket.cast.finish(),
        });
    }
    per_team.sort_by_key(|team| {
        (
            team.stats_regular.as_ref().map_or(usize::MAX, |s| s.n),
            team.alias.clone(),
        )
    });

    Ok(StatsTree {
        season: season.season_number,
        generated_at: None,
        general: acc.global.finish(acc.total_replays),
        per_tier: acc.tiers.iter().map(|(tier, bucket)| (*tier, bucket.finish())).collect(),
        per_team,
        per_map: acc.maps.values().map(|bucket| bucket.finish(&acc.matchups)).collect(),
        per_matchup: acc
            .matchups
            .values()
            .map(|bucket| (bucket.matchup.label(), bucket.finish()))
            .collect(),
        per_race: acc.races.iter().map(|(race, bucket)| (*race, bucket.finish())).collect(),
        match_status: acc.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GroupKey;
    use crate::replay::{TeamMatchupGroup, TierGroup};
    use crate::replay_cache::ReplayCache;
    use crate::testing::{duel, MockParser};

    fn season() -> SeasonRecord {
        serde_json::from_value(serde_json::json!({
            "seasonNumber": 8,
            "teams": [
                {"name": "Alpha", "titleAliases": ["ALP"]},
                {"name": "Beta", "titleAliases": ["BET"]}
            ]
        }))
        .unwrap()
    }

    fn entry(file: &str, tier: u32, record: ReplayRecord) -> ReplayEntry {
        ReplayEntry {
            key: GroupKey {
                season: 8,
                phase: Phase::Regular,
                week: 1,
                teams: ("Alpha".to_string(), "Beta".to_string()),
                tier,
                players: ("PlayerA".to_string(), "PlayerB".to_string()),
            },
            file: file.to_string(),
            record,
        }
    }

    fn sample_replays() -> Vec<ReplayEntry> {
        let mut on_eclipse = duel(Race::Protoss, Race::Protoss, 1, 9_000);
        on_eclipse.map_name = "Bombasticlipse".to_string();
        vec![
            entry("g1.rep", 1, duel(Race::Terran, Race::Zerg, 1, 10_000)),
            entry("g2.rep", 1, duel(Race::Zerg, Race::Terran, 1, 20_000)),
            entry("g3.rep", 2, duel(Race::Protoss, Race::Zerg, 2, 15_000)),
            entry("g4.rep", 2, on_eclipse),
            entry("g5.rep", 2, duel(Race::Terran, Race::Protoss, 0, 30_000)),
        ]
    }

    #[test]
    fn test_counts_reconcile() {
        let season = season();
        let mut acc = StatsAccumulator::new(&season, StatsOptions::default());
        for replay in sample_replays() {
            acc.add_replay(&replay, &season);
        }
        acc.reconcile().unwrap();
        let status = acc.status();
        assert_eq!(status.known_winner, 4);
        assert_eq!(status.unknown_winner, 1);
        // T beats Z and Z beats P are active wins, Z beating T is not.
        assert_eq!(status.active_race_won, 2);
        assert_eq!(status.passive_race_won, 1);

        let tvz = &acc.matchups[&Matchup::of(Race::Terran, Race::Zerg)];
        assert_eq!((tvz.games_played, tvz.games_won, tvz.games_lost), (2, 1, 1));
        let zvp = &acc.matchups[&Matchup::of(Race::Zerg, Race::Protoss)];
        assert_eq!((zvp.games_played, zvp.games_won), (1, 1));
        assert_eq!(acc.maps["Eclipse"].games_played, 1);
        assert_eq!(acc.maps["Polypoid"].games_played, 3);
        assert_eq!(acc.races[&Race::Protoss].games_vs(Race::Protoss), 2);
        assert_eq!(acc.tiers[&2].matchups.get(Matchup::of(Race::Protoss, Race::Protoss)).won, 0);
    }

    #[test]
    fn test_reconciliation_mismatch_is_fatal() {
        let season = season();
        let mut acc = StatsAccumulator::new(&season, StatsOptions::default());
        for replay in sample_replays() {
            acc.add_replay(&replay, &season);
        }
        if let Some(map) = acc.maps.get_mut("Polypoid") {
            map.games_played += 1;
        }
        match acc.reconcile() {
            Err(StatsError::Reconciliation { maps, known, .. }) => {
                assert_eq!(maps, 5);
                assert_eq!(known, 4);
            }
            other => panic!("expected a reconciliation error, got {other:?}"),
        }
    }

    #[test]
    fn test_excluded_frames_skip_durations_only() {
        let season = season();
        let options = StatsOptions::default();
        let mut acc = StatsAccumulator::new(&season, options);
        acc.add_replay(&entry("g1.rep", 1, duel(Race::Terran, Race::Zerg, 1, 10_000)), &season);
        acc.add_replay(&entry("short.rep", 1, duel(Race::Terran, Race::Zerg, 1, 644)), &season);
        acc.add_replay(&entry("short2.rep", 1, duel(Race::Zerg, Race::Zerg, 2, 1032)), &season);

        assert_eq!(acc.global.game_types.total(), 3);
        assert_eq!(acc.tiers[&1].game_types.total(), 1);
        assert_eq!(acc.global.durations.count(), 1);
        assert_eq!(acc.global.durations.finish().shortest.map(|g| g.duration_ms), Some(420_000));
        assert_eq!(acc.tiers[&1].durations.count(), 1);
        assert_eq!(acc.maps["Polypoid"].durations.count(), 1);
        assert_eq!(acc.teams["ALP"].durations.count(), 1);
        assert_eq!(acc.matchups[&Matchup::of(Race::Terran, Race::Zerg)].durations.count(), 1);
        assert_eq!(acc.matchups[&Matchup::of(Race::Zerg, Race::Zerg)].durations.count(), 0);
        assert_eq!(acc.tiers[&1].games_played, 3);
        acc.reconcile().unwrap();
    }

    #[test]
    fn test_extract_team_stats() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReplayCache::open(dir.path().join("replays.json")).unwrap();
        let mut index = ReplayIndex::new(dir.path().join("replays"), cache, MockParser::default());
        let season = season();
        let mut misc = SeasonMiscData::default();
        misc.teams.insert(
            "ALP".to_string(),
            TeamMiscData {
                most_improved_players: vec!["PlayerA".to_string()],
            },
        );
        let key = |tier| GroupKey {
            season: 8,
            phase: Phase::Regular,
            week: 1,
            teams: ("Alpha".to_string(), "Beta".to_string()),
            tier,
            players: ("PlayerA".to_string(), "PlayerB".to_string()),
        };
        let tier_group = |tier, was_cast| TierGroup {
            tier,
            duration_ms: 0,
            matchup_counts: BTreeMap::new(),
            cast_status: CastGroupStatus {
                was_cast,
                vods: Vec::new(),
            },
            pairings: Vec::new(),
        };
        let weeks = vec![WeekGroups {
            phase: Phase::Regular,
            week: 1,
            matchups: vec![TeamMatchupGroup {
                teams: ("Alpha".to_string(), "Beta".to_string()),
                tiers: vec![tier_group(1, true), tier_group(2, false)],
            }],
        }];
        let mut results = SeasonResults::default();
        results.regular.insert(
            1,
            vec![MatchResultRecord {
                team1: "Alpha".to_string(),
                team2: "Beta".to_string(),
                matches: vec![Match {
                    player1: MatchPlayer {
                        name: "PlayerA".to_string(),
                        race: "Terran".to_string(),
                        score: 2,
                        tier: Some(1),
                    },
                    player2: MatchPlayer {
                        name: "PlayerB".to_string(),
                        race: "Zerg".to_string(),
                        score: 0,
                        tier: Some(1),
                    },
                    walkover: false,
                    inactive_players: Vec::new(),
                }],
            }],
        );
        let replays = vec![
            ReplayEntry {
                key: key(1),
                file: "g1.rep".to_string(),
                record: duel(Race::Terran, Race::Zerg, 1, 10_000),
            },
            ReplayEntry {
                key: key(1),
                file: "g2.rep".to_string(),
                record: duel(Race::Terran, Race::Zerg, 1, 12_000),
            },
        ];

        let tree = extract_team_stats(&season, &misc, &weeks, &replays, &results, &mut index, &StatsOptions::default())
            .unwrap();
        assert_eq!(tree.season, 8);
        assert_eq!(tree.general.cast_rate.totals.played, 2);
        assert_eq!(tree.general.cast_rate.totals.percentage.as_deref(), Some("50.00%"));
        assert_eq!(tree.general.game_types.total, Some(2));
        assert_eq!(tree.per_matchup["TvZ"].win_rate.as_deref(), Some("100.00%"));
        assert_eq!(tree.per_matchup["ZvZ"].win_rate, None);
        assert_eq!(tree.per_tier[&1].win_rates["TvZ"].played, 2);
        assert_eq!(tree.per_race[&Race::Terran].win_rate.as_deref(), Some("100.00%"));
        assert_eq!(tree.map("Polypoid").unwrap().win_rates["TvZ"].relative_rate.as_deref(), Some("+0.00%"));

        let alpha = tree.team("ALP").unwrap();
        assert_eq!(tree.per_team[0].alias, "ALP");
        assert_eq!(alpha.team_name, "Alpha");
        assert_eq!(alpha.stats_regular.as_ref().map(|s| s.n), Some(1));
        assert_eq!(alpha.match_wins.matches.won, 1);
        assert_eq!(alpha.match_wins.sets.percentage.as_deref(), Some("100.00%"));
        assert_eq!(alpha.win_rates["TvZ"].won, 1);
        assert_eq!(alpha.most_improved_players, vec!["PlayerA".to_string()]);
        assert_eq!(alpha.cast_rate.cast, 1);
        assert_eq!(alpha.game_durations.longest.as_ref().map(|g| g.info.file.as_str()), Some("g2.rep"));
        assert_eq!(tree.team("BET").unwrap().match_wins.matches.won, 0);
        assert_eq!(index.parser().calls(), 0);
    }
}
