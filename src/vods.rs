use crate::format::{ms_to_duration, DurationFormat};
use crate::types::*;
use serde_json::Value;
use std::collections::BTreeMap;

/// Checks the section-specific predicate: every `meta_match` entry must equal the
/// same field of the VOD's metadata.
fn meta_matches(meta: &VodMeta, section: &SectionMeta) -> bool {
    if section.meta_match.is_empty() {
        return true;
    }
    let Ok(Value::Object(fields)) = serde_json::to_value(meta) else {
        return false;
    };
    section
        .meta_match
        .iter()
        .all(|(key, expected)| fields.get(key) == Some(expected))
}

pub fn vod_matches_group(
    vod: &VodRecord,
    section: &SectionMeta,
    tier: u32,
    week: u32,
    teams: (&str, &str),
    season_number: u32,
) -> bool {
    let meta = &vod.meta;
    meta.team_matchup.iter().any(|team| team == teams.0)
        && meta.team_matchup.iter().any(|team| team == teams.1)
        && meta.season == Some(season_number)
        && meta.tiers.contains(&tier)
        && meta.week == Some(week)
        && meta_matches(meta, section)
}

/// Decides whether a (tier, week, team pair) group of a season was covered by a VOD.
///
/// Team names may be given by full name or alias.
pub fn group_cast_status(
    section: &SectionMeta,
    tier: u32,
    week: u32,
    team_a: &str,
    team_b: &str,
    vods: &[VodRecord],
    season: &SeasonRecord,
) -> CastGroupStatus {
    let teams = (season.full_team_name(team_a), season.full_team_name(team_b));
    let matching: Vec<VodRecord> = vods
        .iter()
        .filter(|vod| vod_matches_group(vod, section, tier, week, teams, season.season_number))
        .cloned()
        .collect();
    CastGroupStatus {
        was_cast: !matching.is_empty(),
        vods: matching,
    }
}

/// VODs covering a numbered group of a week. Preseason videos list the groups they
/// cover as `[week, group]` pairs.
pub fn find_group_vods<'a>(
    vods: &'a [VodRecord],
    group: u32,
    season_number: u32,
    week: u32,
    is_preseason: bool,
) -> Vec<&'a VodRecord> {
    vods.iter()
        .filter(|vod| {
            let meta = &vod.meta;
            meta.is_preseason == is_preseason
                && meta.season == Some(season_number)
                && !meta.is_showmatch
                && !meta.is_hype_video
                && meta.groups.iter().any(|&(w, g)| w == week && g == group)
        })
        .collect()
}

pub fn total_vod_duration_ms(vods: &[VodRecord]) -> u64 {
    vods.iter().map(|vod| vod.length_seconds * 1000).sum()
}

/// Casts and time cast per caster, busiest first.
pub fn caster_stats(vods: &[VodRecord]) -> Vec<CasterStats> {
    let mut casters: BTreeMap<&str, (u32, u64)> = BTreeMap::new();
    for vod in vods {
        for caster in &vod.meta.casters {
            let entry = casters.entry(caster.as_str()).or_default();
            entry.0 += 1;
            entry.1 += vod.length_seconds * 1000;
        }
    }
    let mut out: Vec<CasterStats> = casters
        .into_iter()
        .map(|(name, (casts, time_cast_ms))| CasterStats {
            name: name.to_string(),
            casts,
            time_cast_ms,
            time_cast: ms_to_duration(time_cast_ms, DurationFormat::SHORT),
            time_cast_in_hours: ms_to_duration(time_cast_ms, DurationFormat::HOURS),
        })
        .collect();
    out.sort_by(|a, b| {
        b.time_cast_ms
            .cmp(&a.time_cast_ms)
            .then_with(|| b.casts.cmp(&a.casts))
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}
