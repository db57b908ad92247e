pub mod types;
pub mod config;
pub mod error;
pub mod format;
pub mod race;
pub mod layout;
pub mod replay_cache;
pub mod replay;
pub mod vods;
pub mod results;
pub mod trackers;
pub mod report;
pub mod buckets;
pub mod team_rates;
pub mod stats;
#[cfg(test)]
mod testing;

use config::*;
use error::{Result, StatsError};
use replay::{casting_groups_overview, flatten_replays, ReplayIndex, ScrepParser};
use replay_cache::ReplayCache;
use report::vod_summary;
use results::ResultRepository;
use stats::extract_team_stats;
use types::*;

use std::{fs, io::Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    load_env_file();

    // Initialize tracing with daily rolling file output
    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = load_config_inner()?;
    info!("CPL stats starting for season {}", config.season);
    log_config_warnings(&config);

    let repo = ResultRepository::new(SeasonPaths::from_config(&config));
    let season = repo.season_data()?;
    let misc = repo.misc_data()?;
    let vods = repo.vods()?;
    let results = repo.season_results()?;
    info!(
        "loaded {} teams, {} regular and {} playoffs result weeks, {} VODs",
        season.teams.len(),
        results.regular.len(),
        results.playoffs.len(),
        vods.len()
    );

    let cache = ReplayCache::open(repo.paths().replay_cache())?;
    let mut index = ReplayIndex::new(repo.paths().replays(), cache, ScrepParser::from_config(&config));
    let weeks = index.scan_season(&season, &vods)?;
    let replays = flatten_replays(&weeks);
    info!("indexed {} replays", replays.len());
    tracing::debug!("uncast groups:\n{}", casting_groups_overview(&weeks, &season, true));

    let options = StatsOptions::from_config(&config);
    let mut tree = extract_team_stats(&season, &misc, &weeks, &replays, &results, &mut index, &options)?;
    tree.general.vods = Some(vod_summary(&vods));
    tree.generated_at = Some(chrono::Local::now().to_rfc3339());
    index.flush()?;

    if config.output_path.trim().is_empty() {
        let json = tree.to_json_pretty()?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}").map_err(|e| StatsError::Data(format!("write stats to stdout: {e}")))?;
    } else {
        let path = resolve_repo_path(&config.output_path);
        tree.write_json(&path)?;
        info!("wrote stats to {}", path.display());
    }
    Ok(())
}
