use crate::error::{Result, StatsError};
use crate::types::*;
use std::{
  env,
  fs,
  path::{Path, PathBuf},
};

pub fn repo_root() -> PathBuf {
  if let Some(raw) = env_default("CPL_ROOT") {
    return PathBuf::from(raw);
  }
  env::current_dir().unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn env_flag_true(key: &str) -> bool {
  match env::var(key) {
    Ok(value) => {
      let value = value.trim().to_ascii_lowercase();
      matches!(value.as_str(), "1" | "true" | "yes" | "on")
    }
    Err(_) => false,
  }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if let Some(value) = env_default("CPL_DATA_DIR") {
    config.data_dir = value;
  }
  if let Some(value) = env_default("CPL_SEASON") {
    match value.parse::<u32>() {
      Ok(season) => config.season = season,
      Err(_) => tracing::warn!("ignoring CPL_SEASON={value}: not a season number"),
    }
  }
  if let Some(value) = env_default("SCREP_PATH") {
    config.screp_path = value;
  }
  if let Some(value) = env_default("CPL_OUTPUT") {
    config.output_path = value;
  }
  if env_flag_true("CPL_REAL_MATCHES") {
    config.use_real_matches = true;
  }
  config
}

pub fn parse_config(data: &str, path: &Path) -> Result<AppConfig> {
  serde_json::from_str::<AppConfig>(data).map_err(|e| StatsError::json(path, e))
}

pub fn load_config_inner() -> Result<AppConfig> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| StatsError::io("read config", &path, e))?;
  let config = parse_config(&data, &path)?;
  Ok(apply_env_defaults(config))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

pub fn log_config_warnings(config: &AppConfig) {
  let mut warnings = Vec::new();
  if config.season == 0 {
    warnings.push("no season configured (config.json \"season\" or CPL_SEASON); reading data/s0");
  }
  if config.screp_path.trim().is_empty() {
    warnings.push("SCREP_PATH is empty; uncached replays cannot be parsed");
  }
  if config.output_path.trim().is_empty() {
    warnings.push("no output path configured; stats go to stdout");
  }
  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}

// ── Season data paths ──────────────────────────────────────────────────

/// File locations of one season below the data directory.
#[derive(Debug, Clone)]
pub struct SeasonPaths {
  pub data_dir: PathBuf,
  pub season: u32,
}

impl SeasonPaths {
  pub fn new(data_dir: impl Into<PathBuf>, season: u32) -> Self {
    Self { data_dir: data_dir.into(), season }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(resolve_repo_path(&config.data_dir), config.season)
  }

  pub fn season_base(&self) -> PathBuf {
    self.data_dir.join(format!("s{}", self.season))
  }

  pub fn season_data(&self) -> PathBuf {
    self.season_base().join("static").join("info.json")
  }

  pub fn season_misc_data(&self) -> PathBuf {
    self.season_base().join("static").join("misc.json")
  }

  pub fn week_results(&self, phase: Phase, week: u32) -> PathBuf {
    self
      .season_base()
      .join(format!("{}week{week}_results.json", phase.results_prefix()))
  }

  pub fn vods(&self) -> PathBuf {
    self.season_base().join("vods.json")
  }

  pub fn replays(&self) -> PathBuf {
    self.season_base().join("replays")
  }

  pub fn replay_cache(&self) -> PathBuf {
    self.data_dir.join("cache").join("replays.json")
  }
}
