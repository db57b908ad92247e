use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("replay parser failed on {}: {message}", path.display())]
    Parser { path: PathBuf, message: String },

    #[error("replay cache {} is locked by another run; remove the lock file if no other run is active", path.display())]
    CacheLocked { path: PathBuf },

    #[error("invalid value for walkover win: 1 \"{player1}\", 2 \"{player2}\", inactive: {inactive:?}")]
    InvalidWalkover {
        player1: String,
        player2: String,
        inactive: Vec<String>,
    },

    #[error("Numbers don't add up: matchups {matchups}, races {races}, known winners {known}, maps {maps}")]
    Reconciliation {
        matchups: u64,
        races: u64,
        known: u64,
        maps: u64,
    },

    #[error("{0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StatsError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StatsError::Json {
            path: path.into(),
            source,
        }
    }
}
