use crate::error::{Result, StatsError};
use crate::types::ReplayRecord;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Parsed replay info keyed by the replay's path relative to the replay root.
///
/// `None` entries memoize files the parser rejected as "not a replay". The file is
/// read lazily on first access and written back by [`ReplayCache::flush`]. While a cache
/// is open it holds a lock file next to the cache so two runs cannot clobber each other.
#[derive(Debug)]
pub struct ReplayCache {
    path: PathBuf,
    lock_path: PathBuf,
    entries: Option<BTreeMap<String, Option<ReplayRecord>>>,
    dirty: bool,
}

impl ReplayCache {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StatsError::io("create cache dir", parent, e))?;
        }
        let lock_path = lock_path_for(&path);
        match File::options().write(true).create_new(true).open(&lock_path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StatsError::CacheLocked { path });
            }
            Err(e) => return Err(StatsError::io("create cache lock", &lock_path, e)),
        }
        Ok(Self {
            path,
            lock_path,
            entries: None,
            dirty: false,
        })
    }

    fn entries(&mut self) -> Result<&mut BTreeMap<String, Option<ReplayRecord>>> {
        if self.entries.is_none() {
            let loaded = load_entries(&self.path)?;
            tracing::debug!("loaded {} replay cache entries from {}", loaded.len(), self.path.display());
            self.entries = Some(loaded);
        }
        Ok(self.entries.get_or_insert_with(BTreeMap::new))
    }

    /// Outer `None` is a miss; `Some(None)` is a cached "not a replay" result.
    pub fn get(&mut self, key: &str) -> Result<Option<Option<ReplayRecord>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Stores a new entry. Existing entries are never replaced.
    pub fn insert(&mut self, key: String, record: Option<ReplayRecord>) -> Result<()> {
        let entries = self.entries()?;
        if entries.contains_key(&key) {
            return Ok(());
        }
        entries.insert(key, record);
        self.dirty = true;
        Ok(())
    }

    pub fn len(&mut self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(entries) = self.entries.as_ref() else {
            return Ok(());
        };
        let body = serde_json::to_string(entries).map_err(|e| StatsError::json(&self.path, e))?;
        atomic_write(&self.path, &body)?;
        tracing::info!("wrote {} replay cache entries to {}", entries.len(), self.path.display());
        self.dirty = false;
        Ok(())
    }
}

impl Drop for ReplayCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to write replay cache on shutdown: {e}");
        }
        if let Err(e) = fs::remove_file(&self.lock_path) {
            tracing::warn!("failed to remove cache lock {}: {e}", self.lock_path.display());
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".lock");
    PathBuf::from(raw)
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, Option<ReplayRecord>>> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(StatsError::io("read replay cache", path, e)),
    };
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&data).map_err(|e| StatsError::json(path, e))
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);
    fs::write(&temp_path, content).map_err(|e| StatsError::io("write temp file", &temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| StatsError::io("rename temp file to", path, e))?;
    Ok(())
}
