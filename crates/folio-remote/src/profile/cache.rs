use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

pub const PROFILE_CACHE_KEY: &str = "user_info_cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub hash: String,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Keyed JSON blobs, mirrored to a single file when a path is given.
///
/// A missing or unreadable file starts the cache empty; the file is
/// rewritten in full on every `put`.
#[derive(Debug, Default)]
pub struct ProfileCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
}

impl ProfileCache {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable profile cache");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Stores `entry` in memory first, so a failed write still serves
    /// this process.
    pub fn put(&mut self, entry: CacheEntry) -> std::io::Result<()> {
        self.entries.insert(entry.key.clone(), entry);
        match &self.path {
            Some(path) => save_entries(path, &self.entries),
            None => Ok(()),
        }
    }
}

fn load_entries(path: &Path) -> std::io::Result<BTreeMap<String, CacheEntry>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let bytes = std::fs::read(path)?;
    let entries = serde_json::from_slice::<Vec<CacheEntry>>(&bytes)
        .map_err(|err| std::io::Error::other(format!("parse profile cache: {err}")))?;
    Ok(entries
        .into_iter()
        .map(|entry| (entry.key.clone(), entry))
        .collect())
}

fn save_entries(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let list: Vec<&CacheEntry> = entries.values().collect();
    let encoded = serde_json::to_vec_pretty(&list)
        .map_err(|err| std::io::Error::other(format!("serialize profile cache: {err}")))?;
    std::fs::write(path, encoded)
}
