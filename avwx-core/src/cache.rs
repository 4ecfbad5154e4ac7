//! Date-scoped memoization of airport lookups.
//!
//! Every lookup (exact resolve or fuzzy search) is recorded under its
//! normalized query. The cache lives for one calendar day in local time:
//! on the first touch of a new day the whole thing is discarded and the
//! caller gets to print a reset notice, once.

use std::{collections::BTreeMap, path::{Path, PathBuf}};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{error::Result, store};

/// One remembered lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub codes: Vec<String>,
    pub searched_at: DateTime<Local>,
    pub query: String,
}

/// The whole cache file: a `last_active_date` marker plus the entries
/// keyed by normalized query.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchCache {
    pub last_active_date: NaiveDate,
    #[serde(flatten)]
    entries: BTreeMap<String, CacheEntry>,
    #[serde(skip)]
    path: PathBuf,
}

impl SearchCache {
    pub fn new(path: PathBuf, today: NaiveDate) -> Self {
        SearchCache { last_active_date: today, entries: BTreeMap::new(), path }
    }

    /// Load the cache file, or start an empty cache dated today when the
    /// file does not exist yet.
    pub fn load(path: &Path, today: NaiveDate) -> Result<Self> {
        match store::read_json::<SearchCache>(path)? {
            Some(mut cache) => {
                cache.path = path.to_path_buf();
                Ok(cache)
            }
            None => Ok(SearchCache::new(path.to_path_buf(), today)),
        }
    }

    /// Clear everything if the stored date is not `today`. Returns
    /// whether a reset happened so the caller can print the notice
    /// exactly once per invocation.
    pub fn maybe_reset(&mut self, today: NaiveDate) -> bool {
        if self.last_active_date == today {
            return false;
        }
        tracing::debug!(
            "search cache reset: {} -> {} ({} entries dropped)",
            self.last_active_date,
            today,
            self.entries.len()
        );
        self.entries.clear();
        self.last_active_date = today;
        true
    }

    pub fn get(&self, query: &str) -> Option<&CacheEntry> {
        self.entries.get(&normalize_query(query))
    }

    /// Record a lookup. Append-only within a day; an existing entry for
    /// the same query is refreshed in place.
    pub fn put(&mut self, query: &str, codes: Vec<String>, now: DateTime<Local>) {
        let key = normalize_query(query);
        if key.is_empty() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry { codes, searched_at: now, query: query.trim().to_string() },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(format!("failed to serialize search cache: {e}")))?;
        store::write_atomic(&self.path, &json)
    }
}

/// Queries are cached case-insensitively with surrounding space removed.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn put_then_get_normalizes_the_query() {
        let dir = TempDir::new().unwrap();
        let mut cache = SearchCache::new(dir.path().join("c.json"), day(2026, 8, 5));
        cache.put("  Kennedy ", vec!["KJFK".to_string()], at(2026, 8, 5));
        let entry = cache.get("kennedy").unwrap();
        assert_eq!(entry.codes, vec!["KJFK"]);
        assert_eq!(entry.query, "Kennedy");
        assert!(cache.get("laguardia").is_none());
    }

    #[test]
    fn reset_fires_once_per_day_boundary() {
        let dir = TempDir::new().unwrap();
        let mut cache = SearchCache::new(dir.path().join("c.json"), day(2026, 8, 4));
        cache.put("jfk", vec!["KJFK".to_string()], at(2026, 8, 4));

        // Same day: no reset, entry survives.
        assert!(!cache.maybe_reset(day(2026, 8, 4)));
        assert!(cache.get("jfk").is_some());

        // New day: reset exactly once, entries gone.
        assert!(cache.maybe_reset(day(2026, 8, 5)));
        assert!(!cache.maybe_reset(day(2026, 8, 5)));
        assert!(cache.get("jfk").is_none());
        assert_eq!(cache.last_active_date, day(2026, 8, 5));
    }

    #[test]
    fn persists_entries_and_last_active_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_cache.json");
        let mut cache = SearchCache::new(path.clone(), day(2026, 8, 5));
        cache.put("boston", vec!["KBOS".to_string()], at(2026, 8, 5));
        cache.save().unwrap();

        let reloaded = SearchCache::load(&path, day(2026, 8, 6)).unwrap();
        assert_eq!(reloaded.last_active_date, day(2026, 8, 5));
        assert_eq!(reloaded.get("boston").unwrap().codes, vec!["KBOS"]);
    }

    #[test]
    fn file_shape_has_flattened_entries() {
        let dir = TempDir::new().unwrap();
        let mut cache = SearchCache::new(dir.path().join("c.json"), day(2026, 8, 5));
        cache.put("jfk", vec!["KJFK".to_string()], at(2026, 8, 5));
        let json = serde_json::to_value(&cache).unwrap();
        assert!(json.get("last_active_date").is_some());
        // Entries sit at the top level next to the date marker.
        assert!(json.get("jfk").and_then(|e| e.get("codes")).is_some());
    }

    #[test]
    fn empty_queries_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let mut cache = SearchCache::new(dir.path().join("c.json"), day(2026, 8, 5));
        cache.put("   ", vec![], at(2026, 8, 5));
        assert!(cache.is_empty());
    }
}
