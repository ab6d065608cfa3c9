//! The persisted TTL store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::key::CacheKey;
use crate::persistence::{self, CacheEntry, FORMAT_VERSION, SessionIndex};
use crate::ttl::TtlPolicy;

const ELIGIBILITY_DIR: &str = "eligibility";
const SESSIONS_FILE: &str = "sessions.json";

/// Disk-backed key/value store with lazy TTL evaluation.
///
/// Eligibility entries live one per file, so concurrent callers working on
/// different keys never touch the same file and racing writers of one key
/// resolve as last-rename-wins. The session index is a single file updated
/// read-modify-write, serialized by an in-process mutex only: two processes
/// recording at the same instant can still lose one record (see
/// [`Store::record_session_timestamp`]).
///
/// The store holds no open handles; it is safe to share behind an `Arc` and
/// needs no teardown.
pub struct Store {
    config: StoreConfig,
    eligibility_dir: PathBuf,
    sessions_path: PathBuf,
    ttl: TtlPolicy,
    retention: TtlPolicy,
    session_lock: Mutex<()>,
}

impl Store {
    /// Open a store at `config.root`, creating the directory layout if absent.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let eligibility_dir = config.root.join(ELIGIBILITY_DIR);
        std::fs::create_dir_all(&eligibility_dir)
            .map_err(|e| StoreError::io(&eligibility_dir, e))?;

        debug!(root = %config.root.display(), ttl_secs = config.ttl.as_secs(), "Opened store");

        Ok(Self {
            sessions_path: config.root.join(SESSIONS_FILE),
            ttl: TtlPolicy::new(config.ttl),
            retention: TtlPolicy::new(config.session_retention),
            eligibility_dir,
            session_lock: Mutex::new(()),
            config,
        })
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.eligibility_dir.join(key.file_name())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Eligibility entries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a fresh payload for `key`.
    ///
    /// Returns `None` when the key was never written, when the entry is older
    /// than the TTL, and when the entry cannot be read. Callers cannot tell
    /// these apart.
    pub fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        self.get_at(key, Utc::now())
    }

    /// [`Store::get`] evaluated at an explicit `now`.
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<serde_json::Value> {
        let path = self.entry_path(key);
        let entry: CacheEntry = match persistence::read_json(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                trace!(key = %key, "Store miss: no entry");
                return None;
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Store miss: unreadable entry");
                return None;
            }
        };

        self.fresh_payload(key, entry, now)
    }

    /// The checks every read applies to a decoded entry: format version,
    /// stored key, then age.
    fn fresh_payload(
        &self,
        key: &CacheKey,
        entry: CacheEntry,
        now: DateTime<Utc>,
    ) -> Option<serde_json::Value> {
        if !entry.is_current_version() {
            debug!(key = %key, version = entry.version, "Store miss: format version mismatch");
            return None;
        }

        if entry.key != key.as_str() {
            debug!(key = %key, stored = %entry.key, "Store miss: key mismatch");
            return None;
        }

        if !self.ttl.is_fresh(entry.written_at, now) {
            trace!(
                key = %key,
                age_secs = self.ttl.age(entry.written_at, now).as_secs(),
                "Store miss: entry expired"
            );
            return None;
        }

        trace!(key = %key, "Store hit");
        Some(entry.payload)
    }

    /// Get and decode a fresh payload. A payload that does not decode as `T`
    /// is treated as a miss.
    pub fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let payload = self.get(key)?;
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key = %key, error = %e, "Store miss: payload did not decode");
                None
            }
        }
    }

    /// Replace the entry for `key`, stamped with the current time.
    ///
    /// The entry is on disk before this returns.
    pub fn set(&self, key: &CacheKey, payload: serde_json::Value) -> Result<()> {
        self.set_at(key, payload, Utc::now())
    }

    /// [`Store::set`] with an explicit write time.
    pub fn set_at(
        &self,
        key: &CacheKey,
        payload: serde_json::Value,
        written_at: DateTime<Utc>,
    ) -> Result<()> {
        let entry = CacheEntry::new(key.as_str(), payload, written_at);
        persistence::write_json_atomic(&self.entry_path(key), &entry)?;
        trace!(key = %key, "Store write");
        Ok(())
    }

    /// Encode `value` and store it under `key`.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }

    /// Remove every eligibility entry. Session timestamps are kept.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
        debug!(removed, "Cleared eligibility cache");
        Ok(removed)
    }

    /// Count entries by freshness.
    pub fn stats(&self) -> Result<StoreStats> {
        self.stats_at(Utc::now())
    }

    /// [`Store::stats`] evaluated at an explicit `now`.
    pub fn stats_at(&self, now: DateTime<Utc>) -> Result<StoreStats> {
        let mut stats = StoreStats {
            ttl_secs: self.ttl.ttl().as_secs(),
            ..StoreStats::default()
        };

        for path in self.entry_files()? {
            stats.entries += 1;
            if self.entry_file_is_fresh(&path, now) {
                stats.fresh += 1;
            } else {
                stats.stale += 1;
            }
        }

        stats.sessions = self.session_timestamps_at(now).len();
        Ok(stats)
    }

    /// Whether a read for the key recorded in `path` would hit. An entry whose
    /// recorded key does not map back to `path` can never be read.
    fn entry_file_is_fresh(&self, path: &Path, now: DateTime<Utc>) -> bool {
        let Ok(Some(entry)) = persistence::read_json::<CacheEntry>(path) else {
            return false;
        };
        let key = CacheKey::from_stored(&entry.key);
        self.entry_path(&key) == path && self.fresh_payload(&key, entry, now).is_some()
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.eligibility_dir;
        let read_dir = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut files = Vec::new();
        for dirent in read_dir {
            let path = dirent.map_err(|e| StoreError::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session timestamps
    // ─────────────────────────────────────────────────────────────────────────

    /// Remember that `session_id` was elevated at `at`.
    ///
    /// Records past the retention horizon are pruned as part of the write.
    ///
    /// The index is re-read under the lock immediately before the atomic
    /// rename, so writers in this process never lose each other's records.
    /// There is no cross-process lock: if another process renames its own
    /// copy between our read and our rename, its record is dropped. A lost
    /// record only degrades that session's remaining time to unknown.
    pub fn record_session_timestamp(&self, session_id: &str, at: DateTime<Utc>) -> Result<()> {
        let _guard = self.session_lock.lock();
        let now = Utc::now();

        let mut index = self.load_session_index();
        index.version = FORMAT_VERSION;
        index
            .sessions
            .retain(|_, ts| self.retention.is_fresh(*ts, now));
        index.sessions.insert(session_id.to_string(), at);

        persistence::write_json_atomic(&self.sessions_path, &index)?;
        debug!(session_id = %session_id, tracked = index.sessions.len(), "Recorded session timestamp");
        Ok(())
    }

    /// Elevation times for every session still within retention.
    pub fn session_timestamps(&self) -> HashMap<String, DateTime<Utc>> {
        self.session_timestamps_at(Utc::now())
    }

    /// [`Store::session_timestamps`] evaluated at an explicit `now`.
    pub fn session_timestamps_at(&self, now: DateTime<Utc>) -> HashMap<String, DateTime<Utc>> {
        self.load_session_index()
            .sessions
            .into_iter()
            .filter(|(_, ts)| self.retention.is_fresh(*ts, now))
            .collect()
    }

    fn load_session_index(&self) -> SessionIndex {
        match persistence::read_json::<SessionIndex>(&self.sessions_path) {
            Ok(Some(index)) if index.version == FORMAT_VERSION => index,
            Ok(Some(index)) => {
                debug!(version = index.version, "Ignoring session index with unknown version");
                SessionIndex::new()
            }
            Ok(None) => SessionIndex::new(),
            Err(e) => {
                warn!(error = %e, "Session index unreadable, starting fresh");
                SessionIndex::new()
            }
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Eligibility entry files on disk.
    pub entries: usize,

    /// Entries a read would return.
    pub fresh: usize,

    /// Entries a read would treat as missing.
    pub stale: usize,

    /// Session timestamps within retention.
    pub sessions: usize,

    /// TTL the freshness counts were evaluated against.
    pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn open(tmp: &TempDir, ttl: Duration) -> Store {
        Store::open(StoreConfig::new(tmp.path()).with_ttl(ttl)).unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(60));
        let key = CacheKey::eligibility("aws");

        store.set(&key, json!({"targets": ["a"]})).unwrap();

        assert_eq!(store.get(&key), Some(json!({"targets": ["a"]})));
    }

    #[test]
    fn test_get_never_written() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(60));
        assert!(store.get(&CacheKey::eligibility("gcp")).is_none());
    }

    #[test]
    fn test_four_hour_ttl_scenario() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(4 * 3600));
        let key = CacheKey::eligibility("azure");

        store.set_at(&key, json!(["payload"]), t0()).unwrap();

        assert_eq!(
            store.get_at(&key, t0() + chrono::Duration::hours(1)),
            Some(json!(["payload"]))
        );
        assert!(store.get_at(&key, t0() + chrono::Duration::hours(5)).is_none());
    }

    #[test]
    fn test_set_overwrites_and_restamps() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let key = CacheKey::eligibility("aws");

        store.set_at(&key, json!("old"), t0()).unwrap();
        store
            .set_at(&key, json!("new"), t0() + chrono::Duration::minutes(50))
            .unwrap();

        // The old stamp would have expired by now, the new one has not.
        let later = t0() + chrono::Duration::minutes(70);
        assert_eq!(store.get_at(&key, later), Some(json!("new")));
    }

    #[test]
    fn test_entries_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let key = CacheKey::groups("azure");
        {
            let store = open(&tmp, Duration::from_secs(3600));
            store.set_json(&key, &vec!["grp-1", "grp-2"]).unwrap();
        }

        let reopened = open(&tmp, Duration::from_secs(3600));
        let groups: Vec<String> = reopened.get_json(&key).unwrap();
        assert_eq!(groups, vec!["grp-1", "grp-2"]);
    }

    #[test]
    fn test_reader_ttl_governs_freshness() {
        let tmp = TempDir::new().unwrap();
        let key = CacheKey::eligibility("aws");
        let written = t0();
        let now = t0() + chrono::Duration::minutes(30);

        open(&tmp, Duration::from_secs(4 * 3600))
            .set_at(&key, json!(1), written)
            .unwrap();

        assert!(open(&tmp, Duration::from_secs(3600)).get_at(&key, now).is_some());
        assert!(open(&tmp, Duration::from_secs(600)).get_at(&key, now).is_none());
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let key = CacheKey::eligibility("aws");

        std::fs::write(store.entry_path(&key), b"{not json").unwrap();
        assert!(store.get(&key).is_none());

        // A later write repairs it.
        store.set(&key, json!(true)).unwrap();
        assert_eq!(store.get(&key), Some(json!(true)));
    }

    #[test]
    fn test_other_version_is_miss() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let key = CacheKey::eligibility("aws");

        let mut entry = CacheEntry::new(key.as_str(), json!(1), Utc::now());
        entry.version = FORMAT_VERSION + 1;
        persistence::write_json_atomic(&store.entry_path(&key), &entry).unwrap();

        assert!(store.get(&key).is_none());
    }

    #[test]
    fn test_get_json_wrong_shape_is_miss() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let key = CacheKey::eligibility("aws");

        store.set(&key, json!({"not": "a list"})).unwrap();
        let decoded: Option<Vec<String>> = store.get_json(&key);
        assert!(decoded.is_none());
    }

    #[test]
    fn test_clear_keeps_sessions() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));

        store.set(&CacheKey::eligibility("aws"), json!(1)).unwrap();
        store.set(&CacheKey::groups("azure"), json!(2)).unwrap();
        store.record_session_timestamp("sess-1", Utc::now()).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.get(&CacheKey::eligibility("aws")).is_none());
        assert!(store.session_timestamps().contains_key("sess-1"));
    }

    #[test]
    fn test_stats() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let now = Utc::now();

        store
            .set_at(&CacheKey::eligibility("aws"), json!(1), now)
            .unwrap();
        store
            .set_at(
                &CacheKey::eligibility("gcp"),
                json!(1),
                now - chrono::Duration::hours(2),
            )
            .unwrap();

        let stats = store.stats_at(now).unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.fresh, 1);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.ttl_secs, 3600);
    }

    #[test]
    fn test_stats_key_mismatch_is_stale() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let key = CacheKey::eligibility("aws");
        let now = Utc::now();

        let entry = CacheEntry::new("elig:gcp", json!(1), now);
        persistence::write_json_atomic(&store.entry_path(&key), &entry).unwrap();

        assert!(store.get_at(&key, now).is_none());
        let stats = store.stats_at(now).unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.fresh, 0);
        assert_eq!(stats.stale, 1);
    }

    #[test]
    fn test_stats_other_version_is_stale() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(3600));
        let key = CacheKey::groups("azure");
        let now = Utc::now();

        let mut entry = CacheEntry::new(key.as_str(), json!(1), now);
        entry.version = FORMAT_VERSION + 1;
        persistence::write_json_atomic(&store.entry_path(&key), &entry).unwrap();

        let stats = store.stats_at(now).unwrap();
        assert_eq!((stats.fresh, stats.stale), (0, 1));
    }

    #[test]
    fn test_separate_handles_keep_each_others_sessions() {
        let tmp = TempDir::new().unwrap();
        let first = open(&tmp, Duration::from_secs(60));
        let second = open(&tmp, Duration::from_secs(60));
        let at = Utc::now();

        first.record_session_timestamp("sess-1", at).unwrap();
        second.record_session_timestamp("sess-2", at).unwrap();
        first.record_session_timestamp("sess-3", at).unwrap();

        let stamps = second.session_timestamps();
        assert_eq!(stamps.len(), 3);
        assert!(stamps.contains_key("sess-2"));
    }

    #[test]
    fn test_session_timestamps_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(60));
        let at = Utc::now();

        store.record_session_timestamp("sess-1", at).unwrap();
        store.record_session_timestamp("sess-2", at).unwrap();

        let stamps = store.session_timestamps();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps["sess-1"], at);
    }

    #[test]
    fn test_session_retention_independent_of_ttl() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(
            StoreConfig::new(tmp.path())
                .with_ttl(Duration::from_secs(60))
                .with_session_retention(Duration::from_secs(24 * 3600)),
        )
        .unwrap();
        let at = Utc::now();
        store.record_session_timestamp("sess-1", at).unwrap();

        // Well past the eligibility TTL, still within retention.
        let stamps = store.session_timestamps_at(at + chrono::Duration::hours(3));
        assert!(stamps.contains_key("sess-1"));

        let stamps = store.session_timestamps_at(at + chrono::Duration::hours(25));
        assert!(stamps.is_empty());
    }

    #[test]
    fn test_record_prunes_expired_sessions() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp, Duration::from_secs(60));

        store
            .record_session_timestamp("ancient", Utc::now() - chrono::Duration::days(3))
            .unwrap();
        store.record_session_timestamp("recent", Utc::now()).unwrap();

        let index = store.load_session_index();
        assert!(!index.sessions.contains_key("ancient"));
        assert!(index.sessions.contains_key("recent"));
    }

    #[test]
    fn test_concurrent_writers() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(open(&tmp, Duration::from_secs(3600)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    // Half race on a shared key, half write their own.
                    let shared = CacheKey::eligibility("azure");
                    let own = CacheKey::eligibility(&format!("scope-{i}"));
                    for n in 0..10 {
                        store.set(&shared, json!({"writer": i, "n": n})).unwrap();
                        store.set(&own, json!(i)).unwrap();
                        store
                            .record_session_timestamp(&format!("sess-{i}"), Utc::now())
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let shared = store.get(&CacheKey::eligibility("azure")).unwrap();
        assert_eq!(shared["n"], json!(9));
        for i in 0..8 {
            assert_eq!(
                store.get(&CacheKey::eligibility(&format!("scope-{i}"))),
                Some(json!(i))
            );
        }
        assert_eq!(store.session_timestamps().len(), 8);
    }
}
