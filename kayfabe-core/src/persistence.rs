//! SQLite persistence for engine state.
//!
//! Two tables back the whole engine:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS snapshots (
//!     component  TEXT PRIMARY KEY,
//!     data       TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! CREATE TABLE IF NOT EXISTS story_beats (
//!     seq         INTEGER PRIMARY KEY AUTOINCREMENT,
//!     data        TEXT NOT NULL,
//!     recorded_at TEXT NOT NULL
//! );
//! ```
//!
//! `snapshots` holds one JSON document per engine component (director,
//! ledger, booker), overwritten on every save. `story_beats` is the
//! append-only audit log of storyline beats, unbounded by design.
//! WAL mode keeps reads cheap while the background writer saves; the
//! optional CRC-32 checksum detects save corruption without refusing to
//! load (a corrupt snapshot is worth more than no snapshot).

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::Result;

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

fn crc32_hex(data: &[u8]) -> String {
    let crc = crc32_compute(data);
    format!("{crc:08x}")
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS snapshots (
    component  TEXT PRIMARY KEY,
    data       TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);
CREATE TABLE IF NOT EXISTS story_beats (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    data        TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);";

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// Handle to the open SQLite database holding engine snapshots and the
/// storyline audit log.
pub struct StateStore {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StateStore {
    /// Open (or create) the state database at `path`.
    ///
    /// The schema is created if missing; WAL mode is enabled when
    /// `config.wal_mode` is `true`.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "state store opened"
        );

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database (tests, ephemeral promotions).
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Save (upsert) one component's JSON snapshot.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn save_snapshot(&self, component: &str, json: &str) -> Result<()> {
        let start = Instant::now();
        let checksum = self
            .config
            .checksum_enabled
            .then(|| crc32_hex(json.as_bytes()));
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO snapshots (component, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(component) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![component, json, now, checksum],
        )?;

        debug!(
            component,
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Load one component's JSON snapshot.
    ///
    /// Returns `None` when no snapshot exists. A checksum mismatch is
    /// logged and the data is still returned.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn load_snapshot(&self, component: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT data, checksum FROM snapshots WHERE component = ?1")?;

        let row: Option<(String, Option<String>)> = stmt
            .query_row(params![component], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(ref expected) = stored_checksum {
                let actual = crc32_hex(data.as_bytes());
                if *expected != actual {
                    warn!(
                        component,
                        expected = %expected,
                        actual = %actual,
                        "checksum mismatch on snapshot load"
                    );
                }
            }
        }

        debug!(component, bytes = data.len(), "snapshot loaded");
        Ok(Some(data))
    }

    /// Delete one component's snapshot. Returns `true` if a row existed.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn delete_snapshot(&self, component: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM snapshots WHERE component = ?1", params![component])?;
        Ok(deleted > 0)
    }

    // ------------------------------------------------------------------
    // Story-beat audit log
    // ------------------------------------------------------------------

    /// Append one beat record to the audit log.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn append_beat(&self, json: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO story_beats (data, recorded_at) VALUES (?1, ?2)",
            params![json, now],
        )?;
        Ok(())
    }

    /// The most recent `limit` beat records, oldest first.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn recent_beats(&self, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT data FROM story_beats ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;
        let mut beats = Vec::new();
        for row in rows {
            beats.push(row?);
        }
        beats.reverse();
        Ok(beats)
    }

    /// Total beats in the audit log.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn beat_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM story_beats", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Back up the database to `dest_path` via SQLite's online-backup API.
    /// Safe to call while the database is in use.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;
        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "database backup completed"
        );
        Ok(())
    }

    /// Create a numbered backup next to the database file, keeping at most
    /// `config.backup_count`. A no-op for in-memory databases.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` or `KayfabeError::Io` on failure.
    pub fn create_rotating_backup(&self) -> Result<()> {
        if self.db_path.as_os_str() == ":memory:" {
            return Ok(());
        }
        let max = self.config.backup_count;
        if max == 0 {
            return Ok(());
        }

        // Rotate existing backups, highest first.
        for i in (1..max).rev() {
            let src = self.backup_path(i);
            let dst = self.backup_path(i + 1);
            if src.exists() {
                std::fs::rename(&src, &dst)?;
            }
        }
        let oldest = self.backup_path(max + 1);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        self.backup(self.backup_path(1))?;
        Ok(())
    }

    fn backup_path(&self, n: u32) -> PathBuf {
        let mut p = self.db_path.clone();
        let ext = format!(
            "{}.bak.{n}",
            p.extension()
                .map_or(String::new(), |e| e.to_string_lossy().into_owned())
        );
        p.set_extension(ext);
        p
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file, or `:memory:`.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run SQLite's integrity check; `Ok(false)` means corruption.
    ///
    /// # Errors
    /// Returns `KayfabeError::Database` if the check query itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

/// Extension trait that adds an `.optional()` combinator to `rusqlite::Result`,
/// converting `Err(QueryReturnedNoRows)` into `Ok(None)`.
trait OptionalExt<T> {
    /// Convert `QueryReturnedNoRows` into `Ok(None)`.
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PersistenceConfig {
        PersistenceConfig {
            checksum_enabled: true,
            ..PersistenceConfig::default()
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        store
            .save_snapshot("director", r#"{"message_count":7}"#)
            .expect("save");
        let loaded = store.load_snapshot("director").expect("load").expect("Some");
        assert_eq!(loaded, r#"{"message_count":7}"#);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        assert!(store.load_snapshot("booker").expect("load").is_none());
    }

    #[test]
    fn snapshot_upsert_overwrites() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        store.save_snapshot("ledger", "{\"v\":1}").expect("save 1");
        store.save_snapshot("ledger", "{\"v\":2}").expect("save 2");
        let loaded = store.load_snapshot("ledger").expect("load").expect("Some");
        assert_eq!(loaded, "{\"v\":2}");
    }

    #[test]
    fn delete_snapshot_reports_presence() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        store.save_snapshot("director", "{}").expect("save");
        assert!(store.delete_snapshot("director").expect("delete"));
        assert!(!store.delete_snapshot("director").expect("delete again"));
    }

    #[test]
    fn beats_append_in_order() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        for i in 0..5 {
            store
                .append_beat(&format!("{{\"beat\":\"trash-talk\",\"n\":{i}}}"))
                .expect("append");
        }
        assert_eq!(store.beat_count().expect("count"), 5);

        let last_three = store.recent_beats(3).expect("recent");
        assert_eq!(last_three.len(), 3);
        assert!(last_three[0].contains("\"n\":2"));
        assert!(last_three[2].contains("\"n\":4"));
    }

    #[test]
    fn corrupted_checksum_still_loads() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        store.save_snapshot("director", "{\"ok\":true}").expect("save");
        store
            .conn
            .execute(
                "UPDATE snapshots SET checksum = 'deadbeef' WHERE component = 'director'",
                [],
            )
            .expect("corrupt checksum");

        // The mismatch is logged, not fatal.
        let loaded = store.load_snapshot("director").expect("load").expect("Some");
        assert_eq!(loaded, "{\"ok\":true}");
    }

    #[test]
    fn file_store_backs_up_and_reopens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("kayfabe.db");
        let config = test_config();

        let store = StateStore::open(&db_path, &config).expect("open");
        store.save_snapshot("booker", "{\"events\":[]}").expect("save");
        store.append_beat("{\"beat\":\"promo-hype\"}").expect("append");

        let backup_path = dir.path().join("kayfabe_backup.db");
        store.backup(&backup_path).expect("backup");

        let restored = StateStore::open(&backup_path, &config).expect("open backup");
        assert_eq!(
            restored.load_snapshot("booker").expect("load").expect("Some"),
            "{\"events\":[]}"
        );
        assert_eq!(restored.beat_count().expect("count"), 1);
    }

    #[test]
    fn rotating_backup_keeps_at_most_the_configured_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("promotion.db");
        let mut config = test_config();
        config.backup_count = 2;

        let store = StateStore::open(&db_path, &config).expect("open");
        store.save_snapshot("director", "{}").expect("save");

        store.create_rotating_backup().expect("backup 1");
        store.create_rotating_backup().expect("backup 2");
        store.create_rotating_backup().expect("backup 3");

        assert!(dir.path().join("promotion.db.bak.1").exists());
        assert!(dir.path().join("promotion.db.bak.2").exists());
        assert!(!dir.path().join("promotion.db.bak.3").exists());
    }

    #[test]
    fn integrity_check_passes_on_fresh_database() {
        let store = StateStore::open_in_memory(&test_config()).expect("open");
        assert!(store.integrity_check().expect("check"));
    }

    #[test]
    fn crc32_known_vector() {
        // CRC-32 of "123456789" = 0xCBF43926
        assert_eq!(crc32_compute(b"123456789"), 0xCBF4_3926);
    }
}
