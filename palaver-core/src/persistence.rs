//! SQLite persistence for a server's dialog state.
//!
//! One database file holds every world on the server:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS worlds (
//!     world_id   TEXT PRIMARY KEY,
//!     name       TEXT NOT NULL,
//!     created_at TEXT NOT NULL
//! );
//! CREATE TABLE IF NOT EXISTS execution_records (
//!     world_id   TEXT NOT NULL,
//!     player_id  TEXT NOT NULL,
//!     action_id  TEXT NOT NULL,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT,
//!     PRIMARY KEY (world_id, player_id, action_id)
//! );
//! CREATE TABLE IF NOT EXISTS dialog_sets (
//!     npc_id     TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! Payloads are JSON inside BLOB columns so the schema survives changes to
//! the record and dialog shapes. A CRC-32 of each payload is stored when
//! checksums are enabled; a mismatch on load is logged, not fatal.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PersistenceConfig;
use crate::dialog::DialogSet;
use crate::error::{PalaverError, Result};
use crate::execution::{ExecutionRecord, ExecutionStore};
use crate::types::{ActionId, NpcId, PlayerId, WorldId};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS worlds (
        world_id   TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS execution_records (
        world_id   TEXT NOT NULL,
        player_id  TEXT NOT NULL,
        action_id  TEXT NOT NULL,
        data       BLOB NOT NULL,
        updated_at TEXT NOT NULL,
        checksum   TEXT,
        PRIMARY KEY (world_id, player_id, action_id)
    );
    CREATE TABLE IF NOT EXISTS dialog_sets (
        npc_id     TEXT PRIMARY KEY,
        data       BLOB NOT NULL,
        updated_at TEXT NOT NULL,
        checksum   TEXT
    );";

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// CRC-32 (ISO 3309 / ITU-T V.42).
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

// ---------------------------------------------------------------------------
// WorldDatabase
// ---------------------------------------------------------------------------

/// Handle to the SQLite database holding worlds, execution history and
/// NPC dialog sets.
///
/// The connection sits behind a lock so one handle can back several
/// [`ExecutionTracker`](crate::ExecutionTracker)s through an `Arc`.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use palaver_core::persistence::WorldDatabase;
/// # use palaver_core::config::PersistenceConfig;
/// # use palaver_core::{ExecutionTracker, WorldId};
/// # use palaver_core::clock::SystemClock;
/// let db = Arc::new(WorldDatabase::open("palaver.db", &PersistenceConfig::default())?);
/// let world = WorldId::new();
/// db.register_world(world, "overworld")?;
/// let tracker = ExecutionTracker::open(world, Box::new(Arc::clone(&db)), Arc::new(SystemClock))?;
/// # Ok::<(), palaver_core::PalaverError>(())
/// ```
pub struct WorldDatabase {
    conn: Mutex<Connection>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for WorldDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldDatabase")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorldDatabase {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
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

        info!(path = %db_path.display(), wal = config.wal_mode, "Palaver database opened");

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn checksum(&self, data: &[u8]) -> Option<String> {
        self.config.checksum_enabled.then(|| crc32_hex(data))
    }

    fn verify(&self, what: &str, key: &str, data: &[u8], stored: Option<&str>) {
        if !self.config.checksum_enabled {
            return;
        }
        if let Some(expected) = stored {
            let actual = crc32_hex(data);
            if expected != actual {
                warn!(
                    kind = what,
                    key,
                    expected,
                    actual = %actual,
                    "Checksum mismatch, possible save corruption"
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Worlds
    // ------------------------------------------------------------------

    /// Register `world` under `name`. Re-registering renames it.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn register_world(&self, world: WorldId, name: &str) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO worlds (world_id, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(world_id) DO UPDATE SET name = excluded.name",
            params![world.to_string(), name, Utc::now().to_rfc3339()],
        )?;
        debug!(world = %world, name, "Registered world");
        Ok(())
    }

    /// Name of a registered world.
    ///
    /// # Errors
    /// Returns [`PalaverError::WorldNotFound`] if `world` was never
    /// registered.
    pub fn world_name(&self, world: WorldId) -> Result<String> {
        self.conn
            .lock()
            .query_row(
                "SELECT name FROM worlds WHERE world_id = ?1",
                params![world.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(PalaverError::WorldNotFound(world))
    }

    /// Every registered world.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn list_worlds(&self) -> Result<Vec<(WorldId, String)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT world_id, name FROM worlds ORDER BY name")?;
        let rows =
            stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut worlds = Vec::new();
        for row in rows {
            let (id, name) = row?;
            match Uuid::parse_str(&id) {
                Ok(uuid) => worlds.push((WorldId(uuid), name)),
                Err(_) => warn!(id = %id, "Skipping world row with invalid UUID"),
            }
        }
        Ok(worlds)
    }

    /// Delete a world and its execution history.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn delete_world(&self, world: WorldId) -> Result<bool> {
        let id = world.to_string();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let records = tx.execute("DELETE FROM execution_records WHERE world_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM worlds WHERE world_id = ?1", params![id])?;
        tx.commit()?;
        info!(world = %world, records, "Deleted world");
        Ok(deleted > 0)
    }

    /// Number of execution records stored for `world`.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn execution_record_count(&self, world: WorldId) -> Result<usize> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM execution_records WHERE world_id = ?1",
            params![world.to_string()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Dialog sets
    // ------------------------------------------------------------------

    /// Save (upsert) the dialog set of `npc`.
    ///
    /// # Errors
    /// Returns [`PalaverError::Serialization`] if JSON encoding fails, or
    /// [`PalaverError::Database`] on SQLite failures.
    pub fn save_dialog_set(&self, npc: NpcId, set: &DialogSet) -> Result<()> {
        let start = Instant::now();
        let json = serde_json::to_vec(set)?;
        let checksum = self.checksum(&json);

        self.conn.lock().execute(
            "INSERT INTO dialog_sets (npc_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(npc_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![npc.to_string(), json, Utc::now().to_rfc3339(), checksum],
        )?;

        debug!(
            npc = %npc,
            dialogs = set.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved dialog set"
        );
        Ok(())
    }

    /// Load the dialog set of `npc`, or `None` if none was saved.
    ///
    /// # Errors
    /// Returns [`PalaverError::Serialization`] if the stored JSON is
    /// malformed, or [`PalaverError::Database`] on SQLite failures.
    pub fn load_dialog_set(&self, npc: NpcId) -> Result<Option<DialogSet>> {
        let key = npc.to_string();
        let row: Option<(Vec<u8>, Option<String>)> = self
            .conn
            .lock()
            .prepare_cached("SELECT data, checksum FROM dialog_sets WHERE npc_id = ?1")?
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored)) = row else {
            return Ok(None);
        };
        self.verify("dialog_set", &key, &data, stored.as_deref());

        let set: DialogSet = serde_json::from_slice(&data)?;
        debug!(npc = %npc, dialogs = set.len(), "Loaded dialog set");
        Ok(Some(set))
    }

    /// Delete the dialog set of `npc`. Returns `true` if one existed.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn delete_dialog_set(&self, npc: NpcId) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM dialog_sets WHERE npc_id = ?1", params![npc.to_string()])?;
        Ok(deleted > 0)
    }

    /// Every NPC with a saved dialog set.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn list_dialog_npcs(&self) -> Result<Vec<NpcId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT npc_id FROM dialog_sets")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut npcs = Vec::new();
        for row in rows {
            let id = row?;
            match Uuid::parse_str(&id) {
                Ok(uuid) => npcs.push(NpcId(uuid)),
                Err(_) => warn!(id = %id, "Skipping dialog row with invalid UUID"),
            }
        }
        Ok(npcs)
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let conn = self.conn.lock();
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Database backup completed"
        );
        Ok(())
    }

    /// Write `<db>.bak.1`, shifting older backups up and keeping at most
    /// `backup_count` of them. A no-op for in-memory databases.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] or [`PalaverError::Io`] on failure.
    pub fn create_rotating_backup(&self) -> Result<()> {
        if self.db_path.as_os_str() == ":memory:" {
            return Ok(());
        }
        let max = self.config.backup_count;
        if max == 0 {
            return Ok(());
        }

        for i in (1..max).rev() {
            let src = self.backup_path(i);
            if src.exists() {
                std::fs::rename(&src, self.backup_path(i + 1))?;
            }
        }
        let oldest = self.backup_path(max + 1);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }

        self.backup(self.backup_path(1))?;
        info!(max_backups = max, "Rotating backup created");
        Ok(())
    }

    /// Path of numbered backup `n`, e.g. `palaver.db.bak.1`.
    fn backup_path(&self, n: u32) -> PathBuf {
        let mut p = self.db_path.clone();
        let ext = format!(
            "{}.bak.{n}",
            p.extension().map_or(String::new(), |e| e.to_string_lossy().into_owned())
        );
        p.set_extension(ext);
        p
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path of the database file, `:memory:` for in-memory databases.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `PRAGMA integrity_check`. `Ok(false)` means corruption.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Reclaim unused space.
    ///
    /// # Errors
    /// Returns [`PalaverError::Database`] on SQLite failures.
    pub fn vacuum(&self) -> Result<()> {
        self.conn.lock().execute_batch("VACUUM;")?;
        Ok(())
    }
}

impl ExecutionStore for WorldDatabase {
    fn load_world(&self, world: WorldId) -> Result<Vec<(PlayerId, ActionId, ExecutionRecord)>> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT player_id, action_id, data, checksum FROM execution_records
             WHERE world_id = ?1",
        )?;
        let rows = stmt.query_map(params![world.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (player, action, data, stored) = row?;
            let (Ok(player), Ok(action)) = (Uuid::parse_str(&player), Uuid::parse_str(&action))
            else {
                warn!(
                    world = %world,
                    player = %player,
                    action = %action,
                    "Skipping execution row with invalid UUID"
                );
                continue;
            };
            let key = format!("{player}/{action}");
            self.verify("execution_record", &key, &data, stored.as_deref());
            let record: ExecutionRecord = serde_json::from_slice(&data)?;
            records.push((PlayerId(player), ActionId(action), record));
        }

        debug!(
            world = %world,
            records = records.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded execution records"
        );
        Ok(records)
    }

    fn put(
        &self,
        world: WorldId,
        player: PlayerId,
        action: ActionId,
        record: &ExecutionRecord,
    ) -> Result<()> {
        let json = serde_json::to_vec(record)?;
        let checksum = self.checksum(&json);
        self.conn.lock().execute(
            "INSERT INTO execution_records
                (world_id, player_id, action_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(world_id, player_id, action_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![
                world.to_string(),
                player.to_string(),
                action.to_string(),
                json,
                Utc::now().to_rfc3339(),
                checksum
            ],
        )?;
        Ok(())
    }

    fn delete(&self, world: WorldId, player: PlayerId, action: ActionId) -> Result<bool> {
        let deleted = self.conn.lock().execute(
            "DELETE FROM execution_records
             WHERE world_id = ?1 AND player_id = ?2 AND action_id = ?3",
            params![world.to_string(), player.to_string(), action.to_string()],
        )?;
        Ok(deleted > 0)
    }
}

/// Adds `.optional()` to `rusqlite::Result`, mapping `QueryReturnedNoRows`
/// to `Ok(None)`.
trait OptionalExt<T> {
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
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::condition::ConditionEntry;
    use crate::dialog::{DialogEntry, DialogType};
    use crate::types::DialogId;
    use crate::execution::{ExecutionInterval, ExecutionTracker};

    fn test_config() -> PersistenceConfig {
        PersistenceConfig {
            checksum_enabled: true,
            ..PersistenceConfig::default()
        }
    }

    fn sample_set() -> DialogSet {
        let mut set = DialogSet::new(DialogType::Standard);
        set.add_dialog(DialogEntry::new("welcome", "Welcome", "Hello there, traveller."));
        set.add_dialog(
            DialogEntry::new("quest_hint", "Quest Hint", "The mines are dangerous.")
                .with_priority(10)
                .with_conditions([ConditionEntry::quest_not_accepted("")].into_iter().collect()),
        );
        set
    }

    fn sample_record() -> ExecutionRecord {
        ExecutionRecord {
            timestamps: vec![1_000, 2_000],
            total: 2,
            last_execution: 2_000,
        }
    }

    #[test]
    fn dialog_set_round_trip() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let npc = NpcId::new();
        let set = sample_set();

        db.save_dialog_set(npc, &set).expect("save");
        let loaded = db.load_dialog_set(npc).expect("load").expect("Some");

        assert_eq!(loaded.len(), 2);
        let hint = loaded.dialog_by_label("quest_hint").expect("quest_hint");
        assert_eq!(hint.priority, 10);
        assert_eq!(hint.conditions.len(), 1);
    }

    #[test]
    fn load_missing_dialog_set_is_none() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        assert!(db.load_dialog_set(NpcId::new()).expect("load").is_none());
    }

    #[test]
    fn dialog_set_upsert_and_delete() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let npc = NpcId::new();
        db.save_dialog_set(npc, &sample_set()).expect("save1");

        let mut smaller = sample_set();
        smaller.remove_dialog(DialogId::from_label("quest_hint"));
        db.save_dialog_set(npc, &smaller).expect("save2");
        assert_eq!(db.load_dialog_set(npc).expect("load").expect("Some").len(), 1);

        assert_eq!(db.list_dialog_npcs().expect("list"), vec![npc]);
        assert!(db.delete_dialog_set(npc).expect("delete"));
        assert!(!db.delete_dialog_set(npc).expect("delete again"));
        assert!(db.list_dialog_npcs().expect("list").is_empty());
    }

    #[test]
    fn unknown_world_is_not_found() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let world = WorldId::new();
        assert!(matches!(db.world_name(world), Err(PalaverError::WorldNotFound(w)) if w == world));

        db.register_world(world, "overworld").expect("register");
        assert_eq!(db.world_name(world).expect("name"), "overworld");
        db.register_world(world, "nether").expect("rename");
        assert_eq!(db.list_worlds().expect("list"), vec![(world, "nether".to_string())]);
    }

    #[test]
    fn execution_records_are_world_scoped() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let (w1, w2) = (WorldId::new(), WorldId::new());
        let player = PlayerId::new();
        let action = ActionId(Uuid::new_v4());

        db.put(w1, player, action, &sample_record()).expect("put");
        assert_eq!(db.load_world(w1).expect("load").len(), 1);
        assert!(db.load_world(w2).expect("load").is_empty());
        assert_eq!(db.execution_record_count(w1).expect("count"), 1);

        let (p, a, record) = db.load_world(w1).expect("load").remove(0);
        assert_eq!((p, a), (player, action));
        assert_eq!(record, sample_record());

        assert!(db.delete(w1, player, action).expect("delete"));
        assert!(!db.delete(w1, player, action).expect("delete again"));
    }

    #[test]
    fn delete_world_drops_its_records() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let world = WorldId::new();
        db.register_world(world, "overworld").expect("register");
        db.put(world, PlayerId::new(), ActionId(Uuid::new_v4()), &sample_record())
            .expect("put");

        assert!(db.delete_world(world).expect("delete"));
        assert_eq!(db.execution_record_count(world).expect("count"), 0);
        assert!(db.world_name(world).is_err());
    }

    #[test]
    fn tracker_survives_reopen_through_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("palaver.db");
        let world = WorldId::new();
        let player = PlayerId::new();
        let action = ActionId(Uuid::new_v4());
        let clock = Arc::new(ManualClock::new(1_000_000));

        {
            let db = Arc::new(WorldDatabase::open(&path, &test_config()).expect("open"));
            let tracker = ExecutionTracker::open(world, Box::new(Arc::clone(&db)), clock.clone())
                .expect("tracker");
            tracker
                .record_execution(player, action, ExecutionInterval::PerHour)
                .expect("record");
        }

        let db = Arc::new(WorldDatabase::open(&path, &test_config()).expect("reopen"));
        let tracker = ExecutionTracker::open(world, Box::new(db), clock).expect("tracker");
        assert!(!tracker.can_execute(player, action, 1, ExecutionInterval::PerHour));
    }

    #[test]
    fn checksum_mismatch_still_loads() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let npc = NpcId::new();
        db.save_dialog_set(npc, &sample_set()).expect("save");

        db.conn
            .lock()
            .execute(
                "UPDATE dialog_sets SET checksum = 'deadbeef' WHERE npc_id = ?1",
                params![npc.to_string()],
            )
            .expect("corrupt checksum");

        let loaded = db.load_dialog_set(npc).expect("load").expect("Some");
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn corrupt_payload_is_serialization_error() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        let npc = NpcId::new();
        db.save_dialog_set(npc, &sample_set()).expect("save");
        db.conn
            .lock()
            .execute(
                "UPDATE dialog_sets SET data = X'7B7B' WHERE npc_id = ?1",
                params![npc.to_string()],
            )
            .expect("corrupt data");

        assert!(matches!(db.load_dialog_set(npc), Err(PalaverError::Serialization(_))));
    }

    #[test]
    fn file_backup_contains_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = WorldDatabase::open(dir.path().join("palaver.db"), &test_config()).expect("open");
        let npc = NpcId::new();
        db.save_dialog_set(npc, &sample_set()).expect("save");

        let backup_path = dir.path().join("palaver_backup.db");
        db.backup(&backup_path).expect("backup");

        let restored = WorldDatabase::open(&backup_path, &test_config()).expect("open backup");
        assert!(restored.load_dialog_set(npc).expect("load").is_some());
    }

    #[test]
    fn rotating_backup_keeps_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = test_config();
        config.backup_count = 2;
        let db = WorldDatabase::open(dir.path().join("world.db"), &config).expect("open");
        db.save_dialog_set(NpcId::new(), &sample_set()).expect("save");

        db.create_rotating_backup().expect("backup 1");
        db.create_rotating_backup().expect("backup 2");
        db.create_rotating_backup().expect("backup 3");

        assert!(dir.path().join("world.db.bak.1").exists());
        assert!(dir.path().join("world.db.bak.2").exists());
        assert!(!dir.path().join("world.db.bak.3").exists());
    }

    #[test]
    fn integrity_and_vacuum() {
        let db = WorldDatabase::open_in_memory(&test_config()).expect("open");
        assert!(db.integrity_check().expect("check"));
        db.vacuum().expect("vacuum");
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(crc32_compute(b"123456789"), 0xCBF4_3926);
    }
}
