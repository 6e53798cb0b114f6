//! SQLite-backed user store.
//!
//! One row per Telegram user id. The store owns record lifetime; callers
//! only read and issue upsert commands.

use std::path::Path;

use pulse_core::UserIdentity;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

pub const SCHEMA_VERSION: i64 = 1;

/// Preference value assigned on the creation path, never on re-sync.
pub const DEFAULT_BPM: i64 = 90;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub language_code: String,
    pub is_premium: bool,
    pub is_bot: bool,
    pub photo_url: String,
    pub bpm: i64,
    pub is_subbed: i64,
}

pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let current = self.schema_version()?;
        if current > SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: current,
                supported: SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_users.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    /// Insert-or-update in a single statement.
    ///
    /// The creation path seeds `bpm` and `is_subbed` with their defaults;
    /// an existing row only has `first_name`, `username` and `photo_url`
    /// overwritten. Because insert and update are one SQL statement,
    /// concurrent syncs for the same new id cannot both create, and the
    /// returned row always carries the authoritative `bpm`.
    pub fn upsert_user(&self, identity: &UserIdentity) -> Result<UserRecord, StorageError> {
        let record = self.conn.query_row(
            "
            INSERT INTO telegram_users (
                user_id, telegram_id, is_bot, first_name, last_name, username,
                language_code, is_premium, photo_url, bpm, is_subbed
            ) VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)
            ON CONFLICT(user_id) DO UPDATE SET
                first_name=excluded.first_name,
                username=excluded.username,
                photo_url=excluded.photo_url
            RETURNING user_id, first_name, last_name, username, language_code,
                      is_premium, is_bot, photo_url, bpm, is_subbed
            ",
            params![
                identity.id,
                identity.is_bot,
                identity.first_name,
                identity.last_name,
                identity.username,
                identity.language_code,
                identity.is_premium,
                identity.photo_url,
                DEFAULT_BPM,
            ],
            record_from_row,
        )?;

        Ok(record)
    }

    pub fn user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, StorageError> {
        let record = self
            .conn
            .query_row(
                "
                SELECT user_id, first_name, last_name, username, language_code,
                       is_premium, is_bot, photo_url, bpm, is_subbed
                FROM telegram_users
                WHERE user_id = ?1
                ",
                [user_id],
                record_from_row,
            )
            .optional()?;

        Ok(record)
    }

    /// Overwrites `bpm` for one user. Returns whether a row was updated;
    /// an unknown id is reported as `false`, not an error.
    pub fn set_bpm(&self, user_id: i64, bpm: i64) -> Result<bool, StorageError> {
        let changes = self.conn.execute(
            "UPDATE telegram_users SET bpm = ?1 WHERE user_id = ?2",
            params![bpm, user_id],
        )?;
        Ok(changes > 0)
    }

    pub fn user_count(&self) -> Result<i64, StorageError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM telegram_users", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool, StorageError> {
        let exists = self
            .conn
            .query_row(
                "
                SELECT 1
                FROM sqlite_master
                WHERE type='table' AND name = ?1
                LIMIT 1
                ",
                [table_name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(exists.is_some())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        username: row.get(3)?,
        language_code: row.get(4)?,
        is_premium: row.get(5)?,
        is_bot: row.get(6)?,
        photo_url: row.get(7)?,
        bpm: row.get(8)?,
        is_subbed: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn identity(id: i64, first_name: &str) -> UserIdentity {
        UserIdentity {
            id,
            first_name: first_name.to_string(),
            last_name: "Lee".to_string(),
            username: "ann".to_string(),
            language_code: "en".to_string(),
            is_premium: false,
            is_bot: false,
            photo_url: "https://example.com/a.jpg".to_string(),
        }
    }

    #[test]
    fn migration_creates_user_table() {
        let db = UserStore::open_in_memory().expect("open db");
        assert!(db.table_exists("telegram_users").expect("table check"));
        assert_eq!(db.schema_version().expect("schema version"), SCHEMA_VERSION);
    }

    #[test]
    fn creation_path_seeds_defaults() {
        let db = UserStore::open_in_memory().expect("open db");
        let record = db.upsert_user(&identity(42, "Ann")).expect("insert");

        assert_eq!(record.user_id, 42);
        assert_eq!(record.first_name, "Ann");
        assert_eq!(record.bpm, DEFAULT_BPM);
        assert_eq!(record.is_subbed, 0);
        assert_eq!(db.user_count().expect("count"), 1);
    }

    #[test]
    fn re_sync_updates_identity_but_preserves_preferences() {
        let db = UserStore::open_in_memory().expect("open db");
        db.upsert_user(&identity(42, "Ann")).expect("insert");
        assert!(db.set_bpm(42, 132).expect("set bpm"));

        let mut changed = identity(42, "Anna");
        changed.username = "anna".to_string();
        changed.photo_url = "https://example.com/b.jpg".to_string();
        changed.last_name = "Other".to_string();
        let record = db.upsert_user(&changed).expect("re-sync");

        assert_eq!(record.first_name, "Anna");
        assert_eq!(record.username, "anna");
        assert_eq!(record.photo_url, "https://example.com/b.jpg");
        // Immutable on re-sync.
        assert_eq!(record.last_name, "Lee");
        assert_eq!(record.bpm, 132);
        assert_eq!(record.is_subbed, 0);
        assert_eq!(db.user_count().expect("count"), 1);
    }

    #[test]
    fn re_sync_with_same_values_is_a_no_op() {
        let db = UserStore::open_in_memory().expect("open db");
        let first = db.upsert_user(&identity(42, "Ann")).expect("insert");
        let second = db.upsert_user(&identity(42, "Ann")).expect("re-sync");
        assert_eq!(first, second);
        assert_eq!(db.user_count().expect("count"), 1);
    }

    #[test]
    fn set_bpm_isolates_users() {
        let db = UserStore::open_in_memory().expect("open db");
        db.upsert_user(&identity(1, "A")).expect("insert a");
        db.upsert_user(&identity(2, "B")).expect("insert b");

        assert!(db.set_bpm(1, 140).expect("set bpm"));

        let a = db.user_by_id(1).expect("query").expect("a exists");
        let b = db.user_by_id(2).expect("query").expect("b exists");
        assert_eq!(a.bpm, 140);
        assert_eq!(b.bpm, DEFAULT_BPM);
    }

    #[test]
    fn set_bpm_for_unknown_user_reports_no_rows() {
        let db = UserStore::open_in_memory().expect("open db");
        assert!(!db.set_bpm(999, 100).expect("set bpm"));
    }

    #[test]
    fn lookup_of_absent_user_is_none() {
        let db = UserStore::open_in_memory().expect("open db");
        assert!(db.user_by_id(5).expect("query").is_none());
    }

    #[test]
    fn records_persist_across_reopen() {
        let file = NamedTempFile::new().expect("temp db");
        {
            let db = UserStore::open(file.path()).expect("open db");
            db.upsert_user(&identity(42, "Ann")).expect("insert");
            db.set_bpm(42, 120).expect("set bpm");
        }

        let db = UserStore::open(file.path()).expect("reopen db");
        let record = db.user_by_id(42).expect("query").expect("record survives");
        assert_eq!(record.first_name, "Ann");
        assert_eq!(record.bpm, 120);
    }
}
