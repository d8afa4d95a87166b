// ============================================================================
// SessionDb - Embedded Database (redb)
// ============================================================================
// Durable client state: the authenticated user's id (for silent restore)
// and the backend URL it was issued by.
// Default path: ~/.taskquest/session.redb (override via TASKQUEST_DB_PATH)
// ============================================================================

pub mod types;

pub use types::{StoredSession, StoredSettings};

use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{QuestError, Result};

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

// Table definitions
const SESSION: RecordTable = TableDefinition::new("session");
const SETTINGS: RecordTable = TableDefinition::new("settings");

const SESSION_KEY: &str = "session:current";
const SETTINGS_KEY: &str = "settings:client";

fn storage<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> QuestError + '_ {
    move |e| QuestError::Storage(format!("{}: {}", context, e))
}

/// Embedded database for durable session state
pub struct SessionDb {
    db: Database,
    path: PathBuf,
}

impl SessionDb {
    /// Open (or create) the database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        info!("Opening session database at: {}", db_path.display());

        let db = Database::create(&db_path).map_err(storage("Failed to open database"))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db.begin_write().map_err(storage("Failed to begin write"))?;
        {
            let _ = write_txn
                .open_table(SESSION)
                .map_err(storage("Failed to create session table"))?;
            let _ = write_txn
                .open_table(SETTINGS)
                .map_err(storage("Failed to create settings table"))?;
        }
        write_txn.commit().map_err(storage("Failed to commit init"))?;

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Persist the authenticated user's id
    pub fn save_session(&self, user_id: i64) -> Result<()> {
        let record = StoredSession {
            user_id,
            saved_at: chrono::Utc::now().timestamp(),
        };
        self.put(SESSION, SESSION_KEY, &record)?;
        debug!("Persisted session for user {}", user_id);
        Ok(())
    }

    pub fn load_session(&self) -> Result<Option<StoredSession>> {
        self.get(SESSION, SESSION_KEY)
    }

    /// Persisted user id, if any
    pub fn session_user_id(&self) -> Result<Option<i64>> {
        Ok(self.load_session()?.map(|s| s.user_id))
    }

    /// Remove the persisted session. Returns whether one existed.
    pub fn clear_session(&self) -> Result<bool> {
        let write_txn = self.db.begin_write().map_err(storage("Failed to begin write"))?;
        let removed;
        {
            let mut table = write_txn
                .open_table(SESSION)
                .map_err(storage("Failed to open session table"))?;
            removed = table
                .remove(SESSION_KEY)
                .map_err(storage("Failed to remove session"))?
                .is_some();
        }
        write_txn.commit().map_err(storage("Failed to commit delete"))?;

        if removed {
            debug!("Cleared persisted session");
        }
        Ok(removed)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn store_settings(&self, settings: &StoredSettings) -> Result<()> {
        self.put(SETTINGS, SETTINGS_KEY, settings)
    }

    pub fn settings(&self) -> Result<StoredSettings> {
        Ok(self.get(SETTINGS, SETTINGS_KEY)?.unwrap_or_default())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn put<T: serde::Serialize>(
        &self,
        table_def: RecordTable,
        key: &str,
        record: &T,
    ) -> Result<()> {
        let value = bincode::serialize(record).map_err(storage("Failed to serialize record"))?;

        let write_txn = self.db.begin_write().map_err(storage("Failed to begin write"))?;
        {
            let mut table = write_txn
                .open_table(table_def)
                .map_err(storage("Failed to open table"))?;
            table
                .insert(key, value.as_slice())
                .map_err(storage("Failed to insert record"))?;
        }
        write_txn.commit().map_err(storage("Failed to commit"))?;
        Ok(())
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        table_def: RecordTable,
        key: &str,
    ) -> Result<Option<T>> {
        let read_txn = self.db.begin_read().map_err(storage("Failed to begin read"))?;
        let table = read_txn
            .open_table(table_def)
            .map_err(storage("Failed to open table"))?;

        match table.get(key).map_err(storage("Failed to get record"))? {
            Some(value) => {
                let record = bincode::deserialize(value.value())
                    .map_err(storage("Failed to deserialize record"))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}
