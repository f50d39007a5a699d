//! SQLite-backed snapshot store.
//!
//! One table per entity kind, each holding at most one row: the serialized
//! snapshot plus the commit timestamp and the refresh cycle that wrote it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use crate::slot::{
    CacheSlot, EntityKind, OverlapPolicy, StoreResult, WriteOutcome,
};

/// SQLite store holding the latest snapshot per entity kind.
///
/// Cloning is cheap; all clones share one connection. Writers for the same
/// kind serialize on the connection lock, so a replace is never observed
/// half-done.
#[derive(Clone)]
pub struct SnapshotStore {
    conn: Arc<Mutex<Connection>>,
    overlap: OverlapPolicy,
}

impl SnapshotStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// Returns `StoreError::Sqlite` if the database cannot be opened or the
    /// schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P, overlap: OverlapPolicy) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            overlap,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (tests, ephemeral runs).
    ///
    /// # Errors
    /// Returns `StoreError::Sqlite` if the schema cannot be created.
    pub fn in_memory(overlap: OverlapPolicy) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            overlap,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> StoreResult<()> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS current_weather (
                payload TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                cycle_id INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS forecast_weather (
                payload TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                cycle_id INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Typed handle for one entity kind.
    ///
    /// The caller picks the value type for the kind; reading a slot whose
    /// type does not match what was written surfaces as a codec error.
    pub fn slot<T>(&self, kind: EntityKind) -> Slot<T> {
        Slot {
            store: self.clone(),
            kind,
            _value: PhantomData,
        }
    }

    /// Number of rows stored for a kind.
    ///
    /// # Errors
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn row_count(&self, kind: EntityKind) -> StoreResult<u32> {
        let conn = self.conn.lock();
        let count: u32 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn read_row(&self, kind: EntityKind) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        let payload = conn
            .query_row(
                &format!("SELECT payload FROM {} LIMIT 1", kind.table()),
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn row_cached_at(&self, kind: EntityKind) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.conn.lock();
        let cached_ms: Option<i64> = conn
            .query_row(
                &format!("SELECT cached_at FROM {} LIMIT 1", kind.table()),
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(cached_ms.and_then(DateTime::from_timestamp_millis))
    }

    fn replace_row(
        &self,
        kind: EntityKind,
        payload: &str,
        cycle: u64,
    ) -> StoreResult<WriteOutcome> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        if self.overlap == OverlapPolicy::NewestCycleWins {
            let committed: Option<i64> = tx
                .query_row(
                    &format!("SELECT cycle_id FROM {} LIMIT 1", kind.table()),
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            if committed.is_some_and(|c| c as u64 > cycle) {
                tracing::debug!(kind = kind.as_str(), cycle, "dropping write from stale cycle");
                return Ok(WriteOutcome::StaleDropped);
            }
        }

        tx.execute(&format!("DELETE FROM {}", kind.table()), [])?;
        tx.execute(
            &format!(
                "INSERT INTO {} (payload, cached_at, cycle_id) VALUES (?1, ?2, ?3)",
                kind.table()
            ),
            params![payload, Utc::now().timestamp_millis(), cycle as i64],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Committed)
    }

    fn clear_rows(&self, kind: EntityKind) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(&format!("DELETE FROM {}", kind.table()), [])?;
        Ok(())
    }
}

/// Typed [`CacheSlot`] over one of the store's tables.
pub struct Slot<T> {
    store: SnapshotStore,
    kind: EntityKind,
    _value: PhantomData<T>,
}

impl<T> CacheSlot for Slot<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Value = T;

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn read_latest(&self) -> StoreResult<Option<T>> {
        match self.store.read_row(self.kind)? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn replace(&self, value: &T, cycle: u64) -> StoreResult<WriteOutcome> {
        let payload = serde_json::to_string(value)?;
        self.store.replace_row(self.kind, &payload, cycle)
    }

    fn clear(&self) -> StoreResult<()> {
        self.store.clear_rows(self.kind)
    }

    fn cached_at(&self) -> StoreResult<Option<DateTime<Utc>>> {
        self.store.row_cached_at(self.kind)
    }
}
