//! Cache slot contract for single-row snapshot storage.
//!
//! A slot bundles the read/replace/clear capabilities for one entity kind.
//! The fetch coordinator is handed a slot and drives it without any
//! per-kind dispatch.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during snapshot store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A cached payload could not be encoded or decoded.
    #[error("Payload codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type for snapshot store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The two entity kinds the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    CurrentWeather,
    Forecast,
}

impl EntityKind {
    /// Table backing this kind.
    pub(crate) fn table(self) -> &'static str {
        match self {
            EntityKind::CurrentWeather => "current_weather",
            EntityKind::Forecast => "forecast_weather",
        }
    }

    /// Stable tag for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::CurrentWeather => "current-weather",
            EntityKind::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when an older refresh cycle tries to write after a newer one
/// has already committed for the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Whichever write commits last is what the cache holds.
    #[default]
    LastWriteWins,
    /// Writes carrying a cycle id older than the committed one are dropped.
    NewestCycleWins,
}

/// Outcome of a replace attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was replaced.
    Committed,
    /// A newer cycle had already committed; the write was dropped.
    StaleDropped,
}

/// Read/write capabilities for one cached entity kind.
///
/// Implemented once per kind; the pair of capabilities is passed into the
/// fetch coordinator, which stays generic over the value type.
pub trait CacheSlot: Send + Sync {
    type Value;

    /// Which entity kind this slot stores.
    fn kind(&self) -> EntityKind;

    /// Latest cached value, if any.
    ///
    /// # Errors
    /// Returns `StoreError::Codec` if the stored payload no longer decodes.
    fn read_latest(&self) -> StoreResult<Option<Self::Value>>;

    /// Replace the cached row with `value` as one transaction: delete
    /// everything for this kind, insert the new row, commit. Readers never
    /// observe the intermediate empty state.
    ///
    /// # Errors
    /// Returns `StoreError::Sqlite` if the transaction fails; nothing is
    /// written in that case.
    fn replace(&self, value: &Self::Value, cycle: u64) -> StoreResult<WriteOutcome>;

    /// Drop the cached row for this kind.
    ///
    /// # Errors
    /// Returns `StoreError::Sqlite` on database failure.
    fn clear(&self) -> StoreResult<()>;

    /// When the current row was committed.
    ///
    /// # Errors
    /// Returns `StoreError::Sqlite` on database failure.
    fn cached_at(&self) -> StoreResult<Option<DateTime<Utc>>>;
}
