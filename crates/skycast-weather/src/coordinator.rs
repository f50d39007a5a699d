//! Cache-first fetch coordination.
//!
//! One invocation drives one fetch cycle for one cached entity: read the
//! cache, report it while loading, decide whether to go to the network,
//! commit what comes back, and re-read the cache so the terminal state
//! reports what was actually committed. The cache stays the single source
//! of truth throughout; the fetch result itself is never handed to
//! consumers directly.

use std::future::Future;

use skycast_store::{CacheSlot, StoreError};
use tokio::sync::mpsc;

use crate::error::FetchError;
use crate::resource::Resource;

/// Runs one fetch cycle through the given cache slot.
///
/// Emits exactly one `Loading` followed by exactly one terminal state on
/// `events`, and returns the terminal state as well. `should_refetch` is
/// only consulted when a cached value exists; an empty cache always goes
/// to the network.
pub async fn run<S, T, P, F, Fut>(
    slot: &S,
    cycle: u64,
    should_refetch: P,
    fetch: F,
    events: &mpsc::Sender<Resource<T>>,
) -> Resource<T>
where
    S: CacheSlot<Value = T>,
    T: Clone,
    P: FnOnce(&T) -> bool,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let kind = slot.kind();

    let cached = match slot.read_latest() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), cycle, "cache read failed, treating as empty: {e}");
            None
        }
    };

    emit(events, Resource::Loading { cached: cached.clone() }).await;

    if let Some(value) = &cached {
        if !should_refetch(value) {
            tracing::debug!(kind = kind.as_str(), cycle, "cached value still fresh, skipping fetch");
            let fresh = slot
                .read_latest()
                .ok()
                .flatten()
                .unwrap_or_else(|| value.clone());
            let terminal = Resource::Success { value: fresh };
            emit(events, terminal.clone()).await;
            return terminal;
        }
    }

    match fetch().await {
        Ok(value) => match commit_and_reread(slot, &value, cycle) {
            Ok(committed) => {
                tracing::info!(kind = kind.as_str(), cycle, "fetch committed to cache");
                let terminal = Resource::Success { value: committed };
                emit(events, terminal.clone()).await;
                terminal
            }
            Err(e) => {
                tracing::warn!(kind = kind.as_str(), cycle, "fetched but could not commit: {e}");
                let terminal = Resource::Error {
                    cause: FetchError::from(e).signal(),
                    cached,
                };
                emit(events, terminal.clone()).await;
                terminal
            }
        },
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), cycle, "fetch failed: {e}");
            let terminal = Resource::Error {
                cause: e.signal(),
                cached: slot.read_latest().ok().flatten().or(cached),
            };
            emit(events, terminal.clone()).await;
            terminal
        }
    }
}

/// Write the fetched value, then report whatever the cache now holds.
/// Under a newest-cycle-wins policy the write may have been dropped in
/// favour of a later cycle's value; the re-read surfaces that value.
fn commit_and_reread<S, T>(slot: &S, value: &T, cycle: u64) -> Result<T, StoreError>
where
    S: CacheSlot<Value = T>,
    T: Clone,
{
    slot.replace(value, cycle)?;
    Ok(slot.read_latest()?.unwrap_or_else(|| value.clone()))
}

/// A dropped receiver only means nobody is watching this cycle any more.
async fn emit<T>(events: &mpsc::Sender<Resource<T>>, state: Resource<T>) {
    let _ = events.send(state).await;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use skycast_store::{EntityKind, OverlapPolicy, SnapshotStore, StoreResult, WriteOutcome};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
    }

    fn sample(name: &str) -> Sample {
        Sample { name: name.to_string() }
    }

    fn channel() -> (mpsc::Sender<Resource<Sample>>, mpsc::Receiver<Resource<Sample>>) {
        mpsc::channel(4)
    }

    fn collect(mut rx: mpsc::Receiver<Resource<Sample>>) -> Vec<Resource<Sample>> {
        let mut states = Vec::new();
        while let Ok(state) = rx.try_recv() {
            states.push(state);
        }
        states
    }

    #[tokio::test]
    async fn test_empty_cache_fetches_and_commits() {
        let store = SnapshotStore::in_memory(OverlapPolicy::LastWriteWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::CurrentWeather);
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            1,
            |_| true,
            || async { Ok::<_, FetchError>(sample("fresh")) },
            &tx,
        )
        .await;
        drop(tx);

        assert_eq!(terminal, Resource::Success { value: sample("fresh") });
        let states = collect(rx);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0], Resource::Loading { cached: None });
        assert_eq!(states[1], terminal);
        assert_eq!(store.row_count(EntityKind::CurrentWeather).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_warm_cache_is_reported_while_loading() {
        let store = SnapshotStore::in_memory(OverlapPolicy::LastWriteWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::CurrentWeather);
        slot.replace(&sample("stale"), 1).unwrap();
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            2,
            |_| true,
            || async { Ok::<_, FetchError>(sample("fresh")) },
            &tx,
        )
        .await;
        drop(tx);

        let states = collect(rx);
        assert_eq!(states[0], Resource::Loading { cached: Some(sample("stale")) });
        assert_eq!(terminal, Resource::Success { value: sample("fresh") });
        assert_eq!(slot.read_latest().unwrap(), Some(sample("fresh")));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_cached_value() {
        let store = SnapshotStore::in_memory(OverlapPolicy::LastWriteWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::Forecast);
        slot.replace(&sample("known good"), 1).unwrap();
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            2,
            |_| true,
            || async {
                Err::<Sample, _>(FetchError::Api {
                    status: 500,
                    message: "server error".to_string(),
                })
            },
            &tx,
        )
        .await;
        drop(tx);

        match &terminal {
            Resource::Error { cause, cached } => {
                assert_eq!(cause.code, 500);
                assert_eq!(cached.as_ref(), Some(&sample("known good")));
            }
            other => panic!("expected Error, got {other:?}"),
        }
        let states = collect(rx);
        assert_eq!(states.len(), 2);
        assert!(states[0].is_loading());
        assert_eq!(slot.read_latest().unwrap(), Some(sample("known good")));
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_the_network() {
        let store = SnapshotStore::in_memory(OverlapPolicy::LastWriteWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::CurrentWeather);
        slot.replace(&sample("fresh enough"), 1).unwrap();
        let fetched = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fetched);
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            2,
            |_| false,
            move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, FetchError>(sample("from network"))
            },
            &tx,
        )
        .await;
        drop(tx);

        assert!(!fetched.load(Ordering::SeqCst));
        assert_eq!(terminal, Resource::Success { value: sample("fresh enough") });
        let states = collect(rx);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0], Resource::Loading { cached: Some(sample("fresh enough")) });
    }

    #[tokio::test]
    async fn test_empty_cache_ignores_the_refetch_predicate() {
        let store = SnapshotStore::in_memory(OverlapPolicy::LastWriteWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::CurrentWeather);
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            1,
            |_| false,
            || async { Ok::<_, FetchError>(sample("first ever")) },
            &tx,
        )
        .await;
        drop(tx);

        assert_eq!(terminal, Resource::Success { value: sample("first ever") });
        assert_eq!(collect(rx).len(), 2);
    }

    /// Slot whose writes always fail, for exercising the commit error path.
    struct BrokenSlot {
        cached: Sample,
    }

    impl CacheSlot for BrokenSlot {
        type Value = Sample;

        fn kind(&self) -> EntityKind {
            EntityKind::CurrentWeather
        }

        fn read_latest(&self) -> StoreResult<Option<Sample>> {
            Ok(Some(self.cached.clone()))
        }

        fn replace(&self, _value: &Sample, _cycle: u64) -> StoreResult<WriteOutcome> {
            Err(serde_json::from_str::<i64>("not a number").unwrap_err().into())
        }

        fn clear(&self) -> StoreResult<()> {
            Ok(())
        }

        fn cached_at(&self) -> StoreResult<Option<DateTime<Utc>>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_error_with_cached_value() {
        let slot = BrokenSlot { cached: sample("still here") };
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            1,
            |_| true,
            || async { Ok::<_, FetchError>(sample("fetched fine")) },
            &tx,
        )
        .await;
        drop(tx);

        match &terminal {
            Resource::Error { cause, cached } => {
                assert_eq!(cause.code, 0);
                assert_eq!(cached.as_ref(), Some(&sample("still here")));
            }
            other => panic!("expected Error, got {other:?}"),
        }
        assert_eq!(collect(rx).len(), 2);
    }

    #[tokio::test]
    async fn test_stale_cycle_reports_the_committed_value() {
        let store = SnapshotStore::in_memory(OverlapPolicy::NewestCycleWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::Forecast);
        // A later cycle already committed; this cycle's write must lose.
        slot.replace(&sample("newer"), 9).unwrap();
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            3,
            |_| true,
            || async { Ok::<_, FetchError>(sample("older")) },
            &tx,
        )
        .await;
        drop(tx);

        assert_eq!(terminal, Resource::Success { value: sample("newer") });
        assert_eq!(slot.read_latest().unwrap(), Some(sample("newer")));
        assert_eq!(collect(rx).len(), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_carries_status_in_signal() {
        let store = SnapshotStore::in_memory(OverlapPolicy::LastWriteWins).unwrap();
        let slot = store.slot::<Sample>(EntityKind::CurrentWeather);
        let (tx, rx) = channel();

        let terminal = run(
            &slot,
            1,
            |_| true,
            || async {
                Err::<Sample, _>(FetchError::Auth {
                    code: 401,
                    message: "Invalid API key".to_string(),
                })
            },
            &tx,
        )
        .await;
        drop(tx);

        match &terminal {
            Resource::Error { cause, cached } => {
                assert_eq!(cause.code, 401);
                assert!(cached.is_none());
            }
            other => panic!("expected Error, got {other:?}"),
        }
        assert_eq!(collect(rx).len(), 2);
    }
}
