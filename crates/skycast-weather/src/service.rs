//! One refresh cycle end to end: resolve a location, then fan the fetch
//! pipelines out over the cache.

use std::sync::atomic::{AtomicU64, Ordering};

use skycast_location::{LocationFix, LocationResolver};
use skycast_store::{EntityKind, SnapshotStore};
use tokio::sync::mpsc;

use crate::acquire::{self, FetchParams, RefreshPolicy};
use crate::bundled;
use crate::client::WeatherClient;
use crate::resource::Resource;
use crate::types::{ForecastSnapshot, WeatherSnapshot};

/// Buffer per pipeline channel; a cycle only ever emits two states.
const CHANNEL_CAPACITY: usize = 4;

/// Drives refresh cycles against an injected store, client and resolver.
pub struct WeatherService {
    store: SnapshotStore,
    client: WeatherClient,
    resolver: LocationResolver,
    policy: RefreshPolicy,
    next_cycle: AtomicU64,
}

/// A refresh cycle in flight: where the fix came from, plus one state
/// stream per entity. States arrive as the pipelines progress and the
/// streams close when their pipelines finish.
pub struct RefreshCycle {
    pub fix: LocationFix,
    pub cycle: u64,
    pub current: mpsc::Receiver<Resource<WeatherSnapshot>>,
    pub forecast: mpsc::Receiver<Resource<ForecastSnapshot>>,
}

impl WeatherService {
    pub fn new(
        store: SnapshotStore,
        client: WeatherClient,
        resolver: LocationResolver,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            client,
            resolver,
            policy,
            next_cycle: AtomicU64::new(1),
        }
    }

    /// Run one refresh cycle.
    ///
    /// Resolves a location first; `None` means no source produced a fix and
    /// nothing was fetched or written. Otherwise both pipelines run
    /// concurrently and deliver their states through the returned receivers.
    pub async fn refresh(&self, api_key: &str) -> Option<RefreshCycle> {
        let fix = match self.resolver.resolve().await {
            Some(fix) => fix,
            None => {
                tracing::info!("refresh aborted, no location available");
                return None;
            }
        };

        let cycle = self.next_cycle.fetch_add(1, Ordering::Relaxed);
        tracing::info!(cycle, source = fix.source.as_str(), "starting refresh cycle");

        let params = FetchParams {
            lat: fix.latitude,
            lon: fix.longitude,
            api_key: api_key.to_string(),
            cycle,
        };

        let (current_tx, current_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (forecast_tx, forecast_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let client = self.client.clone();
        let slot = self.store.slot::<WeatherSnapshot>(EntityKind::CurrentWeather);
        let policy = self.policy;
        let current_params = params.clone();
        tokio::spawn(async move {
            acquire::current_weather(&client, &slot, policy, &current_params, &current_tx).await;
        });

        let client = self.client.clone();
        let slot = self.store.slot::<ForecastSnapshot>(EntityKind::Forecast);
        let policy = self.policy;
        tokio::spawn(async move {
            acquire::forecast(&client, &slot, policy, &params, &forecast_tx).await;
        });

        // Probe the bundled fallback in the background so a broken asset
        // shows up in the logs before it is ever needed.
        tokio::spawn(async {
            match bundled::load() {
                Ok(sample) => {
                    tracing::debug!(days = sample.daily.len(), "bundled forecast available");
                }
                Err(e) => tracing::warn!("bundled forecast unusable: {e}"),
            }
        });

        Some(RefreshCycle {
            fix,
            cycle,
            current: current_rx,
            forecast: forecast_rx,
        })
    }
}
