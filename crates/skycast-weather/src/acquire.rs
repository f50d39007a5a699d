//! Fetch pipelines for the two cached weather entities.

use chrono::{DateTime, Duration, Utc};
use skycast_store::{CacheSlot, Slot};
use tokio::sync::mpsc;

use crate::bundled;
use crate::client::WeatherClient;
use crate::coordinator;
use crate::resource::Resource;
use crate::types::{ForecastSnapshot, WeatherSnapshot};

/// When to go back to the network for an entity that is already cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Refetch on every cycle.
    #[default]
    Always,
    /// Serve the cached value while it is younger than this.
    MaxAge(Duration),
}

impl RefreshPolicy {
    /// Policy from configured minutes, where 0 means refetch every cycle.
    pub fn from_minutes(minutes: u32) -> Self {
        if minutes == 0 {
            RefreshPolicy::Always
        } else {
            RefreshPolicy::MaxAge(Duration::minutes(i64::from(minutes)))
        }
    }

    /// Whether a refetch is due, given when the cache row was committed.
    /// An unknown commit time always counts as due.
    pub fn due(&self, cached_at: Option<DateTime<Utc>>) -> bool {
        match (*self, cached_at) {
            (RefreshPolicy::Always, _) => true,
            (RefreshPolicy::MaxAge(_), None) => true,
            (RefreshPolicy::MaxAge(max_age), Some(at)) => Utc::now() - at >= max_age,
        }
    }
}

/// Coordinates and credentials shared by one cycle's fetches.
#[derive(Debug, Clone)]
pub struct FetchParams {
    pub lat: f64,
    pub lon: f64,
    pub api_key: String,
    pub cycle: u64,
}

/// Current-conditions pipeline: straight through the cache coordinator.
pub async fn current_weather(
    client: &WeatherClient,
    slot: &Slot<WeatherSnapshot>,
    policy: RefreshPolicy,
    params: &FetchParams,
    events: &mpsc::Sender<Resource<WeatherSnapshot>>,
) -> Resource<WeatherSnapshot> {
    coordinator::run(
        slot,
        params.cycle,
        |_| policy.due(slot.cached_at().ok().flatten()),
        || client.current(params.lat, params.lon, &params.api_key),
        events,
    )
    .await
}

/// Forecast pipeline. A failed remote fetch substitutes the bundled sample
/// document as the fetch result, so it is committed and reported as a
/// success like any other value; only when the bundled document itself
/// cannot be decoded does the remote failure surface.
pub async fn forecast(
    client: &WeatherClient,
    slot: &Slot<ForecastSnapshot>,
    policy: RefreshPolicy,
    params: &FetchParams,
    events: &mpsc::Sender<Resource<ForecastSnapshot>>,
) -> Resource<ForecastSnapshot> {
    coordinator::run(
        slot,
        params.cycle,
        |_| policy.due(slot.cached_at().ok().flatten()),
        || async {
            match client.forecast(params.lat, params.lon, &params.api_key).await {
                Ok(snapshot) => Ok(snapshot),
                Err(e) => {
                    tracing::warn!("forecast fetch failed, substituting bundled sample: {e}");
                    bundled::load().map_err(|bundle_err| {
                        tracing::error!("bundled forecast unusable: {bundle_err}");
                        e
                    })
                }
            }
        },
        events,
    )
    .await
}
