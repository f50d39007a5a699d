//! Resilient weather data acquisition.
//!
//! A refresh cycle resolves a location and then drives two cache-backed
//! fetch pipelines concurrently, one for current conditions and one for the
//! daily forecast. Each fetch runs through a stale-while-revalidate
//! coordinator: the cached snapshot is reported first, the network result
//! is committed to the cache, and the cache is re-read for the terminal
//! state so consumers only ever see what the cache actually holds. A failed
//! forecast fetch substitutes a bundled sample document instead of erroring.

pub mod acquire;
pub mod bundled;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod resource;
pub mod service;
pub mod types;

pub use acquire::{FetchParams, RefreshPolicy};
pub use client::WeatherClient;
pub use error::FetchError;
pub use resource::{ErrorSignal, Resource};
pub use service::{RefreshCycle, WeatherService};
pub use types::{ForecastSnapshot, WeatherSnapshot};
