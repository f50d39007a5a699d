use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::DateTime;
use skycast_core::{Config, OverlapMode};
use skycast_location::{IpLocator, LocationResolver, UnavailableDeviceLocation};
use skycast_store::{OverlapPolicy, SnapshotStore};
use skycast_weather::{
    ForecastSnapshot, RefreshPolicy, Resource, WeatherClient, WeatherService, WeatherSnapshot,
};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    skycast_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Skycast started");

    let api_key = config
        .api
        .api_key
        .clone()
        .context("No API key configured. Set SKYCAST_API_KEY or api.api_key in config.toml")?;

    let db_path = config.store.effective_db_path();
    ensure_parent_dir(&db_path)?;
    let overlap = match config.refresh.overlap {
        OverlapMode::LastWriteWins => OverlapPolicy::LastWriteWins,
        OverlapMode::NewestCycleWins => OverlapPolicy::NewestCycleWins,
    };
    let store = SnapshotStore::open(&db_path, overlap)
        .with_context(|| format!("Failed to open snapshot store at {}", db_path.display()))?;

    // No positioning hardware to ask on this build; the IP lookup carries
    // the whole location cascade.
    let resolver = LocationResolver::new(
        IpLocator::with_endpoint(config.api.geolocation_url.clone()),
        Arc::new(UnavailableDeviceLocation),
    );

    let service = WeatherService::new(
        store,
        WeatherClient::with_base_url(config.api.weather_base_url.clone()),
        resolver,
        RefreshPolicy::from_minutes(config.refresh.max_age_minutes),
    );

    println!("Skycast - Cached Weather");
    println!("Config directory: {}", config.config_dir.display());
    println!("Snapshot store:   {}", db_path.display());

    match service.refresh(&api_key).await {
        Some(cycle) => {
            println!(
                "Location: {:.4}, {:.4} (via {})",
                cycle.fix.latitude, cycle.fix.longitude, cycle.fix.source
            );
            report_current(cycle.current).await;
            report_forecast(cycle.forecast).await;
        }
        None => {
            println!("\nNo location could be determined; nothing was refreshed.");
            println!("Cached snapshots, if any, are untouched.");
        }
    }

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

async fn report_current(mut rx: mpsc::Receiver<Resource<WeatherSnapshot>>) {
    println!("\nCurrent conditions:");
    while let Some(state) = rx.recv().await {
        match state {
            Resource::Loading { cached: Some(snapshot) } => {
                println!("  (cached) {}", summarize_current(&snapshot));
            }
            Resource::Loading { cached: None } => {
                println!("  (no cached snapshot, fetching)");
            }
            Resource::Success { value } => {
                println!("  {}", summarize_current(&value));
            }
            Resource::Error { cause, cached } => {
                println!("  fetch failed: {cause}");
                if let Some(snapshot) = cached {
                    println!("  last known: {}", summarize_current(&snapshot));
                }
            }
        }
    }
}

async fn report_forecast(mut rx: mpsc::Receiver<Resource<ForecastSnapshot>>) {
    println!("\nForecast:");
    while let Some(state) = rx.recv().await {
        match state {
            Resource::Loading { cached: Some(snapshot) } => {
                println!("  (cached, {} days)", snapshot.daily.len());
            }
            Resource::Loading { cached: None } => {}
            Resource::Success { value } => {
                for line in forecast_lines(&value) {
                    println!("  {line}");
                }
            }
            Resource::Error { cause, cached } => {
                println!("  fetch failed: {cause}");
                if let Some(snapshot) = cached {
                    println!("  last known ({} days):", snapshot.daily.len());
                    for line in forecast_lines(&snapshot) {
                        println!("  {line}");
                    }
                }
            }
        }
    }
}

fn summarize_current(snapshot: &WeatherSnapshot) -> String {
    let name = snapshot.city_name.as_deref().unwrap_or("unknown place");
    let temp = snapshot
        .main
        .and_then(|m| m.temp)
        .map(|t| format!("{t:.1}°C"))
        .unwrap_or_else(|| "n/a".to_string());
    let description = snapshot
        .weather
        .first()
        .and_then(|c| c.description.as_deref())
        .unwrap_or("no description");
    format!("{name}: {temp}, {description}")
}

fn forecast_lines(snapshot: &ForecastSnapshot) -> Vec<String> {
    snapshot
        .daily
        .iter()
        .map(|day| {
            let date = day
                .day
                .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
                .map(|dt| dt.format("%a %d %b").to_string())
                .unwrap_or_else(|| "(unknown day)".to_string());
            let temps = day
                .temp
                .map(|t| {
                    format!(
                        "{} to {}",
                        t.min.map(|v| format!("{v:.0}°C")).unwrap_or_else(|| "?".to_string()),
                        t.max.map(|v| format!("{v:.0}°C")).unwrap_or_else(|| "?".to_string()),
                    )
                })
                .unwrap_or_else(|| "no temperatures".to_string());
            let description = day
                .weather
                .first()
                .and_then(|c| c.description.as_deref())
                .unwrap_or("no description");
            format!("{date}  {temps}  {description}")
        })
        .collect()
}
