//! IP-based geolocation: approximate the position of the caller's public IP.
//! Uses ipwho.is - free, no API key required.

use reqwest::Client;
use serde::Deserialize;

use crate::types::{FixSource, LocationFix};

const IP_GEOLOCATION_URL: &str = "https://ipwho.is/";

#[derive(Debug, Deserialize)]
struct IpGeolocationResponse {
    success: Option<bool>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    message: Option<String>,
    city: Option<String>,
}

/// Resolves an approximate position from the caller's public IP.
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    endpoint: String,
}

impl IpLocator {
    pub fn new() -> Self {
        Self::with_endpoint(IP_GEOLOCATION_URL)
    }

    /// Use a non-default geolocation endpoint (config override, tests).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Approximate position for the caller's public IP.
    /// Returns `None` on any failure so the cascade can fall through to the
    /// next source.
    pub async fn locate(&self) -> Option<LocationFix> {
        let response = match self.client.get(&self.endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("IP geolocation request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("IP geolocation returned status {}", response.status());
            return None;
        }

        let body: IpGeolocationResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("IP geolocation parse error: {}", e);
                return None;
            }
        };

        if body.success != Some(true) {
            tracing::debug!(
                "IP geolocation unsuccessful: {}",
                body.message.as_deref().unwrap_or("no reason given")
            );
            return None;
        }

        let (latitude, longitude) = match (body.latitude, body.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                tracing::debug!("IP geolocation response missing coordinates");
                return None;
            }
        };

        // (0, 0) is the service's placeholder for an IP it could not place.
        if latitude == 0.0 && longitude == 0.0 {
            tracing::debug!("IP geolocation returned (0, 0), discarding");
            return None;
        }

        if let Some(city) = &body.city {
            tracing::info!("IP geolocation placed us near {}", city);
        }

        Some(LocationFix {
            latitude,
            longitude,
            source: FixSource::Ip,
        })
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}
