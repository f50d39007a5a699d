//! Ordered location cascade.

use std::sync::Arc;

use crate::device::DeviceLocation;
use crate::geoip::IpLocator;
use crate::types::{DeviceProvider, FixSource, LocationFix};

/// Source order for one resolution attempt.
const CASCADE: [FixSource; 3] = [
    FixSource::Ip,
    FixSource::DeviceFused,
    FixSource::DeviceNetwork,
];

/// Walks the location sources in a fixed order and keeps the first fix.
pub struct LocationResolver {
    ip: IpLocator,
    device: Arc<dyn DeviceLocation>,
}

impl LocationResolver {
    pub fn new(ip: IpLocator, device: Arc<dyn DeviceLocation>) -> Self {
        Self { ip, device }
    }

    /// First fix the cascade produces, or `None` when every source comes up
    /// empty. An exhausted cascade is an absent value, not an error.
    pub async fn resolve(&self) -> Option<LocationFix> {
        for source in CASCADE {
            if let Some(fix) = self.try_source(source).await {
                tracing::info!(
                    source = source.as_str(),
                    lat = fix.latitude,
                    lon = fix.longitude,
                    "location fix acquired"
                );
                return Some(fix);
            }
            tracing::debug!(source = source.as_str(), "location source came up empty");
        }

        tracing::info!("no location source produced a fix");
        None
    }

    async fn try_source(&self, source: FixSource) -> Option<LocationFix> {
        match source {
            FixSource::Ip => self.ip.locate().await,
            FixSource::DeviceFused => self.device_fix(DeviceProvider::Fused, source),
            FixSource::DeviceNetwork => self.device_fix(DeviceProvider::Network, source),
        }
    }

    fn device_fix(&self, provider: DeviceProvider, source: FixSource) -> Option<LocationFix> {
        if !self.device.permission_granted() {
            tracing::debug!(source = source.as_str(), "location permission not granted");
            return None;
        }

        match self.device.last_known(provider) {
            Ok(Some((latitude, longitude))) => Some(LocationFix {
                latitude,
                longitude,
                source,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(source = source.as_str(), "device location lookup failed: {}", e);
                None
            }
        }
    }
}
