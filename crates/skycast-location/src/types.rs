/// Where a location fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixSource {
    Ip,
    DeviceFused,
    DeviceNetwork,
}

impl FixSource {
    /// Stable tag for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FixSource::Ip => "ip",
            FixSource::DeviceFused => "device-fused",
            FixSource::DeviceNetwork => "device-network",
        }
    }
}

impl std::fmt::Display for FixSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved geographic position. Held in memory for the duration of a
/// refresh cycle, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub source: FixSource,
}

/// Device-side providers that can hold a last known position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProvider {
    Fused,
    Network,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}
