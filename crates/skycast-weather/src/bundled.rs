//! Bundled forecast document used when the remote service is unreachable.

use crate::error::FetchError;
use crate::types::ForecastSnapshot;

/// Eight-day sample document shipped with the binary.
const FORECAST_SAMPLE: &str = include_str!("../assets/forecast_sample.json");

/// Decode the bundled forecast document.
///
/// # Errors
///
/// Returns `FetchError::Decode` if the shipped asset does not parse, which
/// would mean a packaging defect rather than a runtime condition.
pub fn load() -> Result<ForecastSnapshot, FetchError> {
    serde_json::from_str(FORECAST_SAMPLE)
        .map_err(|e| FetchError::Decode(format!("bundled forecast: {e}")))
}
