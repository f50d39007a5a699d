//! Snapshot types decoded from the weather API and persisted in the cache.
//!
//! Every field is optional: the service omits blocks freely depending on
//! station coverage, and a snapshot that decodes with gaps is still worth
//! caching. Unknown fields are ignored on decode.

use serde::{Deserialize, Serialize};

/// Current conditions at one place, as reported by the weather endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// City identifier assigned by the weather service.
    #[serde(rename = "id")]
    pub city_id: Option<i64>,
    /// Human-readable city name.
    #[serde(rename = "name")]
    pub city_name: Option<String>,
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Option<MainReadings>,
    /// Visibility in metres.
    pub visibility: Option<i64>,
    pub wind: Option<Wind>,
    pub clouds: Option<Clouds>,
    /// Observation time, unix epoch seconds.
    #[serde(rename = "dt")]
    pub observed_at: Option<i64>,
    pub sys: Option<SysBlock>,
    /// Shift from UTC in seconds.
    pub timezone: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

/// One reported condition: numeric code, group, description and icon code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Temperature and atmosphere block. Temperatures are degrees Celsius,
/// pressure is hPa, humidity is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<i64>,
    pub humidity: Option<i64>,
    pub sea_level: Option<i64>,
    pub grnd_level: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Metres per second.
    pub speed: Option<f64>,
    /// Meteorological degrees.
    pub deg: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    /// Cloud cover percentage.
    pub all: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SysBlock {
    pub country: Option<String>,
    /// Unix epoch seconds.
    pub sunrise: Option<i64>,
    /// Unix epoch seconds.
    pub sunset: Option<i64>,
}

/// Daily forecast document from the one-call endpoint, minutely and hourly
/// sections excluded at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// IANA timezone name, e.g. `Europe/London`.
    pub timezone: Option<String>,
    pub timezone_offset: Option<i64>,
    #[serde(default)]
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Forecast day, unix epoch seconds at local noon.
    #[serde(rename = "dt")]
    pub day: Option<i64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temp: Option<TempRange>,
    pub feels_like: Option<FeelsLike>,
    pub pressure: Option<i64>,
    pub humidity: Option<i64>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<i64>,
    pub clouds: Option<i64>,
    /// Probability of precipitation, 0.0 to 1.0.
    pub pop: Option<f64>,
    pub uvi: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempRange {
    pub day: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeelsLike {
    pub day: Option<f64>,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

/// Error payload the weather API attaches to non-2xx responses. Only the
/// message is read; the status code comes from the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    const CURRENT_SAMPLE: &str = r#"{
        "coord": {"lon": -0.1257, "lat": 51.5085},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "base": "stations",
        "main": {"temp": 12.74, "feels_like": 12.2, "temp_min": 11.16, "temp_max": 13.93,
                 "pressure": 1018, "humidity": 81},
        "visibility": 10000,
        "wind": {"speed": 4.12, "deg": 240},
        "clouds": {"all": 75},
        "dt": 1696248000,
        "sys": {"type": 2, "id": 2075535, "country": "GB", "sunrise": 1696226691, "sunset": 1696268479},
        "timezone": 3600,
        "id": 2643743,
        "name": "London",
        "cod": 200
    }"#;

    #[test]
    fn test_current_snapshot_decodes_live_shape() {
        let snapshot: WeatherSnapshot = serde_json::from_str(CURRENT_SAMPLE).unwrap();

        assert_eq!(snapshot.city_name.as_deref(), Some("London"));
        assert_eq!(snapshot.city_id, Some(2643743));
        assert_eq!(snapshot.weather.len(), 1);
        assert_eq!(snapshot.weather[0].description.as_deref(), Some("broken clouds"));
        assert_eq!(snapshot.main.unwrap().temp, Some(12.74));
        assert_eq!(snapshot.sys.unwrap().country.as_deref(), Some("GB"));
    }

    #[test]
    fn test_current_snapshot_tolerates_missing_blocks() {
        let snapshot: WeatherSnapshot = serde_json::from_str("{}").unwrap();

        assert!(snapshot.city_name.is_none());
        assert!(snapshot.weather.is_empty());
        assert!(snapshot.main.is_none());
    }

    #[test]
    fn test_current_snapshot_round_trips_through_json() {
        let snapshot: WeatherSnapshot = serde_json::from_str(CURRENT_SAMPLE).unwrap();
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: WeatherSnapshot = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_forecast_snapshot_decodes_daily_entries() {
        let doc = r#"{
            "lat": 51.5085, "lon": -0.1257,
            "timezone": "Europe/London", "timezone_offset": 3600,
            "daily": [{
                "dt": 1696248000, "sunrise": 1696226691, "sunset": 1696268479,
                "temp": {"day": 13.5, "min": 9.2, "max": 14.1, "night": 10.0, "eve": 12.3, "morn": 9.4},
                "feels_like": {"day": 12.8, "night": 9.5, "eve": 11.9, "morn": 8.8},
                "pressure": 1018, "humidity": 77,
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                "wind_speed": 5.3, "wind_deg": 230, "clouds": 80, "pop": 0.62, "uvi": 2.1
            }]
        }"#;

        let snapshot: ForecastSnapshot = serde_json::from_str(doc).unwrap();

        assert_eq!(snapshot.timezone.as_deref(), Some("Europe/London"));
        assert_eq!(snapshot.daily.len(), 1);
        let day = &snapshot.daily[0];
        assert_eq!(day.temp.unwrap().max, Some(14.1));
        assert_eq!(day.pop, Some(0.62));
        assert_eq!(day.weather[0].main.as_deref(), Some("Rain"));
    }

    #[test]
    fn test_error_body_reads_message_only() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"cod": 401, "message": "Invalid API key"}"#).unwrap();

        assert_eq!(body.message.as_deref(), Some("Invalid API key"));
    }
}
