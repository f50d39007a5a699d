//! HTTP client for the weather API.

use tracing::instrument;

use crate::error::FetchError;
use crate::types::{ApiErrorBody, ForecastSnapshot, WeatherSnapshot};

const WEATHER_API_BASE: &str = "https://api.openweathermap.org/data";

/// Sections of the one-call document the forecast pipeline never reads.
const FORECAST_EXCLUDE: &str = "minutely,hourly,alerts,current";

/// Thin client over the two weather endpoints. Requests are single-shot:
/// no retries, no added timeouts beyond the transport's own.
#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new() -> Self {
        Self::with_base_url(WEATHER_API_BASE)
    }

    /// Point the client at a non-default API base, for config overrides
    /// and tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Current conditions at the given coordinates, metric units.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Auth` when the key is rejected, `FetchError::Api`
    /// for other non-2xx statuses, and `FetchError::Transport` or
    /// `FetchError::Decode` when the exchange itself fails.
    #[instrument(skip(self, api_key), level = "info")]
    pub async fn current(
        &self,
        lat: f64,
        lon: f64,
        api_key: &str,
    ) -> Result<WeatherSnapshot, FetchError> {
        let url = format!(
            "{}/2.5/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            lat,
            lon,
            urlencoding::encode(api_key)
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Daily forecast at the given coordinates, metric units.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`WeatherClient::current`].
    #[instrument(skip(self, api_key), level = "info")]
    pub async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        api_key: &str,
    ) -> Result<ForecastSnapshot, FetchError> {
        let url = format!(
            "{}/3.0/onecall?lat={}&lon={}&exclude={}&appid={}&units=metric",
            self.base_url,
            lat,
            lon,
            FORECAST_EXCLUDE,
            urlencoding::encode(api_key)
        );

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| FetchError::Decode(format!("JSON parse error: {e}")))
        } else {
            let code = status.as_u16();
            let text = response.text().await.unwrap_or_default();
            // The API wraps errors in a small JSON body; fall back to the
            // raw text when it does not.
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(text);

            if code == 401 {
                Err(FetchError::Auth { code, message })
            } else {
                Err(FetchError::Api { status: code, message })
            }
        }
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}
