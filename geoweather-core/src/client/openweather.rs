use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    error::ApiError,
    model::{Coordinate, GeocodeResult, WeatherSnapshot},
};

use super::{DEFAULT_BASE_URL, WeatherApi};

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const WEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| {
                let err = ApiError::from(err);
                warn!(%url, error = %err, "OpenWeather request failed");
                err
            })?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%url, %status, body = %truncate_body(&body), "OpenWeather returned an error status");
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|err| {
            warn!(%url, error = %err, "failed to parse OpenWeather response");
            ApiError::from(err)
        })
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn geocode(&self, query: &str, limit: &str) -> Result<Vec<GeocodeResult>, ApiError> {
        self.fetch(GEOCODE_PATH, &[("q", query), ("limit", limit)]).await
    }

    async fn get_weather(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, ApiError> {
        let lat = coordinate.lat.to_string();
        let lon = coordinate.lon.to_string();
        self.fetch(WEATHER_PATH, &[("lat", lat.as_str()), ("lon", lon.as_str())])
            .await
    }
}

/// Error body OpenWeather sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

/// Prefer the service's own message, then the reason phrase, then the bare code.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| status.as_u16().to_string());

    ApiError::Status { status: status.as_u16(), message }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
