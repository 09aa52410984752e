use crate::{
    Config,
    error::ApiError,
    model::{Coordinate, GeocodeResult, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Public OpenWeather host used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Result count requested when resolving a place name; only the first match is used.
pub const DEFAULT_GEOCODE_LIMIT: &str = "1";

/// Read-only access to the geocoding and current-weather endpoints.
///
/// Implementations do no filtering, validation or caching: whatever the
/// service answers is handed back, and every failure is an [`ApiError`].
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn geocode(&self, query: &str, limit: &str) -> Result<Vec<GeocodeResult>, ApiError>;

    async fn get_weather(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, ApiError>;
}

/// Construct the OpenWeather client from the stored credentials and base URL.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.api_key()?;
    Ok(OpenWeatherClient::with_base_url(config.base_url(), api_key))
}
