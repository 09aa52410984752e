use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Base of the OpenWeather condition icon images.
pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Difference between the kelvin and Celsius scales, in hundredths of a degree.
const KELVIN_OFFSET_CENTI: i64 = 27_315;

/// Convert an upstream kelvin reading into whole degrees Celsius.
///
/// Computes `round(kelvin - 273.15)` with round-half-up (toward +inf). The
/// subtraction is done on hundredths of a kelvin so two-decimal upstream
/// values land exactly on the .5 boundary instead of drifting in binary.
/// Readings beyond the `i64` range saturate.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    let centi = ((kelvin * 100.0).round() as i64).saturating_sub(KELVIN_OFFSET_CENTI);
    centi.saturating_add(50).div_euclid(100)
}

/// A complete lat/lon pair, as accepted by the weather lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// The `coord` object of a weather payload; either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coord {
    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat?, self.lon?))
    }
}

/// One place match from the direct geocoding endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeResult {
    pub name: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: Option<f64>,
    #[serde(rename = "lon")]
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl GeocodeResult {
    /// Both halves of the coordinate, or nothing.
    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl Condition {
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_deref()
            .map(|icon| format!("{ICON_BASE_URL}/{icon}.png"))
    }
}

/// Temperatures are kelvin as delivered upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainMetrics {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<i64>,
    pub humidity: Option<i64>,
    pub sea_level: Option<i64>,
    pub grnd_level: Option<i64>,
}

impl MainMetrics {
    pub fn temp_celsius(&self) -> Option<i64> {
        self.temp.map(kelvin_to_celsius)
    }

    pub fn feels_like_celsius(&self) -> Option<i64> {
        self.feels_like.map(kelvin_to_celsius)
    }

    pub fn temp_min_celsius(&self) -> Option<i64> {
        self.temp_min.map(kelvin_to_celsius)
    }

    pub fn temp_max_celsius(&self) -> Option<i64> {
        self.temp_max.map(kelvin_to_celsius)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wind {
    pub speed: Option<f64>,
    pub deg: Option<i64>,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rain {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clouds {
    pub all: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sys {
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub id: Option<i64>,
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Current conditions at a coordinate, as returned by `/data/2.5/weather`.
///
/// Any field may be missing upstream; an empty `conditions` list is valid
/// but leaves nothing to describe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub coord: Option<Coord>,
    #[serde(rename = "weather", deserialize_with = "null_as_empty")]
    pub conditions: Vec<Condition>,
    pub base: Option<String>,
    #[serde(rename = "main")]
    pub main_metrics: Option<MainMetrics>,
    pub visibility: Option<i64>,
    pub wind: Option<Wind>,
    pub rain: Option<Rain>,
    pub clouds: Option<Clouds>,
    #[serde(rename = "dt")]
    pub observation_time: Option<i64>,
    pub sys: Option<Sys>,
    #[serde(rename = "timezone")]
    pub timezone_offset: Option<i64>,
    #[serde(rename = "id")]
    pub observation_id: Option<i64>,
    #[serde(rename = "name")]
    pub location_name: Option<String>,
    #[serde(rename = "cod")]
    pub response_code: Option<i64>,
}

impl WeatherSnapshot {
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coord.as_ref().and_then(Coord::coordinate)
    }

    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.observation_time.and_then(unix_to_utc)
    }
}

/// Explicit `null` lists read as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
