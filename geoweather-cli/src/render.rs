//! Human-readable output. Missing upstream fields print as `n/a`.

use chrono::FixedOffset;
use geoweather_core::{GeocodeResult, WeatherSnapshot};
use std::fmt::Display;

const NOT_AVAILABLE: &str = "n/a";

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

fn celsius(value: Option<i64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |c| format!("{c} C"))
}

/// Observation time in the location's own offset when known, otherwise UTC.
fn observed(snapshot: &WeatherSnapshot) -> String {
    let Some(at) = snapshot.observed_at() else {
        return NOT_AVAILABLE.to_string();
    };

    match snapshot
        .timezone_offset
        .and_then(|secs| i32::try_from(secs).ok())
        .and_then(FixedOffset::east_opt)
    {
        Some(offset) => at.with_timezone(&offset).format("%Y-%m-%d %H:%M %:z").to_string(),
        None => at.format("%Y-%m-%d %H:%M UTC").to_string(),
    }
}

pub fn snapshot(snapshot: &WeatherSnapshot) -> String {
    let condition = snapshot.primary_condition();
    let main = snapshot.main_metrics.as_ref();

    let rows = [
        ("City", or_na(snapshot.location_name.as_deref())),
        ("Weather", or_na(condition.and_then(|c| c.main.as_deref()))),
        ("Description", or_na(condition.and_then(|c| c.description.as_deref()))),
        ("Temperature", celsius(main.and_then(|m| m.temp_celsius()))),
        ("Feels like", celsius(main.and_then(|m| m.feels_like_celsius()))),
        ("Min temp", celsius(main.and_then(|m| m.temp_min_celsius()))),
        ("Max temp", celsius(main.and_then(|m| m.temp_max_celsius()))),
        ("Icon", or_na(condition.and_then(|c| c.icon_url()))),
        ("Observed", observed(snapshot)),
    ];

    rows.iter()
        .map(|(label, value)| format!("{:<13}{value}", format!("{label}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn geocode_match(result: &GeocodeResult) -> String {
    let place = [result.name.as_deref(), result.state.as_deref(), result.country.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
    let place = if place.is_empty() { NOT_AVAILABLE.to_string() } else { place };

    match result.coordinate() {
        Some(coordinate) => format!("{place} ({coordinate})"),
        None => format!("{place} (no coordinate)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoweather_core::model::{Condition, MainMetrics};

    fn london() -> WeatherSnapshot {
        WeatherSnapshot {
            conditions: vec![Condition {
                id: Some(500),
                main: Some("Rain".into()),
                description: Some("light rain".into()),
                icon: Some("10d".into()),
            }],
            main_metrics: Some(MainMetrics {
                temp: Some(285.0),
                feels_like: Some(284.2),
                temp_min: Some(283.0),
                temp_max: Some(286.5),
                ..MainMetrics::default()
            }),
            observation_time: Some(1_700_000_000),
            timezone_offset: Some(3600),
            location_name: Some("London".into()),
            ..WeatherSnapshot::default()
        }
    }

    #[test]
    fn renders_celsius_and_icon() {
        let out = snapshot(&london());

        assert!(out.contains("City:        London"));
        assert!(out.contains("Weather:     Rain"));
        assert!(out.contains("Description: light rain"));
        assert!(out.contains("Temperature: 12 C"));
        assert!(out.contains("Feels like:  11 C"));
        assert!(out.contains("Min temp:    10 C"));
        assert!(out.contains("Max temp:    13 C"));
        assert!(out.contains("Icon:        https://openweathermap.org/img/wn/10d.png"));
        assert!(out.contains("Observed:    2023-11-14 23:13 +01:00"));
    }

    #[test]
    fn absent_fields_render_as_not_available() {
        let out = snapshot(&WeatherSnapshot::default());

        assert!(out.contains("City:        n/a"));
        assert!(out.contains("Weather:     n/a"));
        assert!(out.contains("Temperature: n/a"));
        assert!(out.contains("Icon:        n/a"));
        assert!(out.contains("Observed:    n/a"));
    }

    #[test]
    fn observed_falls_back_to_utc() {
        let mut snap = london();
        snap.timezone_offset = None;

        assert!(snapshot(&snap).contains("Observed:    2023-11-14 22:13 UTC"));
    }

    #[test]
    fn geocode_match_lists_known_parts() {
        let full = GeocodeResult {
            name: Some("Springfield".into()),
            latitude: Some(39.8),
            longitude: Some(-89.64),
            country: Some("US".into()),
            state: Some("Illinois".into()),
        };
        assert_eq!(geocode_match(&full), "Springfield, Illinois, US (39.8, -89.64)");

        assert_eq!(geocode_match(&GeocodeResult::default()), "n/a (no coordinate)");
    }
}
