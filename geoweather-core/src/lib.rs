//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather geocoding and current-weather client
//! - The place name -> coordinate -> weather resolution pipeline
//! - The view states published while a resolution runs
//!
//! It is used by `geoweather-cli`, but can also be embedded in other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod state;

pub use client::{OpenWeatherClient, WeatherApi, client_from_config};
pub use config::Config;
pub use error::{ApiError, NO_MATCH_MESSAGE, ResolveError};
pub use model::{Coordinate, GeocodeResult, WeatherSnapshot, kelvin_to_celsius};
pub use pipeline::Resolver;
pub use state::ViewState;
