use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use geoweather_core::{
    ApiError, Config, Coordinate, ResolveError, Resolver, ViewState, WeatherApi, WeatherSnapshot,
    client_from_config,
};
use inquire::{Password, PasswordDisplayMode};
use std::io::{self, Write};
use tracing::warn;

use crate::{logging::LogLevel, render};

const EMPTY_QUERY_MESSAGE: &str = "Please enter city name/state code/country code";

const CREDENTIALS_HINT: &str = "Hint: run `geoweather configure` and check your API key.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Current weather for a city or coordinate")]
pub struct Cli {
    /// Log verbosity; logs are written to stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key (prompts when --api-key is absent).
    Configure {
        #[arg(long)]
        api_key: Option<String>,

        /// Alternative OpenWeather host, e.g. a local proxy.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show current weather for a place, or for a coordinate with --lat/--lon.
    Show {
        /// City name, optionally "name,state,country". Defaults to the last city shown.
        #[arg(conflicts_with_all = ["lat", "lon"])]
        query: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// List the places a query geocodes to.
    Geocode {
        query: String,

        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

/// What `show` should resolve.
#[derive(Debug, Clone, PartialEq)]
enum Target {
    Place(String),
    Coordinate(Coordinate),
}

impl Target {
    /// A coordinate wins; otherwise the query, or the remembered city when no query was given.
    fn pick(
        query: Option<&str>,
        coordinate: Option<Coordinate>,
        last_city: Option<&str>,
    ) -> Result<Self> {
        if let Some(coordinate) = coordinate {
            return Ok(Target::Coordinate(coordinate));
        }

        query
            .or(last_city)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| Target::Place(q.to_string()))
            .ok_or_else(|| anyhow!(EMPTY_QUERY_MESSAGE))
    }

    async fn resolve<A: WeatherApi>(
        &self,
        resolver: &Resolver<A>,
    ) -> Result<WeatherSnapshot, ResolveError> {
        match self {
            Target::Place(query) => resolver.resolve_by_place_name(query).await,
            Target::Coordinate(coordinate) => resolver.resolve_by_coordinate(*coordinate).await,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Place(query) => f.write_str(query),
            Target::Coordinate(coordinate) => write!(f, "{coordinate}"),
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { api_key, base_url } => configure(api_key, base_url),
            Command::Show { query, lat, lon } => {
                show(query.as_deref(), lat.zip(lon).map(|(lat, lon)| Coordinate::new(lat, lon)))
                    .await
            }
            Command::Geocode { query, limit } => geocode(&query, limit).await,
        }
    }
}

fn configure(api_key: Option<String>, base_url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read API key")?,
    };
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.to_string());
    if let Some(base_url) = base_url {
        config.base_url = Some(base_url);
    }
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(query: Option<&str>, coordinate: Option<Coordinate>) -> Result<()> {
    let mut config = Config::load()?;
    let target = Target::pick(query, coordinate, config.last_city())?;
    let resolver = Resolver::new(client_from_config(&config)?);

    let previous = config.last_city.clone();
    let snapshot = show_with(&resolver, &target, &mut config, &mut io::stderr()).await?;
    println!("{}", render::snapshot(&snapshot));

    if config.last_city != previous {
        if let Err(err) = config.save() {
            warn!(error = %err, "could not remember last city");
        }
    }
    Ok(())
}

/// Follow one resolution, announcing `Loading` on `progress` once.
///
/// On `Data` the resolved name becomes `config`'s last city (in memory only);
/// on `Error` the published message is returned as the error.
async fn show_with<A: WeatherApi>(
    resolver: &Resolver<A>,
    target: &Target,
    config: &mut Config,
    progress: &mut impl Write,
) -> Result<WeatherSnapshot> {
    let mut states = resolver.subscribe();
    let resolution = target.resolve(resolver);
    tokio::pin!(resolution);

    let mut announced = false;
    let outcome = loop {
        tokio::select! {
            biased;

            Ok(()) = states.changed() => {
                let loading = states
                    .borrow_and_update()
                    .as_ref()
                    .is_some_and(|state| !state.is_terminal());
                if loading && !announced {
                    writeln!(progress, "Loading weather for {target}...")
                        .context("Failed to write progress")?;
                    announced = true;
                }
            }
            outcome = &mut resolution => break outcome,
        }
    };

    match resolver.current() {
        Some(ViewState::Data(snapshot)) => {
            if let Some(name) = snapshot.location_name.as_deref() {
                config.remember_city(name);
            }
            Ok(snapshot)
        }
        Some(ViewState::Error(message)) => {
            let cause = match &outcome {
                Err(ResolveError::Transport(err)) => Some(err),
                _ => None,
            };
            Err(upstream_error(message, cause))
        }
        _ => outcome.map_err(Into::into),
    }
}

/// Rejected credentials get a pointer to `configure`.
fn upstream_error(message: String, cause: Option<&ApiError>) -> anyhow::Error {
    match cause.and_then(ApiError::status) {
        Some(401) => anyhow!("{message}\n{CREDENTIALS_HINT}"),
        _ => anyhow!(message),
    }
}

async fn geocode(query: &str, limit: u32) -> Result<()> {
    let config = Config::load()?;
    let client = client_from_config(&config)?;

    let matches = client
        .geocode(query.trim(), &limit.to_string())
        .await
        .map_err(|err| upstream_error(err.to_string(), Some(&err)))?;
    if matches.is_empty() {
        println!("No places match '{query}'");
    }
    for result in &matches {
        println!("{}", render::geocode_match(result));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::CommandFactory;
    use geoweather_core::{GeocodeResult, NO_MATCH_MESSAGE};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn coordinate_takes_precedence() {
        let target = Target::pick(Some("London"), Some(Coordinate::new(1.0, 2.0)), None).unwrap();
        assert_eq!(target, Target::Coordinate(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn query_is_trimmed() {
        let target = Target::pick(Some("  Paris,FR "), None, Some("London")).unwrap();
        assert_eq!(target, Target::Place("Paris,FR".into()));
    }

    #[test]
    fn last_city_is_used_without_query() {
        let target = Target::pick(None, None, Some("London")).unwrap();
        assert_eq!(target, Target::Place("London".into()));
    }

    #[test]
    fn blank_query_is_rejected() {
        let err = Target::pick(Some("   "), None, Some("London")).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_QUERY_MESSAGE);

        let err = Target::pick(None, None, None).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_QUERY_MESSAGE);
    }

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["geoweather", "show", "--lat", "51.51", "--lon", "-0.13"])
            .expect("parses");

        match cli.command {
            Command::Show { query, lat, lon } => {
                assert_eq!(query, None);
                assert_eq!(lat, Some(51.51));
                assert_eq!(lon, Some(-0.13));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["geoweather", "show", "--lat", "51.51"]).is_err());
    }

    #[test]
    fn log_level_defaults_to_warn() {
        let cli = Cli::try_parse_from(["geoweather", "geocode", "London"]).expect("parses");
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    /// Answers every call after one scheduler yield, like a real round trip.
    #[derive(Debug)]
    struct StubApi {
        places: Vec<GeocodeResult>,
        weather: Result<WeatherSnapshot, ApiError>,
    }

    #[async_trait]
    impl WeatherApi for StubApi {
        async fn geocode(
            &self,
            _query: &str,
            _limit: &str,
        ) -> Result<Vec<GeocodeResult>, ApiError> {
            tokio::task::yield_now().await;
            Ok(self.places.clone())
        }

        async fn get_weather(&self, _coordinate: Coordinate) -> Result<WeatherSnapshot, ApiError> {
            tokio::task::yield_now().await;
            self.weather.clone()
        }
    }

    fn london() -> GeocodeResult {
        GeocodeResult {
            name: Some("London".into()),
            latitude: Some(51.51),
            longitude: Some(-0.13),
            country: Some("GB".into()),
            state: None,
        }
    }

    fn named(name: Option<&str>) -> WeatherSnapshot {
        WeatherSnapshot { location_name: name.map(Into::into), ..WeatherSnapshot::default() }
    }

    fn config_remembering(city: &str) -> Config {
        let mut config = Config::default();
        config.remember_city(city);
        config
    }

    #[tokio::test]
    async fn data_announces_loading_once_and_remembers_city() {
        let resolver =
            Resolver::new(StubApi { places: vec![london()], weather: Ok(named(Some("London"))) });
        let mut config = config_remembering("Paris");
        let mut progress = Vec::new();

        let target = Target::Place("London".into());
        let snapshot = show_with(&resolver, &target, &mut config, &mut progress)
            .await
            .expect("resolves");

        assert_eq!(snapshot, named(Some("London")));
        assert_eq!(config.last_city(), Some("London"));
        assert_eq!(String::from_utf8(progress).unwrap(), "Loading weather for London...\n");
    }

    #[tokio::test]
    async fn error_is_returned_and_city_is_kept() {
        let resolver =
            Resolver::new(StubApi { places: vec![], weather: Ok(named(Some("Nowhere"))) });
        let mut config = config_remembering("Paris");
        let mut progress = Vec::new();

        let target = Target::Place("asdkjhasd".into());
        let err = show_with(&resolver, &target, &mut config, &mut progress)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), NO_MATCH_MESSAGE);
        assert_eq!(config.last_city(), Some("Paris"));
        assert!(String::from_utf8(progress).unwrap().starts_with("Loading weather for asdkjhasd"));
    }

    #[tokio::test]
    async fn unnamed_snapshot_keeps_remembered_city() {
        let resolver = Resolver::new(StubApi { places: vec![], weather: Ok(named(None)) });
        let mut config = config_remembering("Paris");

        let target = Target::Coordinate(Coordinate::new(1.0, 2.0));
        show_with(&resolver, &target, &mut config, &mut io::sink())
            .await
            .expect("resolves");

        assert_eq!(config.last_city(), Some("Paris"));
    }

    #[tokio::test]
    async fn rejected_key_points_at_configure() {
        let unauthorized = ApiError::Status { status: 401, message: "Invalid API key.".into() };
        let resolver =
            Resolver::new(StubApi { places: vec![london()], weather: Err(unauthorized) });
        let mut config = Config::default();

        let target = Target::Place("London".into());
        let err = show_with(&resolver, &target, &mut config, &mut io::sink())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), format!("Invalid API key.\n{CREDENTIALS_HINT}"));
        assert_eq!(config.last_city(), None);
    }

    #[test]
    fn other_failures_carry_no_hint() {
        let offline = ApiError::Network("connection refused".into());
        assert_eq!(
            upstream_error("connection refused".into(), Some(&offline)).to_string(),
            "connection refused"
        );
        assert_eq!(upstream_error("boom".into(), None).to_string(), "boom");
    }
}
