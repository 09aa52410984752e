//! Place name to coordinate to current weather.
//!
//! A [`Resolver`] owns its [`WeatherApi`] and publishes [`ViewState`]s to
//! subscribers. Stage two only runs on stage one's result, and nothing is
//! retried or cached: each call is a fresh round trip.
//!
//! Starting a resolution supersedes any still in flight. A superseded
//! resolution stops publishing, makes no further upstream calls and returns
//! [`ResolveError::Superseded`], so the newest request always owns the
//! observed state.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    client::{DEFAULT_GEOCODE_LIMIT, WeatherApi},
    error::ResolveError,
    model::{Coordinate, WeatherSnapshot},
    state::{StateChannel, Ticket, ViewState},
};

#[derive(Debug)]
pub struct Resolver<A> {
    api: A,
    states: StateChannel,
}

impl<A: WeatherApi> Resolver<A> {
    pub fn new(api: A) -> Self {
        Self { api, states: StateChannel::new() }
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    /// Receiver of every published state; holds `None` until the first resolution starts.
    pub fn subscribe(&self) -> watch::Receiver<Option<ViewState>> {
        self.states.subscribe()
    }

    pub fn current(&self) -> Option<ViewState> {
        self.states.current()
    }

    /// Geocode `query`, then fetch weather for the first match.
    pub async fn resolve_by_place_name(&self, query: &str) -> Result<WeatherSnapshot, ResolveError> {
        let ticket = self.states.begin();
        info!(query, "resolving place name");

        let matches = match self.api.geocode(query, DEFAULT_GEOCODE_LIMIT).await {
            Ok(matches) => matches,
            Err(err) => return Err(self.fail(ticket, err.into())),
        };

        let Some(first) = matches.first() else {
            return Err(self.fail(ticket, ResolveError::NoMatch));
        };
        let Some(coordinate) = first.coordinate() else {
            return Err(self.fail(ticket, ResolveError::MissingCoordinate));
        };

        debug!(query, %coordinate, matched = ?first.name, "geocoded place name");

        // Stage two re-enters Loading exactly like a direct coordinate lookup.
        if !self.states.publish(ticket, ViewState::Loading) {
            return Err(self.superseded(ticket));
        }
        self.fetch_weather(ticket, coordinate).await
    }

    /// Fetch weather for a known coordinate, skipping geocoding.
    pub async fn resolve_by_coordinate(
        &self,
        coordinate: Coordinate,
    ) -> Result<WeatherSnapshot, ResolveError> {
        let ticket = self.states.begin();
        info!(%coordinate, "resolving coordinate");

        self.fetch_weather(ticket, coordinate).await
    }

    async fn fetch_weather(
        &self,
        ticket: Ticket,
        coordinate: Coordinate,
    ) -> Result<WeatherSnapshot, ResolveError> {
        let snapshot = match self.api.get_weather(coordinate).await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(self.fail(ticket, err.into())),
        };

        if !self.states.publish(ticket, ViewState::Data(snapshot.clone())) {
            return Err(self.superseded(ticket));
        }

        info!(%coordinate, location = ?snapshot.location_name, "resolved weather");
        Ok(snapshot)
    }

    fn fail(&self, ticket: Ticket, err: ResolveError) -> ResolveError {
        if !self.states.publish(ticket, ViewState::Error(err.to_string())) {
            return self.superseded(ticket);
        }

        warn!(error = %err, "resolution failed");
        err
    }

    fn superseded(&self, ticket: Ticket) -> ResolveError {
        debug!(?ticket, "dropping result of superseded resolution");
        ResolveError::Superseded
    }
}
