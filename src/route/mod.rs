// src/route/mod.rs

mod model;

use std::fmt;

use chrono::NaiveDateTime;
use geo_types::Point;
use percent_encoding::{NON_ALPHANUMERIC, percent_encode};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::plan::TravelMode;
use crate::route::model::{CalculateRouteResponse, ProviderErrorPayload, SearchResponse};

/// Timestamp layout sent as `arriveAt`.
pub const ARRIVE_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ============================================================================
// Domain Types
// ============================================================================

/// Latitude/longitude in degrees. Rendered as `lat,lon` on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate(Point<f64>);

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self(Point::new(lon, lat))
    }

    pub fn lat(&self) -> f64 {
        self.0.y()
    }

    pub fn lon(&self) -> f64 {
        self.0.x()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat(), self.lon())
    }
}

/// Outcome of a geocoding request that reached the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    Found(Coordinate),
    NotFound,
}

/// A single arrival-constrained routing request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub start: Coordinate,
    pub end: Coordinate,
    pub arrive_at: NaiveDateTime,
    pub mode: TravelMode,
}

/// The part of the provider's first route that the planner uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSummary {
    pub travel_seconds: u64,
    pub length_meters: Option<u64>,
    pub traffic_delay_seconds: Option<u64>,
}

impl RouteSummary {
    pub fn from_seconds(travel_seconds: u64) -> Self {
        Self {
            travel_seconds,
            length_meters: None,
            traffic_delay_seconds: None,
        }
    }

    /// Distance and traffic delay line, when the provider reported either.
    pub fn details(&self) -> Option<String> {
        let km = self.length_meters.map(|m| m as f64 / 1000.0);
        let delay = self.traffic_delay_seconds.filter(|s| *s > 0).map(|s| s / 60);

        match (km, delay) {
            (Some(km), Some(mins)) => Some(format!(
                "🛣️  {km:.1} km, including {mins} mins of traffic delay"
            )),
            (Some(km), None) => Some(format!("🛣️  {km:.1} km")),
            (None, Some(mins)) => Some(format!("🚦 {mins} mins of traffic delay")),
            (None, None) => None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider returned no route")]
    NoRoute,

    #[error("unexpected response body: {0}")]
    Malformed(String),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RoutingError::Timeout
        } else {
            RoutingError::Transport(err)
        }
    }
}

// ============================================================================
// Provider Abstraction
// ============================================================================

pub trait RoutingProvider {
    /// Resolves a free-form address to the provider's best match.
    fn resolve_address(&self, address: &str) -> Result<Lookup, RoutingError>;

    /// Computes a traffic-aware route that arrives at `query.arrive_at`.
    fn compute_route(&self, query: &RouteQuery) -> Result<RouteSummary, RoutingError>;
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for &P {
    fn resolve_address(&self, address: &str) -> Result<Lookup, RoutingError> {
        (**self).resolve_address(address)
    }

    fn compute_route(&self, query: &RouteQuery) -> Result<RouteSummary, RoutingError> {
        (**self).compute_route(query)
    }
}

// ============================================================================
// TomTom Implementation
// ============================================================================

pub struct TomTomClient {
    client: Client,
    config: Config,
}

impl TomTomClient {
    pub fn new(config: Config) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn search_url(&self, address: &str) -> Result<Url, RoutingError> {
        let encoded = percent_encode(address.as_bytes(), NON_ALPHANUMERIC);
        Ok(Url::parse(&format!(
            "{}/{}.json",
            self.config.search_url, encoded
        ))?)
    }

    fn routing_url(&self, start: Coordinate, end: Coordinate) -> Result<Url, RoutingError> {
        Ok(Url::parse(&format!(
            "{}/{start}:{end}/json",
            self.config.routing_url
        ))?)
    }

    /// Checks the status and decodes the body, keeping provider detail for logs.
    fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, RoutingError> {
        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorPayload>(&text)
                .ok()
                .and_then(|payload| payload.message())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(RoutingError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| RoutingError::Malformed(e.to_string()))
    }
}

impl RoutingProvider for TomTomClient {
    fn resolve_address(&self, address: &str) -> Result<Lookup, RoutingError> {
        let url = self.search_url(address)?;
        tracing::debug!(url = %url, "Geocoding address");

        let resp = self
            .client
            .get(url)
            .query(&[("key", self.config.api_key.as_str()), ("limit", "1")])
            .send()?;
        let body: SearchResponse = Self::decode(resp)?;

        Ok(match body.results.first() {
            Some(result) => {
                let pos = result.position;
                Lookup::Found(Coordinate::new(pos.lat, pos.lon))
            }
            None => Lookup::NotFound,
        })
    }

    fn compute_route(&self, query: &RouteQuery) -> Result<RouteSummary, RoutingError> {
        let url = self.routing_url(query.start, query.end)?;
        let arrive_at = query.arrive_at.format(ARRIVE_AT_FORMAT).to_string();
        tracing::debug!(url = %url, arrive_at = %arrive_at, mode = %query.mode, "Requesting route");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("arriveAt", arrive_at.as_str()),
                ("traffic", "true"),
                ("travelMode", query.mode.as_str()),
            ])
            .send()?;
        let body: CalculateRouteResponse = Self::decode(resp)?;

        let route = body
            .routes
            .and_then(|routes| routes.into_iter().next())
            .ok_or(RoutingError::NoRoute)?;

        Ok(RouteSummary {
            travel_seconds: route.summary.travel_time_in_seconds,
            length_meters: route.summary.length_in_meters,
            traffic_delay_seconds: route.summary.traffic_delay_in_seconds,
        })
    }
}
