// src/route/model.rs

use serde::Deserialize;

// ============================================================================
// Search API (geocoding)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub position: Position,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

// ============================================================================
// Routing API
// ============================================================================

/// `routes` is optional: the provider omits it when no route can be built.
#[derive(Debug, Deserialize)]
pub struct CalculateRouteResponse {
    pub routes: Option<Vec<Route>>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    pub summary: RouteSummaryWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummaryWire {
    pub travel_time_in_seconds: u64,
    #[serde(default)]
    pub length_in_meters: Option<u64>,
    #[serde(default)]
    pub traffic_delay_in_seconds: Option<u64>,
}

/// Error envelope returned alongside non-2xx routing responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorPayload {
    pub detailed_error: Option<DetailedError>,
    pub error: Option<DetailedError>,
}

#[derive(Debug, Deserialize)]
pub struct DetailedError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
}

impl ProviderErrorPayload {
    pub fn message(&self) -> Option<String> {
        let detail = self.detailed_error.as_ref().or(self.error.as_ref())?;
        detail
            .message
            .clone()
            .or_else(|| detail.description.clone())
            .or_else(|| detail.code.clone())
    }
}
