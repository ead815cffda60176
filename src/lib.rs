//! Commute planner: geocodes two addresses with TomTom, asks for a
//! traffic-aware route that arrives at a given time, and reports when to leave.

pub mod app;
pub mod config;
pub mod plan;
pub mod route;
pub mod utils;

pub use app::{ExitReason, Planner, Stage};
pub use config::{Config, ConfigError};
pub use plan::{CommutePlan, TravelMode};
pub use route::{
    Coordinate, Lookup, RouteQuery, RouteSummary, RoutingError, RoutingProvider, TomTomClient,
};
