// src/plan/mod.rs

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use thiserror::Error;

// ============================================================================
// Travel Mode
// ============================================================================

/// Mode of transport sent to the routing provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TravelMode {
    #[default]
    Car,
    Bicycle,
    Pedestrian,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown travel mode '{0}'")]
pub struct UnknownTravelMode(pub String);

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Car, TravelMode::Bicycle, TravelMode::Pedestrian];

    /// Provider token, also what the user types.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Car => "car",
            TravelMode::Bicycle => "bicycle",
            TravelMode::Pedestrian => "pedestrian",
        }
    }
}

impl FromStr for TravelMode {
    type Err = UnknownTravelMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or(UnknownTravelMode(normalized))
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Commute Plan
// ============================================================================

/// Travel time and the latest departure that still meets the arrival time.
///
/// The arrival timestamp is carried as-is; no timezone conversion happens,
/// so the departure is expressed in the same wall-clock frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommutePlan {
    travel_seconds: u64,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
}

impl CommutePlan {
    pub fn new(travel_seconds: u64, arrival: NaiveDateTime) -> Self {
        // Saturates instead of overflowing on absurd provider values.
        let delta = TimeDelta::try_seconds(travel_seconds.min(i64::MAX as u64 / 1000) as i64)
            .unwrap_or(TimeDelta::MAX);
        let departure = arrival.checked_sub_signed(delta).unwrap_or(NaiveDateTime::MIN);

        Self {
            travel_seconds,
            arrival,
            departure,
        }
    }

    /// Whole minutes of travel, rounded down.
    pub fn minutes(&self) -> u64 {
        self.travel_seconds / 60
    }

    pub fn arrival(&self) -> NaiveDateTime {
        self.arrival
    }

    pub fn departure(&self) -> NaiveDateTime {
        self.departure
    }

    /// Departure on a 12-hour clock, e.g. `08:30 AM`.
    pub fn departure_clock(&self) -> String {
        self.departure.format("%I:%M %p").to_string()
    }

    pub fn display(&self) -> String {
        format!(
            "⏰ {} mins | 🚀 Leave by: {}",
            self.minutes(),
            self.departure_clock()
        )
    }
}

impl fmt::Display for CommutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
