// src/app/input.rs

use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::plan::TravelMode;

pub const MIN_ADDRESS_CHARS: usize = 3;

/// Layouts accepted for the arrival time, tried in order.
///
/// `%.f` also matches when there is no fractional part.
const ARRIVAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ============================================================================
// Input Types
// ============================================================================

/// The four answers exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInput {
    pub start: String,
    pub destination: String,
    pub arrival: String,
    pub mode: String,
}

/// A validated request, ready for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommuteRequest {
    pub start: String,
    pub destination: String,
    pub arrive_at: NaiveDateTime,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    Destination,
    Arrival,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Start => "Start address",
            Field::Destination => "Destination",
            Field::Arrival => "Arrival time",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} cannot be empty.")]
    Blank(Field),

    #[error("{0} must be at least 3 characters long.")]
    TooShort(Field),

    #[error("Arrival time '{0}' is not valid. Use the format YYYY-MM-DDTHH:MM:SS, e.g. 2026-12-25T09:30:00.")]
    BadTimestamp(String),

    #[error("Arrival time must be in the future.")]
    NotInFuture,

    #[error("Travel mode '{0}' is not supported. Choose car, bicycle or pedestrian.")]
    InvalidMode(String),
}

// ============================================================================
// Validation
// ============================================================================

/// Parses an ISO-8601 local date-time such as `2026-12-25T09:30:00`.
pub fn parse_arrival(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ARRIVAL_FORMATS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
}

/// Checks all answers against `now`; the first violated rule wins.
pub fn validate(raw: &RawInput, now: NaiveDateTime) -> Result<CommuteRequest, ValidationError> {
    let start = raw.start.trim();
    let destination = raw.destination.trim();
    let arrival = raw.arrival.trim();

    for (field, value) in [
        (Field::Start, start),
        (Field::Destination, destination),
        (Field::Arrival, arrival),
    ] {
        if value.is_empty() {
            return Err(ValidationError::Blank(field));
        }
    }

    for (field, value) in [(Field::Start, start), (Field::Destination, destination)] {
        if value.chars().count() < MIN_ADDRESS_CHARS {
            return Err(ValidationError::TooShort(field));
        }
    }

    let arrive_at =
        parse_arrival(arrival).ok_or_else(|| ValidationError::BadTimestamp(arrival.to_string()))?;
    if arrive_at <= now {
        return Err(ValidationError::NotInFuture);
    }

    let mode = match raw.mode.trim() {
        "" => TravelMode::default(),
        other => other
            .parse::<TravelMode>()
            .map_err(|_| ValidationError::InvalidMode(other.to_string()))?,
    };

    Ok(CommuteRequest {
        start: start.to_string(),
        destination: destination.to_string(),
        arrive_at,
        mode,
    })
}
