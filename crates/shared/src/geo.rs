//! Geographic primitives shared by the API layer and the map core.
//!
//! The trail service expresses positions as WGS84 latitude/longitude and
//! takes proximity centers as a comma-separated `lat,lon` query parameter.

use serde::{Deserialize, Serialize};

/// Latitude bounds accepted by the service.
pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;

/// Longitude bounds accepted by the service.
pub const LON_MIN: f64 = -180.0;
pub const LON_MAX: f64 = 180.0;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the service's accepted ranges.
    pub fn in_bounds(&self) -> bool {
        (LAT_MIN..=LAT_MAX).contains(&self.lat) && (LON_MIN..=LON_MAX).contains(&self.lon)
    }

    /// Render as the service's `near` query parameter (`"lat,lon"`).
    pub fn near_param(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}
