//! Geographic coordinate type shared by the transport and pipeline layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A WGS-84 latitude/longitude pair.
///
/// Displays as `"lat,lng"` and parses back from the same shape, which is the
/// form used for stage option keys and CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Error returned when a `"lat,lng"` string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid coordinate pair `{0}`, expected `lat,lng`")]
pub struct ParseCoordinatesError(String);

impl FromStr for Coordinates {
    type Err = ParseCoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| ParseCoordinatesError(s.to_string()))?;
        let latitude = lat
            .trim()
            .parse()
            .map_err(|_| ParseCoordinatesError(s.to_string()))?;
        let longitude = lng
            .trim()
            .parse()
            .map_err(|_| ParseCoordinatesError(s.to_string()))?;
        Ok(Self {
            latitude,
            longitude,
        })
    }
}
