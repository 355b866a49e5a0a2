use serde::{Deserialize, Serialize};

use crate::error::HikeMapError;

/// Record extracted from a single track-log document.
///
/// Keys whose extraction came back empty are left out when serialized. An
/// absent `track` means the document had no `<trkseg>`; `Some(vec![])` means
/// it had an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Vec<TrackLogPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<TrackLogWaypoint>,
}

/// One `<trkpt>` of a track log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLogPoint {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub value: Position,
}

/// The `<wpt>` of a track log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLogWaypoint {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub value: Position,
}

/// Position in record order: `[lat, lon]` or `[lat, lon, ele]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
        }
    }

    /// GeoJSON coordinate order.
    pub fn lon_lat(&self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = HikeMapError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        match value.as_slice() {
            [lat, lon] => Ok(Self::new(*lat, *lon)),
            [lat, lon, ele] => Ok(Self {
                lat: *lat,
                lon: *lon,
                ele: Some(*ele),
            }),
            other => Err(HikeMapError::InvalidPosition(other.len())),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(p: Position) -> Self {
        match p.ele {
            Some(ele) => vec![p.lat, p.lon, ele],
            None => vec![p.lat, p.lon],
        }
    }
}
