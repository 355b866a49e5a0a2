//! Records served by the hike API.
//!
//! Coordinates and timestamps the map needs are required fields, so a record
//! missing them fails to deserialize instead of producing invalid geometry.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::HikeMapError;
use crate::timestamp::{format_in_zone, parse_zone};

/// `{data: [...]}` envelope used by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Hike summary or detail; both endpoints serialize the same record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hike {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    /// IANA zone name the hike was recorded in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl Hike {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Start date, or end date when there is no start, formatted in `zone`.
    pub fn display_date<Tz>(&self, zone: &Tz) -> Result<Option<String>, HikeMapError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.start
            .as_deref()
            .or(self.end.as_deref())
            .map(|value| format_in_zone(value, zone))
            .transpose()
    }

    /// The zone the hike was recorded in; `None` when unset or unknown.
    pub fn time_zone(&self) -> Option<Tz> {
        let name = self.zone.as_deref()?;
        match parse_zone(name) {
            Ok(zone) => Some(zone),
            Err(err) => {
                warn!("hike {}: {err}, dates shown in UTC", self.id);
                None
            }
        }
    }

    /// [`Hike::display_date`] in the hike's own zone, UTC without one.
    pub fn local_date(&self) -> Result<Option<String>, HikeMapError> {
        match self.time_zone() {
            Some(zone) => self.display_date(&zone),
            None => self.display_date(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub segments: Vec<Vec<TrackPoint>>,
}

impl Track {
    /// All points, segment by segment.
    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.segments.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl TrackPoint {
    pub fn lon_lat(&self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any other fields the API sends; carried into the map feature.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    pub id: i64,
    pub time: String,
    pub fmt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_list_response() {
        let json = r#"{"data": [{
            "id": 3, "parent": 1, "name": "Day 1",
            "segments": [
                [{"latitude": 10.0, "longitude": 20.0, "time": "2022-01-01T00:00:00Z"}],
                [{"latitude": 11.0, "longitude": 21.0, "time": "2022-01-01T00:01:00Z", "elevation": 300.0}]
            ]
        }]}"#;
        let resp: ListResponse<Track> = serde_json::from_str(json).unwrap();
        let track = &resp.data[0];
        assert_eq!(track.name.as_deref(), Some("Day 1"));
        assert_eq!(track.points().count(), 2);
        assert_eq!(track.segments[1][0].elevation, Some(300.0));
    }

    #[test]
    fn test_track_point_requires_coordinates() {
        let json = r#"{"longitude": 20.0, "time": "2022-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<TrackPoint>(json).is_err());
    }

    #[test]
    fn test_waypoint_keeps_extra_fields() {
        let json = r#"{"id": 9, "latitude": 1.0, "longitude": 2.0, "name": "Falls", "elevation": 250.0}"#;
        let wpt: Waypoint = serde_json::from_str(json).unwrap();
        assert_eq!(wpt.extra["id"], 9);

        let back = serde_json::to_value(&wpt).unwrap();
        assert_eq!(back["elevation"], 250.0);
        assert_eq!(back["name"], "Falls");
        assert!(back.get("description").is_none());
    }

    #[test]
    fn test_hike_display() {
        let hike: Hike = serde_json::from_str(
            r#"{"id": 1, "name": "cumberland", "title": "Cumberland Trail",
                "end": "Mon, 09 May 2022 18:00:00 GMT", "zone": "US/Eastern"}"#,
        )
        .unwrap();
        assert_eq!(hike.display_title(), "Cumberland Trail");
        assert_eq!(
            hike.display_date(&Utc).unwrap().as_deref(),
            Some("5/9/2022, 6:00:00 PM")
        );

        let untitled = Hike {
            id: 2,
            name: "plain".to_string(),
            ..Default::default()
        };
        assert_eq!(untitled.display_title(), "plain");
        assert_eq!(untitled.display_date(&Utc).unwrap(), None);
    }

    #[test]
    fn test_hike_local_date() {
        let mut hike: Hike = serde_json::from_str(
            r#"{"id": 1, "name": "cumberland",
                "end": "Mon, 09 May 2022 18:00:00 GMT", "zone": "US/Eastern"}"#,
        )
        .unwrap();
        assert_eq!(hike.time_zone(), Some(chrono_tz::US::Eastern));
        assert_eq!(
            hike.local_date().unwrap().as_deref(),
            Some("5/9/2022, 2:00:00 PM")
        );

        hike.zone = Some("Nowhere/Special".to_string());
        assert_eq!(hike.time_zone(), None);
        assert_eq!(
            hike.local_date().unwrap().as_deref(),
            Some("5/9/2022, 6:00:00 PM")
        );
    }
}
