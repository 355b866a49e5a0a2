use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::track_log::*;

/// GeoJSON layers for one parsed track log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackLogLayers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<FeatureCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<FeatureCollection>,
}

/// Convert a parsed waypoint to a one-feature collection holding a Point.
pub fn waypoint_to_feature_collection(
    wpt: &TrackLogWaypoint,
    props: Map<String, JsonValue>,
) -> FeatureCollection {
    let geometry = Geometry::new(Value::Point(wpt.value.lon_lat()));
    single_feature_collection(geometry, props)
}

/// Convert parsed track points to a one-feature collection holding a LineString.
pub fn track_to_feature_collection(
    track: &[TrackLogPoint],
    props: Map<String, JsonValue>,
) -> FeatureCollection {
    let coords: Vec<Vec<f64>> = track.iter().map(|pt| pt.value.lon_lat()).collect();
    let geometry = Geometry::new(Value::LineString(coords));
    single_feature_collection(geometry, props)
}

/// Convert every part a track log has, tagging features with its metadata.
pub fn track_log_to_layers(log: &TrackLog) -> TrackLogLayers {
    let props = metadata_props(log);

    TrackLogLayers {
        track: log
            .track
            .as_deref()
            .map(|track| track_to_feature_collection(track, props.clone())),
        waypoint: log
            .waypoint
            .as_ref()
            .map(|wpt| waypoint_to_feature_collection(wpt, props.clone())),
    }
}

fn metadata_props(log: &TrackLog) -> Map<String, JsonValue> {
    let mut props = Map::new();
    insert_optional(&mut props, "name", &log.name);
    insert_optional(&mut props, "description", &log.description);
    insert_optional(&mut props, "color", &log.color);
    props
}

fn single_feature_collection(geometry: Geometry, props: Map<String, JsonValue>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(props),
            foreign_members: None,
        }],
        foreign_members: None,
    }
}

pub(crate) fn insert_optional(props: &mut Map<String, JsonValue>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), JsonValue::String(v.clone()));
    }
}
