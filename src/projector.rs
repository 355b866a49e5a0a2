//! Hike records to render-ready map layers.
//!
//! Every function here is pure: the caller passes the full inputs and gets
//! whole replacement collections back. Nothing is patched in place.

use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::converter::insert_optional;
use crate::model::{Picture, Track, TrackPoint, Waypoint};
use crate::options::ProjectOptions;
use crate::selection::Selection;
use crate::timestamp::parse_timestamp;

/// The three layers handed to the map widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikeLayers {
    pub tracks: FeatureCollection,
    pub waypoints: FeatureCollection,
    pub pictures: FeatureCollection,
}

impl Default for HikeLayers {
    fn default() -> Self {
        Self {
            tracks: empty_collection(),
            waypoints: empty_collection(),
            pictures: empty_collection(),
        }
    }
}

/// Project all three layers at once.
///
/// Records that cannot be placed are left off their layer; the rest still
/// project.
pub fn project_hike(
    tracks: &[Track],
    waypoints: &[Waypoint],
    pictures: &[Picture],
    selection: &Selection,
    opts: &ProjectOptions,
) -> HikeLayers {
    HikeLayers {
        tracks: track_layer(tracks, opts),
        waypoints: waypoint_layer(waypoints, selection.waypoint_index(), opts),
        pictures: picture_layer(tracks, pictures, selection.picture_index(), opts),
    }
}

/// One LineString per track, its segments concatenated.
pub fn track_layer(tracks: &[Track], opts: &ProjectOptions) -> FeatureCollection {
    let features = tracks
        .iter()
        .enumerate()
        .map(|(ti, track)| {
            let coords: Vec<Vec<f64>> = track.points().map(TrackPoint::lon_lat).collect();

            let mut props = Map::new();
            props.insert(
                "color".to_string(),
                JsonValue::String(opts.track_color(ti).to_string()),
            );
            insert_optional(&mut props, "name", &track.name);
            insert_optional(&mut props, "description", &track.description);

            feature_with(Value::LineString(coords), props)
        })
        .collect();

    collection(features)
}

/// One Point per waypoint; `id` is the input index.
pub fn waypoint_layer(
    waypoints: &[Waypoint],
    selected: Option<usize>,
    opts: &ProjectOptions,
) -> FeatureCollection {
    let features = waypoints
        .iter()
        .enumerate()
        .map(|(xi, wpt)| {
            let mut props = wpt.extra.clone();
            props.insert("latitude".to_string(), JsonValue::from(wpt.latitude));
            props.insert("longitude".to_string(), JsonValue::from(wpt.longitude));
            insert_optional(&mut props, "name", &wpt.name);
            insert_optional(&mut props, "description", &wpt.description);
            props.insert("id".to_string(), JsonValue::from(xi));
            insert_icon_size(&mut props, opts.icon_size(selected == Some(xi)));

            feature_with(Value::Point(vec![wpt.longitude, wpt.latitude]), props)
        })
        .collect();

    collection(features)
}

/// One Point per picture, placed on the track by time.
///
/// Without any track point there is nothing to place against, and the layer
/// is empty. A picture whose time does not parse is left off; `id` counts
/// the placed pictures only, so it stays contiguous for paging.
pub fn picture_layer(
    tracks: &[Track],
    pictures: &[Picture],
    selected: Option<usize>,
    opts: &ProjectOptions,
) -> FeatureCollection {
    let pool = TimePool::from_tracks(tracks);
    if pool.is_empty() {
        if !pictures.is_empty() {
            debug!("no track points, {} pictures left off the map", pictures.len());
        }
        return empty_collection();
    }

    let features = pictures
        .iter()
        .filter_map(|pic| match parse_timestamp(&pic.time) {
            Ok(taken) => pool.place(taken).map(|point| (pic, point)),
            Err(err) => {
                warn!("picture {} left off the map: {err}", pic.id);
                None
            }
        })
        .enumerate()
        .map(|(pi, (pic, point))| {
            let mut props = Map::new();
            props.insert("id".to_string(), JsonValue::from(pi));
            props.insert("picId".to_string(), JsonValue::from(pic.id));
            props.insert("fmt".to_string(), JsonValue::String(pic.fmt.clone()));
            props.insert("time".to_string(), JsonValue::String(pic.time.clone()));
            insert_optional(&mut props, "description", &pic.description);
            insert_icon_size(&mut props, opts.icon_size(selected == Some(pi)));

            feature_with(Value::Point(point.coordinates.clone()), props)
        })
        .collect();

    collection(features)
}

/// A track point reduced to what placement needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPoint {
    pub time: DateTime<Utc>,
    pub coordinates: Vec<f64>,
}

/// Every track point of a hike, ordered by time.
///
/// Points are gathered track by track, segment by segment, then stable-sorted
/// by timestamp, so out-of-order tracks still place pictures correctly and
/// already chronological input keeps its order.
#[derive(Debug, Clone, Default)]
pub struct TimePool {
    points: Vec<TimedPoint>,
}

impl TimePool {
    /// Points whose time does not parse are skipped.
    pub fn from_tracks(tracks: &[Track]) -> Self {
        let mut points: Vec<TimedPoint> = tracks
            .iter()
            .flat_map(Track::points)
            .filter_map(|p| match parse_timestamp(&p.time) {
                Ok(time) => Some(TimedPoint {
                    time,
                    coordinates: p.lon_lat(),
                }),
                Err(err) => {
                    warn!("track point left out of picture placement: {err}");
                    None
                }
            })
            .collect();
        points.sort_by_key(|p| p.time);

        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[TimedPoint] {
        &self.points
    }

    /// First point strictly later than `at`, else the last point. `None`
    /// only for an empty pool.
    pub fn place(&self, at: DateTime<Utc>) -> Option<&TimedPoint> {
        let later = self.points.partition_point(|p| p.time <= at);
        self.points.get(later).or_else(|| self.points.last())
    }
}

fn insert_icon_size(props: &mut Map<String, JsonValue>, size: f64) {
    props.insert(
        "iconSize".to_string(),
        serde_json::Number::from_f64(size).map_or(JsonValue::Null, JsonValue::Number),
    );
}

fn feature_with(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub(crate) fn empty_collection() -> FeatureCollection {
    collection(Vec::new())
}
