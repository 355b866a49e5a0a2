use geojson::{Feature, FeatureCollection, Value};
use hikemap_wasm::client::HikeBundle;
use hikemap_wasm::converter::{track_log_to_layers, track_to_feature_collection};
use hikemap_wasm::model::{Hike, ListResponse, Picture, Track, Waypoint};
use hikemap_wasm::options::{BASE_ICON_SIZE, ParseOptions, ProjectOptions, WaypointTime};
use hikemap_wasm::parser::{parse_track_log, parse_track_log_with};
use hikemap_wasm::projector::{TimePool, project_hike};
use hikemap_wasm::selection::{Selection, SelectionKind};
use hikemap_wasm::view::HikeView;
use serde::de::DeserializeOwned;

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn load_list<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let resp: ListResponse<T> = serde_json::from_str(&load_fixture(path)).unwrap();
    resp.data
}

fn tracks() -> Vec<Track> {
    load_list("api/tracks.json")
}

fn waypoints() -> Vec<Waypoint> {
    load_list("api/waypoints.json")
}

fn pictures() -> Vec<Picture> {
    load_list("api/pictures.json")
}

fn point(f: &Feature) -> Vec<f64> {
    match &f.geometry.as_ref().unwrap().value {
        Value::Point(c) => c.clone(),
        _ => panic!("Expected Point"),
    }
}

fn line_len(fc: &FeatureCollection, i: usize) -> usize {
    match &fc.features[i].geometry.as_ref().unwrap().value {
        Value::LineString(c) => c.len(),
        _ => panic!("Expected LineString"),
    }
}

// ---- track_logs/ ----

#[test]
fn test_day1_track_log() {
    let log = parse_track_log(&load_fixture("track_logs/day1.gpx")).unwrap();
    assert_eq!(log.name.as_deref(), Some("North Chickamauga Creek"));
    assert_eq!(log.description.as_deref(), Some("Cumberland Trail, day one"));
    assert_eq!(log.color.as_deref(), Some("#003388"));

    let track = log.track.as_ref().unwrap();
    assert_eq!(track.len(), 4);
    assert_eq!(track[3].timestamp.as_deref(), Some("2022-05-07T16:02:55Z"));
    assert_eq!(track[3].value.ele, Some(251.2));

    let wpt = log.waypoint.as_ref().unwrap();
    assert_eq!(wpt.timestamp.as_deref(), Some("2022-05-07T15:00:00Z"));
}

#[test]
fn test_day1_waypoint_own_time() {
    let opts = ParseOptions {
        waypoint_time: WaypointTime::Waypoint,
    };
    let log = parse_track_log_with(&load_fixture("track_logs/day1.gpx"), &opts).unwrap();
    assert_eq!(
        log.waypoint.unwrap().timestamp.as_deref(),
        Some("2022-05-07T18:40:00Z")
    );
}

#[test]
fn test_day1_layers() {
    let log = parse_track_log(&load_fixture("track_logs/day1.gpx")).unwrap();
    let layers = track_log_to_layers(&log);

    let track = layers.track.unwrap();
    assert_eq!(track.features.len(), 1);
    assert_eq!(line_len(&track, 0), 4);

    let waypoint = layers.waypoint.unwrap();
    assert_eq!(point(&waypoint.features[0]), vec![-85.2201, 35.2248]);

    let json = serde_json::to_value(&waypoint).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"][0]["geometry"]["type"], "Point");
    assert_eq!(json["features"][0]["properties"]["name"], "North Chickamauga Creek");
}

#[test]
fn test_waypoint_only_track_log() {
    let log = parse_track_log(&load_fixture("track_logs/waypoint_only.gpx")).unwrap();
    assert!(log.track.is_none());
    assert_eq!(log.name.as_deref(), Some("Overlook"));
    assert_eq!(log.description.as_deref(), Some("View over the gorge"));

    let wpt = log.waypoint.as_ref().unwrap();
    assert_eq!(wpt.timestamp, None);

    let json = serde_json::to_value(&log).unwrap();
    assert!(json.get("track").is_none());
    assert!(json.get("color").is_none());
    assert_eq!(json["waypoint"]["value"], serde_json::json!([35.3001, -85.1502]));
}

#[test]
fn test_record_round_trips_through_json() {
    let log = parse_track_log(&load_fixture("track_logs/day1.gpx")).unwrap();
    let json = serde_json::to_string(&log.track).unwrap();
    let track: Vec<hikemap_wasm::track_log::TrackLogPoint> = serde_json::from_str(&json).unwrap();
    let fc = track_to_feature_collection(&track, Default::default());
    assert_eq!(line_len(&fc, 0), 4);
}

// ---- api/ ----

#[test]
fn test_project_fixture_hike() {
    let layers = project_hike(
        &tracks(),
        &waypoints(),
        &pictures(),
        &Selection::None,
        &ProjectOptions::default(),
    );

    assert_eq!(layers.tracks.features.len(), 2);
    assert_eq!(line_len(&layers.tracks, 0), 3);
    assert_eq!(line_len(&layers.tracks, 1), 2);
    let day1 = layers.tracks.features[0].properties.as_ref().unwrap();
    assert_eq!(day1["color"], "#000088");
    assert_eq!(day1["description"], "Trail head to camp");
    let day2 = layers.tracks.features[1].properties.as_ref().unwrap();
    assert_eq!(day2["color"], "#003388");

    assert_eq!(layers.waypoints.features.len(), 3);
    let camp = layers.waypoints.features[1].properties.as_ref().unwrap();
    assert_eq!(camp["id"], 1);
    assert_eq!(camp["parent"], 1);
    assert_eq!(camp["name"], "Camp");
    assert_eq!(camp["iconSize"], BASE_ICON_SIZE);
    assert_eq!(
        layers.waypoints.features[0].properties.as_ref().unwrap()["elevation"],
        221.0
    );

    let pics = &layers.pictures.features;
    assert_eq!(pics.len(), 3);
    assert_eq!(point(&pics[0]), vec![-85.2079, 35.2111]);
    assert_eq!(point(&pics[1]), vec![-85.2101, 35.2130]);
    assert_eq!(point(&pics[2]), vec![-85.2260, 35.2300]);
    let last = pics[2].properties.as_ref().unwrap();
    assert_eq!(last["id"], 2);
    assert_eq!(last["picId"], 33);
    assert_eq!(last["fmt"], "png");
}

#[test]
fn test_fixture_pool_is_chronological() {
    let pool = TimePool::from_tracks(&tracks());
    assert_eq!(pool.len(), 5);
    assert!(pool.points().windows(2).all(|w| w[0].time <= w[1].time));
}

#[test]
fn test_view_over_fixture_hike() {
    let hike: Hike = serde_json::from_str(&load_fixture("api/hike.json")).unwrap();
    let mut view = HikeView::new(ProjectOptions::default());
    view.apply(HikeBundle {
        hike: Some(hike),
        tracks: tracks(),
        waypoints: waypoints(),
        pictures: pictures(),
    });

    assert!(view.select(SelectionKind::Picture, 2));
    assert!(!view.has_next());
    assert!(view.prev());
    assert_eq!(view.selection().picture_index(), Some(1));
    assert_eq!(
        view.layers().pictures.features[1].properties.as_ref().unwrap()["iconSize"],
        2.0 * BASE_ICON_SIZE
    );

    assert!(view.select(SelectionKind::Waypoint, 0));
    assert_eq!(view.selection().picture_index(), None);
    assert!(view
        .layers()
        .pictures
        .features
        .iter()
        .all(|f| f.properties.as_ref().unwrap()["iconSize"] == BASE_ICON_SIZE));

    let eastern = chrono::FixedOffset::west_opt(4 * 3600).unwrap();
    assert_eq!(
        view.display_date(&eastern).unwrap().as_deref(),
        Some("5/7/2022, 11:00:00 AM")
    );
}

#[test]
fn test_fixture_hike_with_unreadable_picture_time() {
    let mut pics = pictures();
    let mut broken = pics[0].clone();
    broken.id = 99;
    broken.time = "Someday, 07 May 2022".to_string();
    pics.insert(1, broken);

    let mut view = HikeView::new(ProjectOptions::default());
    view.apply(HikeBundle {
        hike: None,
        tracks: tracks(),
        waypoints: waypoints(),
        pictures: pics,
    });

    let placed = &view.layers().pictures.features;
    assert_eq!(placed.len(), 3);
    let ids: Vec<i64> = placed
        .iter()
        .map(|f| f.properties.as_ref().unwrap()["picId"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&99));
    assert_eq!(point(&placed[2]), vec![-85.2260, 35.2300]);

    assert!(view.select(SelectionKind::Waypoint, 2));
    assert_eq!(view.selection().waypoint_index(), Some(2));
    assert!(view.select(SelectionKind::Picture, 1));
    assert!(view.next());
    assert_eq!(view.selection().picture_index(), Some(2));
    assert!(!view.next());
}
