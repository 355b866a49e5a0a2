pub mod client;
pub mod converter;
pub mod error;
pub mod model;
pub mod options;
pub mod parser;
pub mod projector;
pub mod selection;
pub mod timestamp;
pub mod track_log;
pub mod view;

use futures::future::{AbortHandle, Aborted};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use wasm_bindgen::prelude::*;

use crate::client::ApiClient;
use crate::model::{Hike, Picture, Track, Waypoint};
use crate::options::{ParseOptions, ProjectOptions};
use crate::selection::{Selection, SelectionKind};
use crate::track_log::{TrackLogPoint, TrackLogWaypoint};
use crate::view::HikeView;

/// Route `log` output to the browser console.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let level = match level.as_deref() {
        None => log::Level::Info,
        Some(name) => name
            .parse::<log::Level>()
            .map_err(|e| JsValue::from_str(&e.to_string()))?,
    };
    // A second call keeps the logger that is already installed.
    let _ = console_log::init_with_level(level);
    Ok(())
}

/// Parse a track-log (GPX) string into a record object.
#[wasm_bindgen(js_name = parseTrackLog)]
pub fn parse_track_log(xml: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ParseOptions = from_js_or_default(options)?;
    let log = parser::parse_track_log_with(xml, &opts)?;
    to_js(&log)
}

/// Parse a track-log string and convert its track and waypoint to GeoJSON.
#[wasm_bindgen(js_name = trackLogToGeoJson)]
pub fn track_log_to_geojson(xml: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ParseOptions = from_js_or_default(options)?;
    let log = parser::parse_track_log_with(xml, &opts)?;
    to_js(&converter::track_log_to_layers(&log))
}

/// Convert a parsed waypoint record to a one-feature FeatureCollection.
#[wasm_bindgen(js_name = waypointToGeoJson)]
pub fn waypoint_to_geojson(waypoint: JsValue, props: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let wpt: TrackLogWaypoint = from_js(waypoint)?;
    let props: Map<String, JsonValue> = from_js_or_default(props)?;
    to_js(&converter::waypoint_to_feature_collection(&wpt, props))
}

/// Convert a parsed track record to a one-feature FeatureCollection.
#[wasm_bindgen(js_name = trackToGeoJson)]
pub fn track_to_geojson(track: JsValue, props: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let track: Vec<TrackLogPoint> = from_js(track)?;
    let props: Map<String, JsonValue> = from_js_or_default(props)?;
    to_js(&converter::track_to_feature_collection(&track, props))
}

/// Build the tracks, waypoints and pictures layers in one call.
#[wasm_bindgen(js_name = projectHikeMap)]
pub fn project_hike_map(
    tracks: JsValue,
    waypoints: JsValue,
    pictures: JsValue,
    selection: JsValue,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let tracks: Vec<Track> = from_js_or_default(tracks)?;
    let waypoints: Vec<Waypoint> = from_js_or_default(waypoints)?;
    let pictures: Vec<Picture> = from_js_or_default(pictures)?;
    let selection: Selection = from_js_or_default(selection)?;
    let opts: ProjectOptions = from_js_or_default(options)?;

    let layers = projector::project_hike(&tracks, &waypoints, &pictures, &selection, &opts);
    to_js(&layers)
}

/// Fetch a hike and its tracks, waypoints and pictures.
#[wasm_bindgen(js_name = loadHike)]
pub async fn load_hike(base_url: String, hike_id: u32) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let client = ApiClient::new(base_url);
    let bundle = client.load_hike(i64::from(hike_id)).await;
    to_js(&bundle)
}

/// Hike loads for one page that can be called off when the page goes away.
///
/// Starting a new load aborts the one still running.
#[wasm_bindgen(js_name = HikeLoader)]
pub struct HikeLoader {
    client: ApiClient,
    pending: Option<AbortHandle>,
}

#[wasm_bindgen(js_class = HikeLoader)]
impl HikeLoader {
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: String) -> HikeLoader {
        console_error_panic_hook::set_once();

        HikeLoader {
            client: ApiClient::new(base_url),
            pending: None,
        }
    }

    /// Promise of `{hike, tracks, waypoints, pictures}`, or `null` once aborted.
    pub fn load(&mut self, hike_id: u32) -> js_sys::Promise {
        self.abort();
        let (load, handle) = self.client.load_hike_abortable(i64::from(hike_id));
        self.pending = Some(handle);

        wasm_bindgen_futures::future_to_promise(async move {
            match load.await {
                Ok(bundle) => to_js(&bundle),
                Err(Aborted) => {
                    debug!("load of hike {hike_id} aborted");
                    Ok(JsValue::NULL)
                }
            }
        })
    }

    pub fn abort(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Map state for one hike page, held on the Rust side.
#[wasm_bindgen(js_name = HikeMap)]
pub struct HikeMap {
    view: HikeView,
}

#[wasm_bindgen(js_class = HikeMap)]
impl HikeMap {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<HikeMap, JsValue> {
        console_error_panic_hook::set_once();

        let opts: ProjectOptions = from_js_or_default(options)?;
        Ok(HikeMap {
            view: HikeView::new(opts),
        })
    }

    #[wasm_bindgen(js_name = setHike)]
    pub fn set_hike(&mut self, hike: JsValue) -> Result<(), JsValue> {
        let hike: Hike = from_js(hike)?;
        self.view.set_hike(hike);
        Ok(())
    }

    #[wasm_bindgen(js_name = setTracks)]
    pub fn set_tracks(&mut self, tracks: JsValue) -> Result<(), JsValue> {
        let tracks: Vec<Track> = from_js_or_default(tracks)?;
        self.view.set_tracks(tracks);
        Ok(())
    }

    #[wasm_bindgen(js_name = setWaypoints)]
    pub fn set_waypoints(&mut self, waypoints: JsValue) -> Result<(), JsValue> {
        let waypoints: Vec<Waypoint> = from_js_or_default(waypoints)?;
        self.view.set_waypoints(waypoints);
        Ok(())
    }

    #[wasm_bindgen(js_name = setPictures)]
    pub fn set_pictures(&mut self, pictures: JsValue) -> Result<(), JsValue> {
        let pictures: Vec<Picture> = from_js_or_default(pictures)?;
        self.view.set_pictures(pictures);
        Ok(())
    }

    #[wasm_bindgen(js_name = selectWaypoint)]
    pub fn select_waypoint(&mut self, index: usize) -> bool {
        self.view.select(SelectionKind::Waypoint, index)
    }

    #[wasm_bindgen(js_name = selectPicture)]
    pub fn select_picture(&mut self, index: usize) -> bool {
        self.view.select(SelectionKind::Picture, index)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
    }

    pub fn next(&mut self) -> bool {
        self.view.next()
    }

    pub fn prev(&mut self) -> bool {
        self.view.prev()
    }

    #[wasm_bindgen(js_name = hasNext)]
    pub fn has_next(&self) -> bool {
        self.view.has_next()
    }

    #[wasm_bindgen(js_name = hasPrev)]
    pub fn has_prev(&self) -> bool {
        self.view.has_prev()
    }

    /// Title of the loaded hike, falling back to its name.
    pub fn title(&self) -> Option<String> {
        self.view.hike().map(|hike| hike.display_title().to_string())
    }

    /// Hike date in `zone`, or in the hike's own zone when none is given.
    #[wasm_bindgen(js_name = displayDate)]
    pub fn display_date(&self, zone: Option<String>) -> Result<Option<String>, JsValue> {
        let date = match zone.as_deref() {
            Some(name) => self.view.display_date(&timestamp::parse_zone(name)?)?,
            None => self.view.local_date()?,
        };
        Ok(date)
    }

    pub fn layers(&self) -> Result<JsValue, JsValue> {
        to_js(self.view.layers())
    }

    pub fn selection(&self) -> Result<JsValue, JsValue> {
        to_js(self.view.selection())
    }
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        from_js(value)
    }
}

/// Plain JS objects rather than `Map`s, so the map widget can read properties.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
