use chrono::TimeZone;
use log::debug;

use crate::client::HikeBundle;
use crate::error::HikeMapError;
use crate::model::{Hike, Picture, Track, Waypoint};
use crate::options::ProjectOptions;
use crate::projector::{HikeLayers, picture_layer, track_layer, waypoint_layer};
use crate::selection::{Selection, SelectionKind};

type Result<T> = std::result::Result<T, HikeMapError>;

/// View state for one hike page.
///
/// Sub-resources arrive independently; one that has not arrived yet is
/// `None` and projects as empty. Each change rebuilds the layers that depend
/// on it, wholesale.
#[derive(Debug, Clone, Default)]
pub struct HikeView {
    options: ProjectOptions,
    hike: Option<Hike>,
    tracks: Option<Vec<Track>>,
    waypoints: Option<Vec<Waypoint>>,
    pictures: Option<Vec<Picture>>,
    selection: Selection,
    layers: HikeLayers,
}

impl HikeView {
    pub fn new(options: ProjectOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn hike(&self) -> Option<&Hike> {
        self.hike.as_ref()
    }

    pub fn layers(&self) -> &HikeLayers {
        &self.layers
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_hike(&mut self, hike: Hike) {
        self.hike = Some(hike);
    }

    /// Tracks feed both the track layer and picture placement.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = Some(tracks);
        self.layers.tracks = track_layer(self.tracks(), &self.options);
        self.rebuild_pictures();
    }

    pub fn set_waypoints(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = Some(waypoints);
        self.rebuild_waypoints();
    }

    pub fn set_pictures(&mut self, pictures: Vec<Picture>) {
        self.pictures = Some(pictures);
        self.rebuild_pictures();
    }

    /// Take in everything a hike load produced.
    pub fn apply(&mut self, bundle: HikeBundle) {
        if let Some(hike) = bundle.hike {
            self.set_hike(hike);
        }
        self.set_waypoints(bundle.waypoints);
        self.pictures = Some(bundle.pictures);
        self.set_tracks(bundle.tracks);
    }

    pub fn select(&mut self, kind: SelectionKind, index: usize) -> bool {
        if !self.selection.select(kind, index, &self.layers) {
            return false;
        }
        self.rebuild_selection();
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.rebuild_selection();
    }

    pub fn has_prev(&self) -> bool {
        self.selection.has_prev()
    }

    pub fn has_next(&self) -> bool {
        self.selection.has_next(&self.layers)
    }

    pub fn prev(&mut self) -> bool {
        if !self.selection.prev(&self.layers) {
            return false;
        }
        self.rebuild_selection();
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.selection.next(&self.layers) {
            return false;
        }
        self.rebuild_selection();
        true
    }

    /// Hike start (or end) date rendered in `zone`.
    pub fn display_date<Tz>(&self, zone: &Tz) -> Result<Option<String>>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match &self.hike {
            Some(hike) => hike.display_date(zone),
            None => Ok(None),
        }
    }

    /// Hike date rendered in the hike's own zone.
    pub fn local_date(&self) -> Result<Option<String>> {
        match &self.hike {
            Some(hike) => hike.local_date(),
            None => Ok(None),
        }
    }

    fn tracks(&self) -> &[Track] {
        self.tracks.as_deref().unwrap_or_default()
    }

    fn rebuild_waypoints(&mut self) {
        let waypoints = self.waypoints.as_deref().unwrap_or_default();
        self.layers.waypoints =
            waypoint_layer(waypoints, self.selection.waypoint_index(), &self.options);
        debug!("rebuilt waypoint layer: {} features", self.layers.waypoints.features.len());
        self.sync_selection(SelectionKind::Waypoint);
    }

    fn rebuild_pictures(&mut self) {
        let pictures = self.pictures.as_deref().unwrap_or_default();
        self.layers.pictures = picture_layer(
            self.tracks(),
            pictures,
            self.selection.picture_index(),
            &self.options,
        );
        debug!("rebuilt picture layer: {} features", self.layers.pictures.features.len());
        self.sync_selection(SelectionKind::Picture);
    }

    fn rebuild_selection(&mut self) {
        self.rebuild_waypoints();
        self.rebuild_pictures();
    }

    /// Keep the stored selected feature in step with a rebuilt layer.
    fn sync_selection(&mut self, kind: SelectionKind) {
        if self.selection.kind() == kind {
            self.selection.refresh(&self.layers);
        }
    }
}
