use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};

use crate::projector::HikeLayers;

/// Which kind of marker is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    None,
    Waypoint,
    Picture,
}

/// The single highlighted marker, if any.
///
/// One slot for both kinds: selecting a picture drops a selected waypoint
/// and the other way round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "feature", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    None,
    Waypoint(Feature),
    Picture(Feature),
}

impl Selection {
    pub fn kind(&self) -> SelectionKind {
        match self {
            Self::None => SelectionKind::None,
            Self::Waypoint(_) => SelectionKind::Waypoint,
            Self::Picture(_) => SelectionKind::Picture,
        }
    }

    pub fn feature(&self) -> Option<&Feature> {
        match self {
            Self::None => None,
            Self::Waypoint(f) | Self::Picture(f) => Some(f),
        }
    }

    /// Index of the selected feature in its layer (`properties.id`).
    pub fn index(&self) -> Option<usize> {
        self.feature()?
            .property("id")?
            .as_u64()
            .and_then(|id| usize::try_from(id).ok())
    }

    pub fn waypoint_index(&self) -> Option<usize> {
        match self {
            Self::Waypoint(_) => self.index(),
            _ => None,
        }
    }

    pub fn picture_index(&self) -> Option<usize> {
        match self {
            Self::Picture(_) => self.index(),
            _ => None,
        }
    }

    /// Select feature `index` of the `kind` layer. Out of range is a no-op.
    pub fn select(&mut self, kind: SelectionKind, index: usize, layers: &HikeLayers) -> bool {
        let Some(source) = source_for(kind, layers) else {
            self.clear();
            return true;
        };
        match source.features.get(index) {
            Some(feature) => {
                *self = with_kind(kind, feature.clone());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }

    pub fn has_prev(&self) -> bool {
        self.index().is_some_and(|i| i > 0)
    }

    pub fn has_next(&self, layers: &HikeLayers) -> bool {
        match (self.index(), source_for(self.kind(), layers)) {
            (Some(i), Some(source)) => i + 1 < source.features.len(),
            _ => false,
        }
    }

    /// Step to the previous feature of the same kind. Returns whether it moved.
    pub fn prev(&mut self, layers: &HikeLayers) -> bool {
        if !self.has_prev() {
            return false;
        }
        match self.index() {
            Some(i) => self.select(self.kind(), i - 1, layers),
            None => false,
        }
    }

    /// Step to the next feature of the same kind. Returns whether it moved.
    pub fn next(&mut self, layers: &HikeLayers) -> bool {
        if !self.has_next(layers) {
            return false;
        }
        match self.index() {
            Some(i) => self.select(self.kind(), i + 1, layers),
            None => false,
        }
    }

    /// Re-read the selected feature from freshly built layers, so it carries
    /// the current properties. Drops the selection if its index is gone.
    pub fn refresh(&mut self, layers: &HikeLayers) {
        if let Some(i) = self.index() {
            if !self.select(self.kind(), i, layers) {
                self.clear();
            }
        }
    }
}

fn source_for(kind: SelectionKind, layers: &HikeLayers) -> Option<&FeatureCollection> {
    match kind {
        SelectionKind::None => None,
        SelectionKind::Waypoint => Some(&layers.waypoints),
        SelectionKind::Picture => Some(&layers.pictures),
    }
}

fn with_kind(kind: SelectionKind, feature: Feature) -> Selection {
    match kind {
        SelectionKind::None => Selection::None,
        SelectionKind::Waypoint => Selection::Waypoint(feature),
        SelectionKind::Picture => Selection::Picture(feature),
    }
}
