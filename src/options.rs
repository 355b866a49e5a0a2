use serde::Deserialize;

/// Default track palette, cycled by track index.
pub const TRACK_COLORS: [&str; 5] = ["#000088", "#003388", "#AA0088", "#00AA88", "#FF0000"];

/// Icon scale for unselected waypoint and picture markers.
pub const BASE_ICON_SIZE: f64 = 0.05;

/// Options for parsing a track log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Where the waypoint timestamp is read from (default: document)
    #[serde(default)]
    pub waypoint_time: WaypointTime,
}

/// Source of the timestamp attached to a parsed waypoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointTime {
    /// First `<time>` element anywhere in the document.
    #[default]
    Document,
    /// The waypoint's own `<time>` child.
    Waypoint,
}

/// Options for projecting hike records into map layers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOptions {
    /// Track line colors, assigned cyclically (default: TRACK_COLORS)
    #[serde(default = "default_track_colors")]
    pub track_colors: Vec<String>,

    /// Marker icon size; doubled for the selected marker (default: 0.05)
    #[serde(default = "default_icon_size")]
    pub base_icon_size: f64,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            track_colors: default_track_colors(),
            base_icon_size: BASE_ICON_SIZE,
        }
    }
}

impl ProjectOptions {
    /// Color for the track at `index`. An empty palette falls back to TRACK_COLORS.
    pub fn track_color(&self, index: usize) -> &str {
        if self.track_colors.is_empty() {
            TRACK_COLORS[index % TRACK_COLORS.len()]
        } else {
            &self.track_colors[index % self.track_colors.len()]
        }
    }

    pub fn icon_size(&self, selected: bool) -> f64 {
        if selected {
            self.base_icon_size * 2.0
        } else {
            self.base_icon_size
        }
    }
}

fn default_track_colors() -> Vec<String> {
    TRACK_COLORS.iter().map(|c| c.to_string()).collect()
}

fn default_icon_size() -> f64 {
    BASE_ICON_SIZE
}
