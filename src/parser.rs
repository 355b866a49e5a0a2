use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::HikeMapError;
use crate::options::{ParseOptions, WaypointTime};
use crate::track_log::*;

type Result<T> = std::result::Result<T, HikeMapError>;

/// Parse a track-log document with default options.
pub fn parse_track_log(xml: &str) -> Result<TrackLog> {
    parse_track_log_with(xml, &ParseOptions::default())
}

/// Parse a track-log document into a TrackLog.
///
/// Only a document quick-xml cannot read is an error; anything missing just
/// leaves the matching key out.
pub fn parse_track_log_with(xml: &str, opts: &ParseOptions) -> Result<TrackLog> {
    let mut reader = Reader::from_str(xml);
    let mut scan = DocumentScan::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkseg" if scan.track.is_none() => {
                    let points = parse_segment(&mut reader, &mut scan)?;
                    scan.track = Some(points);
                }
                b"wpt" if scan.waypoint.is_none() => {
                    let wpt = parse_waypoint(&e, &mut reader, &mut scan)?;
                    scan.waypoint = Some(wpt);
                }
                local => {
                    if let Some(field) = TextField::from_local_name(local) {
                        scan.read_field(field, &e, &mut reader)?;
                    }
                }
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"trkseg" if scan.track.is_none() => scan.track = Some(Vec::new()),
                b"wpt" if scan.waypoint.is_none() => {
                    scan.waypoint = Some(PendingWaypoint {
                        position: position_or_warn(&e, "wpt"),
                        time: None,
                    });
                }
                local => {
                    if let Some(field) = TextField::from_local_name(local) {
                        scan.note(field, "");
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(HikeMapError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(scan.finish(opts))
}

/// Elements whose text the parser cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Name,
    Description,
    Color,
    Time,
    Elevation,
}

impl TextField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"name" => Some(Self::Name),
            b"desc" => Some(Self::Description),
            b"color" => Some(Self::Color),
            b"time" => Some(Self::Time),
            b"ele" => Some(Self::Elevation),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct PendingWaypoint {
    position: Option<(f64, f64)>,
    time: Option<String>,
}

/// First-match state gathered over the whole document.
#[derive(Debug, Default)]
struct DocumentScan {
    name: Option<String>,
    description: Option<String>,
    color: Option<String>,
    time: Option<String>,
    track: Option<Vec<TrackLogPoint>>,
    waypoint: Option<PendingWaypoint>,
}

impl DocumentScan {
    /// Record the text of a document-level field. Only the first element of
    /// each kind counts, even when its text is empty.
    fn note(&mut self, field: TextField, text: &str) {
        let slot = match field {
            TextField::Name => &mut self.name,
            TextField::Description => &mut self.description,
            TextField::Color => &mut self.color,
            TextField::Time => &mut self.time,
            TextField::Elevation => return,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    fn read_field<'a>(
        &mut self,
        field: TextField,
        start: &BytesStart<'_>,
        reader: &mut Reader<&'a [u8]>,
    ) -> Result<String> {
        let text = read_text_owned(reader, start)?;
        self.note(field, &text);
        Ok(text)
    }

    fn finish(self, opts: &ParseOptions) -> TrackLog {
        let document_time = self.time;
        let waypoint = self.waypoint.and_then(|wpt| {
            let (lat, lon) = wpt.position?;
            let timestamp = match opts.waypoint_time {
                WaypointTime::Document => document_time,
                WaypointTime::Waypoint => wpt.time,
            };
            Some(TrackLogWaypoint {
                timestamp: non_empty(timestamp),
                value: Position::new(lat, lon),
            })
        });

        debug!(
            "parsed track log: {} track points, waypoint: {}",
            self.track.as_ref().map_or(0, Vec::len),
            waypoint.is_some()
        );

        TrackLog {
            name: non_empty(self.name),
            description: non_empty(self.description),
            color: non_empty(self.color),
            track: self.track,
            waypoint,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse lat/lon attributes from a point element's start tag.
fn parse_lat_lon(e: &BytesStart<'_>, element: &'static str) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| HikeMapError::XmlParse(e.into()))?;
        let key = attr.key.local_name();
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        let attribute = match key.as_ref() {
            b"lat" => "lat",
            b"lon" => "lon",
            _ => continue,
        };
        let parsed = val
            .trim()
            .parse::<f64>()
            .map_err(|_| HikeMapError::InvalidAttribute {
                element,
                attribute,
                value: val.to_string(),
            })?;
        if attribute == "lat" {
            lat = Some(parsed);
        } else {
            lon = Some(parsed);
        }
    }

    let lat = lat.ok_or(HikeMapError::MissingAttribute {
        element,
        attribute: "lat",
    })?;
    let lon = lon.ok_or(HikeMapError::MissingAttribute {
        element,
        attribute: "lon",
    })?;

    Ok((lat, lon))
}

fn position_or_warn(e: &BytesStart<'_>, element: &'static str) -> Option<(f64, f64)> {
    match parse_lat_lon(e, element) {
        Ok(coords) => Some(coords),
        Err(err) => {
            warn!("skipping <{element}>: {err}");
            None
        }
    }
}

/// Parse the children of a <trkseg>. Called after its Event::Start.
fn parse_segment<'a>(
    reader: &mut Reader<&'a [u8]>,
    scan: &mut DocumentScan,
) -> Result<Vec<TrackLogPoint>> {
    let mut points = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(pt) = parse_track_point(&e, reader, scan)? {
                        points.push(pt);
                    }
                }
                local => {
                    if let Some(field) = TextField::from_local_name(local) {
                        scan.read_field(field, &e, reader)?;
                    }
                }
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some((lat, lon)) = position_or_warn(&e, "trkpt") {
                        points.push(TrackLogPoint {
                            timestamp: None,
                            value: Position::new(lat, lon),
                        });
                    }
                }
                local => {
                    if let Some(field) = TextField::from_local_name(local) {
                        scan.note(field, "");
                    }
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(HikeMapError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(points)
}

/// Parse a <trkpt> and its children.
/// Returns None when the point has no usable lat/lon; its children are still
/// scanned for document-level fields.
fn parse_track_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    scan: &mut DocumentScan,
) -> Result<Option<TrackLogPoint>> {
    let position = position_or_warn(start, "trkpt");
    let end_name = start.name().0.to_vec();
    let mut timestamp: Option<String> = None;
    let mut elevation: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if let Some(field) = TextField::from_local_name(e.local_name().as_ref()) {
                    let text = scan.read_field(field, &e, reader)?;
                    match field {
                        TextField::Time if timestamp.is_none() => timestamp = Some(text),
                        TextField::Elevation if elevation.is_none() => elevation = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(field) = TextField::from_local_name(e.local_name().as_ref()) {
                    scan.note(field, "");
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(HikeMapError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(position.map(|(lat, lon)| TrackLogPoint {
        timestamp: non_empty(timestamp),
        value: Position {
            lat,
            lon,
            ele: elevation.and_then(|text| text.trim().parse::<f64>().ok()),
        },
    }))
}

/// Parse a <wpt> and its children, keeping its own <time> aside.
fn parse_waypoint<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    scan: &mut DocumentScan,
) -> Result<PendingWaypoint> {
    let mut wpt = PendingWaypoint {
        position: position_or_warn(start, "wpt"),
        time: None,
    };
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if let Some(field) = TextField::from_local_name(e.local_name().as_ref()) {
                    let text = scan.read_field(field, &e, reader)?;
                    if field == TextField::Time && wpt.time.is_none() {
                        wpt.time = Some(text);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(field) = TextField::from_local_name(e.local_name().as_ref()) {
                    scan.note(field, "");
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(HikeMapError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(wpt)
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(HikeMapError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIKE_GPX: &str = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="test">
  <metadata>
    <name>North Chickamauga</name>
    <desc>Day one</desc>
    <time>2022-05-07T10:00:00Z</time>
  </metadata>
  <wpt lat="35.2" lon="-85.2">
    <time>2022-05-07T12:30:00Z</time>
    <name>Camp</name>
  </wpt>
  <trk>
    <extensions><color>#AA0088</color></extensions>
    <trkseg>
      <trkpt lat="35.1" lon="-85.1"><ele>300.5</ele><time>2022-05-07T11:00:00Z</time></trkpt>
      <trkpt lat="35.11" lon="-85.11"><time>2022-05-07T11:01:00Z</time></trkpt>
      <trkpt lat="35.12" lon="-85.12"/>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_full_track_log() {
        let log = parse_track_log(HIKE_GPX).unwrap();
        assert_eq!(log.name.as_deref(), Some("North Chickamauga"));
        assert_eq!(log.description.as_deref(), Some("Day one"));
        assert_eq!(log.color.as_deref(), Some("#AA0088"));

        let track = log.track.unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track[0].timestamp.as_deref(), Some("2022-05-07T11:00:00Z"));
        assert_eq!(track[0].value.lat, 35.1);
        assert_eq!(track[0].value.lon, -85.1);
        assert_eq!(track[0].value.ele, Some(300.5));
        assert_eq!(track[1].value.ele, None);
        assert_eq!(track[2].timestamp, None);
    }

    #[test]
    fn test_waypoint_takes_document_time_by_default() {
        let log = parse_track_log(HIKE_GPX).unwrap();
        let wpt = log.waypoint.unwrap();
        assert_eq!(wpt.value, Position::new(35.2, -85.2));
        assert_eq!(wpt.timestamp.as_deref(), Some("2022-05-07T10:00:00Z"));
    }

    #[test]
    fn test_waypoint_own_time_option() {
        let opts = ParseOptions {
            waypoint_time: WaypointTime::Waypoint,
        };
        let log = parse_track_log_with(HIKE_GPX, &opts).unwrap();
        let wpt = log.waypoint.unwrap();
        assert_eq!(wpt.timestamp.as_deref(), Some("2022-05-07T12:30:00Z"));
    }

    #[test]
    fn test_first_time_may_come_from_a_track_point() {
        let xml = r#"<gpx>
  <trk><trkseg>
    <trkpt lat="1.0" lon="2.0"><time>2022-01-01T00:00:00Z</time></trkpt>
  </trkseg></trk>
  <wpt lat="3.0" lon="4.0"><time>2022-02-02T00:00:00Z</time></wpt>
</gpx>"#;
        let log = parse_track_log(xml).unwrap();
        assert_eq!(
            log.waypoint.unwrap().timestamp.as_deref(),
            Some("2022-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_missing_trkseg_is_absent() {
        let xml = r#"<gpx><trk><name>No segments</name></trk></gpx>"#;
        let log = parse_track_log(xml).unwrap();
        assert!(log.track.is_none());
        assert_eq!(log.name.as_deref(), Some("No segments"));
    }

    #[test]
    fn test_empty_trkseg_is_empty_list() {
        let log = parse_track_log(r#"<gpx><trk><trkseg></trkseg></trk></gpx>"#).unwrap();
        assert_eq!(log.track, Some(Vec::new()));

        let log = parse_track_log(r#"<gpx><trk><trkseg/></trk></gpx>"#).unwrap();
        assert_eq!(log.track, Some(Vec::new()));
    }

    #[test]
    fn test_only_first_trkseg_is_used() {
        let xml = r#"<gpx><trk>
  <trkseg><trkpt lat="1.0" lon="1.0"/></trkseg>
  <trkseg><trkpt lat="2.0" lon="2.0"/><trkpt lat="3.0" lon="3.0"/></trkseg>
</trk></gpx>"#;
        let log = parse_track_log(xml).unwrap();
        assert_eq!(log.track.unwrap().len(), 1);
    }

    #[test]
    fn test_no_waypoint_is_absent() {
        let log = parse_track_log(r#"<gpx><name>x</name></gpx>"#).unwrap();
        assert!(log.waypoint.is_none());
    }

    #[test]
    fn test_empty_first_name_is_omitted() {
        let xml = r#"<gpx><metadata><name></name></metadata><trk><name>Later</name></trk></gpx>"#;
        let log = parse_track_log(xml).unwrap();
        assert!(log.name.is_none());
    }

    #[test]
    fn test_bad_track_point_skipped() {
        let xml = r#"<gpx><trk><trkseg>
  <trkpt lat="1.0" lon="1.0"/>
  <trkpt lat="north" lon="1.0"><time>2022-01-01T00:00:00Z</time></trkpt>
  <trkpt lon="1.0"/>
  <trkpt lat="2.0" lon="2.0"/>
</trkseg></trk></gpx>"#;
        let log = parse_track_log(xml).unwrap();
        let track = log.track.unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track[1].value, Position::new(2.0, 2.0));
    }

    #[test]
    fn test_waypoint_without_coordinates_is_absent() {
        let log = parse_track_log(r#"<gpx><wpt><name>Nowhere</name></wpt></gpx>"#).unwrap();
        assert!(log.waypoint.is_none());
        assert_eq!(log.name.as_deref(), Some("Nowhere"));
    }

    #[test]
    fn test_cdata_and_entities() {
        let xml = r#"<gpx>
  <name><![CDATA[Café & Bar]]></name>
  <desc>Rocks &amp; roots &#60;steep&#62;</desc>
</gpx>"#;
        let log = parse_track_log(xml).unwrap();
        assert_eq!(log.name.as_deref(), Some("Café & Bar"));
        assert_eq!(log.description.as_deref(), Some("Rocks & roots <steep>"));
    }

    #[test]
    fn test_empty_document() {
        let log = parse_track_log("").unwrap();
        assert_eq!(log, TrackLog::default());
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        let result = parse_track_log(r#"<gpx><trk><name>x</trk></gpx>"#);
        assert!(matches!(result, Err(HikeMapError::XmlParse(_))));
    }
}
