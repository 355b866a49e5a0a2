use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::HikeMapError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Display format matching an en-US locale string, e.g. `5/7/2022, 11:11:43 AM`.
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Parse a timestamp as served by the hike API or found in a track log.
///
/// Accepts RFC 3339, RFC 2822 (the HTTP-date form the API's JSON encoder
/// emits) and naive ISO date-times, which are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, HikeMapError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| HikeMapError::InvalidTimestamp(value.to_string()))
}

/// Format a timestamp for display in the given zone.
pub fn format_in_zone<Tz>(value: &str, zone: &Tz) -> Result<String, HikeMapError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let dt = parse_timestamp(value)?;
    Ok(dt.with_timezone(zone).format(DISPLAY_FORMAT).to_string())
}

/// Resolve an IANA zone name such as `US/Eastern`.
pub fn parse_zone(name: &str) -> Result<Tz, HikeMapError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| HikeMapError::InvalidZone(name.to_string()))
}
