//! Low-level parsing of tag values. All of the string splitting lives here, so
//! the rest of the crate works with typed values.

use geom::Distance;
use laneutil::Tags;

use crate::{osm, DrivingSide, MapConfig, PieceDirection};

/// The standard width of one lane. Used when a width is tagged in lane
/// multiples, as the default width of a driving lane, and to extrapolate
/// placement anchors past the edge of a road.
pub const LANE_WIDTH: Distance = Distance::const_meters(3.5);

/// Parses a width value like "3.5", "3.5 m", "0.5 km", "0.1 mi", "10'",
/// "10'6\"", or "2 lanes" into meters. Malformed input yields None and the
/// caller picks a default.
pub fn parse_width(value: &str) -> Option<Distance> {
    let value = value.trim();
    // The space before a unit is optional in the wild
    if let Some(x) = value
        .strip_suffix("lanes")
        .or_else(|| value.strip_suffix("lane"))
    {
        return Some(LANE_WIDTH * parse_finite(x)?);
    }
    if let Some(x) = value.strip_suffix("km") {
        return Some(Distance::kilometers(parse_finite(x)?));
    }
    if let Some(x) = value.strip_suffix("mi") {
        return Some(Distance::miles(parse_finite(x)?));
    }
    if let Some(x) = value.strip_suffix('m') {
        return Some(Distance::meters(parse_finite(x)?));
    }
    if let Some(x) = value.strip_suffix('"') {
        // feet'inches" or just inches"
        if let Some((feet, inches)) = x.split_once('\'') {
            return Some(Distance::feet(parse_finite(feet)?) + Distance::inches(parse_finite(inches)?));
        }
        return Some(Distance::inches(parse_finite(x)?));
    }
    if let Some(x) = value.strip_suffix('\'') {
        return Some(Distance::feet(parse_finite(x)?));
    }
    Some(Distance::meters(parse_finite(value)?))
}

fn parse_finite(x: &str) -> Option<f64> {
    x.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The value at a 0-based position in a |-delimited string. Positions past the
/// end mean "not specified for this lane" and yield "".
pub fn split_positional(value: &str, pos: usize) -> &str {
    value.split('|').nth(pos).unwrap_or("")
}

/// Splits a |-delimited per-lane string into exactly num_lanes values. Empty
/// or missing positions become None; extra values past num_lanes are ignored.
pub fn parse_per_lane(value: &str, num_lanes: usize) -> Vec<Option<String>> {
    let mut result: Vec<Option<String>> = value
        .split('|')
        .take(num_lanes)
        .map(|x| {
            if x.is_empty() {
                None
            } else {
                Some(x.to_string())
            }
        })
        .collect();
    result.resize(num_lanes, None);
    result
}

/// Splits a ;-delimited multi-value within one lane.
pub fn split_multi(value: &str) -> Vec<&str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .collect()
}

pub fn is_oneway(tags: &Tags) -> bool {
    tags.is_any(osm::ONEWAY, vec!["yes", "reversible", "1", "true"])
}

pub fn is_roundabout(tags: &Tags) -> bool {
    tags.is(osm::JUNCTION, "roundabout") || tags.is(osm::JUNCTION, "circular")
}

/// The handedness for one way. The map-wide config decides, unless the way
/// carries an explicit driving_side override.
pub fn driving_side(tags: &Tags, cfg: &MapConfig) -> DrivingSide {
    match tags.get(osm::DRIVING_SIDE).map(|x| x.as_str()) {
        Some("left") => DrivingSide::Left,
        Some("right") => DrivingSide::Right,
        _ => cfg.driving_side,
    }
}

pub fn is_right_hand_traffic(tags: &Tags, cfg: &MapConfig) -> bool {
    driving_side(tags, cfg) == DrivingSide::Right
}

/// A tag key with the direction suffix for one partition of the road.
pub fn dir_key(base: &str, dir: PieceDirection) -> String {
    match dir {
        PieceDirection::Fwd => format!("{}:forward", base),
        PieceDirection::Back => format!("{}:backward", base),
        PieceDirection::Both => format!("{}:both_ways", base),
    }
}
