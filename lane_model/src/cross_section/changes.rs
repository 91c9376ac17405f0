//! Per-lane rules about changing lanes, from the change tag family.

use laneutil::Tags;
use serde::{Deserialize, Serialize};

use crate::{osm, tags, PieceDirection};

/// May vehicles leave this lane towards a neighbor? Left and right are
/// relative to the lane's own direction of travel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Change {
    Yes,
    No,
    NotLeft,
    NotRight,
    OnlyLeft,
    OnlyRight,
}

impl Change {
    /// Lanes without any change tagging may change freely.
    pub const DEFAULT: Change = Change::Yes;

    pub fn parse(value: &str) -> Option<Change> {
        match value {
            "yes" => Some(Change::Yes),
            "no" => Some(Change::No),
            "not_left" => Some(Change::NotLeft),
            "not_right" => Some(Change::NotRight),
            "only_left" => Some(Change::OnlyLeft),
            "only_right" => Some(Change::OnlyRight),
            _ => None,
        }
    }

    pub fn to_value(self) -> &'static str {
        match self {
            Change::Yes => "yes",
            Change::No => "no",
            Change::NotLeft => "not_left",
            Change::NotRight => "not_right",
            Change::OnlyLeft => "only_left",
            Change::OnlyRight => "only_right",
        }
    }

    pub fn may_change_left(self) -> bool {
        matches!(self, Change::Yes | Change::NotRight | Change::OnlyLeft)
    }

    pub fn may_change_right(self) -> bool {
        matches!(self, Change::Yes | Change::NotLeft | Change::OnlyRight)
    }
}

/// The change rule for every lane of one direction, innermost lane first.
/// Falls back from the positional change:lanes form to the direction tag to
/// the bare tag to the default. Unrecognized values are ignored.
pub fn parse_changes(tags: &Tags, dir: PieceDirection, num_lanes: usize, oneway: bool) -> Vec<Change> {
    let whole_road = tags
        .get(osm::CHANGE)
        .and_then(|v| Change::parse(v))
        .unwrap_or(Change::DEFAULT);
    let whole_direction = dir_tag_value(tags, osm::CHANGE, dir, oneway)
        .and_then(|v| Change::parse(&v))
        .unwrap_or(whole_road);

    let positional =
        dir_tag_value(tags, &format!("{}:lanes", osm::CHANGE), dir, oneway).unwrap_or_default();
    tags::parse_per_lane(&positional, num_lanes)
        .into_iter()
        .map(|v| {
            v.and_then(|v| Change::parse(&v))
                .unwrap_or(whole_direction)
        })
        .collect()
}

/// The value of a directional tag family member: base:forward etc, or the
/// unsuffixed base for the forward direction of a oneway road.
pub fn dir_tag_value(
    tags: &Tags,
    base: &str,
    dir: PieceDirection,
    oneway: bool,
) -> Option<String> {
    if let Some(v) = tags.get(&tags::dir_key(base, dir)) {
        return Some(v.to_string());
    }
    if oneway && dir == PieceDirection::Fwd {
        return tags.get(base).map(|v| v.to_string());
    }
    None
}
