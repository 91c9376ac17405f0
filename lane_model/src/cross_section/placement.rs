//! The placement tag family: where the way's node line sits laterally within
//! the road's painted width.

use geom::Distance;
use laneutil::Tags;
use serde::{Deserialize, Serialize};

use crate::cross_section::CrossSection;
use crate::{osm, tags, DrivingSide, PieceDirection};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PlacementAnchor {
    LeftOf,
    MiddleOf,
    RightOf,
}

/// The way's node line runs along an edge (or the middle) of one particular
/// lane. Lanes are numbered from 1 outward from the center, per direction,
/// and left/right are relative to that direction of travel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub anchor: PlacementAnchor,
    pub lane: usize,
    pub dir: PieceDirection,
}

/// Parses the placement tag family: placement[:forward|:backward|:both_ways]
/// [:start|:end], valued left_of:N / middle_of:N / right_of:N. Returns the
/// placement at the start and end of the way. Malformed values are ignored.
pub fn parse(tags: &Tags) -> (Option<Placement>, Option<Placement>) {
    let base = parse_variant(tags, None);
    let start = parse_variant(tags, Some("start")).or(base);
    let end = parse_variant(tags, Some("end")).or(base);
    (start, end)
}

fn parse_variant(tags: &Tags, position: Option<&str>) -> Option<Placement> {
    for (suffix, dir) in [
        (":forward", PieceDirection::Fwd),
        (":backward", PieceDirection::Back),
        (":both_ways", PieceDirection::Both),
        ("", PieceDirection::Fwd),
    ] {
        let key = match position {
            Some(p) => format!("{}{}:{}", osm::PLACEMENT, suffix, p),
            None => format!("{}{}", osm::PLACEMENT, suffix),
        };
        if let Some(value) = tags.get(&key) {
            if value == "transition" {
                // The anchor slides between the neighbors' placements; the
                // default midpoint is the best single answer here.
                return None;
            }
            match parse_value(value, dir) {
                Some(p) => {
                    return Some(p);
                }
                None => {
                    warn!("Ignoring malformed {}={}", key, value);
                }
            }
        }
    }
    None
}

fn parse_value(value: &str, default_dir: PieceDirection) -> Option<Placement> {
    let (anchor, rest) = match value.split_once(':') {
        Some(("left_of", rest)) => (PlacementAnchor::LeftOf, rest),
        Some(("middle_of", rest)) => (PlacementAnchor::MiddleOf, rest),
        Some(("right_of", rest)) => (PlacementAnchor::RightOf, rest),
        _ => {
            return None;
        }
    };
    // The lane number may carry a trailing direction marker, like "2f"
    let (digits, dir) = match rest.chars().last() {
        Some('f') => (&rest[..rest.len() - 1], PieceDirection::Fwd),
        Some('b') => (&rest[..rest.len() - 1], PieceDirection::Back),
        Some('m') => (&rest[..rest.len() - 1], PieceDirection::Both),
        _ => (rest, default_dir),
    };
    let lane = digits.parse::<usize>().ok()?;
    if lane == 0 {
        return None;
    }
    Some(Placement { anchor, lane, dir })
}

/// The offset from the way's centerline to the left edge of the whole
/// cross-section, seeding the offsets of every piece. Positive offsets go
/// towards the right of the way's forward direction. With no placement, the
/// node line runs down the middle of the road.
pub fn left_edge_offset(
    cs: &CrossSection,
    placement: Option<Placement>,
    at_start: bool,
) -> Distance {
    if let Some(p) = placement {
        if let Some(x) = anchor_from_left_edge(cs, p, at_start) {
            return -x;
        }
        warn!(
            "No usable {:?} lane for a placement anchor; defaulting to the midpoint",
            p.dir
        );
    }
    -cs.total_width(at_start) / 2.0
}

/// How far the anchor sits from the cross-section's left edge. None when the
/// placement's direction has no lanes at all.
fn anchor_from_left_edge(cs: &CrossSection, p: Placement, at_start: bool) -> Option<Distance> {
    // Left-edge positions of every piece, in cross-section coordinates
    let mut lefts: Vec<Distance> = Vec::with_capacity(cs.pieces.len());
    let mut x = Distance::ZERO;
    for id in &cs.order {
        lefts.push(x);
        x += cs.piece(*id).width(at_start);
    }

    let lanes: Vec<usize> = cs
        .order
        .iter()
        .enumerate()
        .filter(|(_, id)| {
            let piece = cs.piece(**id);
            piece.is_lane() && piece.dir == p.dir
        })
        .map(|(order_idx, _)| order_idx)
        .collect();
    if lanes.is_empty() {
        return None;
    }

    // Does this direction's lane numbering increase leftwards or rightwards
    // in the cross-section order?
    let outward = if lanes.len() >= 2 {
        if cs.piece(cs.order[lanes[0]]).pos < cs.piece(cs.order[*lanes.last().unwrap()]).pos {
            1.0
        } else {
            -1.0
        }
    } else if (p.dir == PieceDirection::Back) == (cs.driving_side == DrivingSide::Right) {
        -1.0
    } else {
        1.0
    };

    let pick = |order_idx: usize| -> Distance {
        let piece = cs.piece(cs.order[order_idx]);
        let left = lefts[order_idx];
        let right = left + piece.width(at_start);
        // left_of and right_of are in the lane's own direction of travel
        let travel_flipped = piece.dir == PieceDirection::Back;
        match p.anchor {
            PlacementAnchor::MiddleOf => (left + right) / 2.0,
            PlacementAnchor::LeftOf => {
                if travel_flipped {
                    right
                } else {
                    left
                }
            }
            PlacementAnchor::RightOf => {
                if travel_flipped {
                    left
                } else {
                    right
                }
            }
        }
    };

    let count = lanes.len();
    if p.lane <= count {
        // lanes is ordered by cross-section position; find the one with the
        // matching outward position
        let order_idx = *lanes
            .iter()
            .find(|idx| cs.piece(cs.order[**idx]).pos == p.lane - 1)?;
        return Some(pick(order_idx));
    }

    // The referenced lane doesn't exist on this segment (an adjoining segment
    // has more lanes). Extrapolate past the boundary lane by whole lane
    // widths, so placement stays continuous across the lane-count change.
    let boundary_idx = if outward > 0.0 {
        *lanes.last().unwrap()
    } else {
        lanes[0]
    };
    let steps = (p.lane - count) as f64;
    Some(pick(boundary_idx) + tags::LANE_WIDTH * steps * outward)
}
