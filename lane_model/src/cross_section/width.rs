//! Per-piece widths: explicit tags, per-kind defaults, and distribution of an
//! aggregate width over the lanes that weren't explicitly sized.

use geom::Distance;
use laneutil::Tags;

use crate::cross_section::changes::dir_tag_value;
use crate::cross_section::{CrossSection, LaneKind, PieceKind};
use crate::{osm, tags, PieceDirection};

/// The painted center line between opposing directions.
pub const CENTER_DIVIDER_WIDTH: Distance = Distance::const_meters(0.5);
const BIKE_LANE_WIDTH: Distance = Distance::const_meters(1.5);
const BUS_LANE_WIDTH: Distance = Distance::const_meters(3.5);

pub fn default_width(kind: PieceKind, dir: PieceDirection) -> Distance {
    match kind {
        PieceKind::Lane(LaneKind::Driving) => tags::LANE_WIDTH,
        PieceKind::Lane(LaneKind::Bus) => BUS_LANE_WIDTH,
        PieceKind::Lane(LaneKind::Bicycle) => BIKE_LANE_WIDTH,
        // Dashed lines between same-direction lanes are painted inside the
        // lanes; only the center line claims room of its own.
        PieceKind::Divider(_) => {
            if dir == PieceDirection::Both {
                CENTER_DIVIDER_WIDTH
            } else {
                Distance::ZERO
            }
        }
        PieceKind::Edge => Distance::ZERO,
    }
}

/// Assigns every piece its width at the start and end of the way. Pieces with
/// explicit width tags (and all dividers and edges) are fixed; when the way
/// carries an aggregate width, whatever remains after the fixed pieces is
/// distributed over the other lanes, proportionally to their default widths.
/// Start and end are handled independently, so a tagged road can taper.
pub fn distribute_widths(cs: &mut CrossSection, tags: &Tags, oneway: bool) {
    for at_start in [true, false] {
        distribute_one_end(cs, tags, oneway, at_start);
    }
}

fn distribute_one_end(cs: &mut CrossSection, tags: &Tags, oneway: bool, at_start: bool) {
    // An explicit width, or the default for the piece's kind. Lanes without
    // an explicit width may be rescaled below.
    let mut widths: Vec<Distance> = Vec::with_capacity(cs.pieces.len());
    let mut scalable: Vec<bool> = Vec::with_capacity(cs.pieces.len());
    for piece in &cs.pieces {
        let explicit = match piece.kind {
            PieceKind::Lane(_) => {
                dir_tag_value(tags, osm::WIDTH_LANES, piece.dir, oneway).and_then(|value| {
                    tags::parse_width(tags::split_positional(&value, piece.pos))
                })
            }
            PieceKind::Divider(_) => {
                let key = if piece.dir == PieceDirection::Both {
                    osm::WIDTH_CENTRE_DIVIDER
                } else {
                    osm::WIDTH_DIVIDERS
                };
                tags.get(key).and_then(|value| tags::parse_width(value))
            }
            PieceKind::Edge => None,
        };
        scalable.push(explicit.is_none() && piece.is_lane());
        widths.push(explicit.unwrap_or_else(|| default_width(piece.kind, piece.dir)));
    }

    let aggregate_key = if at_start { "width:start" } else { "width:end" };
    let aggregate = tags
        .get(aggregate_key)
        .or_else(|| tags.get(osm::WIDTH))
        .and_then(|value| tags::parse_width(value));
    if let Some(aggregate) = aggregate {
        let fixed: Distance = widths
            .iter()
            .zip(scalable.iter())
            .filter(|(_, scalable)| !**scalable)
            .map(|(w, _)| *w)
            .sum();
        let default_sum: Distance = widths
            .iter()
            .zip(scalable.iter())
            .filter(|(_, scalable)| **scalable)
            .map(|(w, _)| *w)
            .sum();
        let remainder = aggregate - fixed;
        if default_sum > Distance::ZERO {
            if remainder > Distance::ZERO {
                let scale = remainder / default_sum;
                for (w, scalable) in widths.iter_mut().zip(scalable.iter()) {
                    if *scalable {
                        *w = *w * scale;
                    }
                }
            } else {
                warn!(
                    "{}={} leaves no room for the untagged lanes; keeping defaults",
                    aggregate_key, aggregate
                );
            }
        }
    }

    for (piece, w) in cs.pieces.iter_mut().zip(widths.into_iter()) {
        if at_start {
            piece.width_start = w;
        } else {
            piece.width_end = w;
        }
    }
}
