//! Permitted turns per lane, from the turn tag family.

use laneutil::Tags;
use serde::{Deserialize, Serialize};

use crate::cross_section::changes::dir_tag_value;
use crate::{osm, tags, PieceDirection};

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Turn {
    Through,
    Left,
    Right,
    SlightLeft,
    SlightRight,
    SharpLeft,
    SharpRight,
    MergeToLeft,
    MergeToRight,
    Reverse,
    /// Explicitly tagged as no indication.
    None,
}

impl Turn {
    pub fn parse(value: &str) -> Option<Turn> {
        match value {
            "through" => Some(Turn::Through),
            "left" => Some(Turn::Left),
            "right" => Some(Turn::Right),
            "slight_left" => Some(Turn::SlightLeft),
            "slight_right" => Some(Turn::SlightRight),
            "sharp_left" => Some(Turn::SharpLeft),
            "sharp_right" => Some(Turn::SharpRight),
            "merge_to_left" => Some(Turn::MergeToLeft),
            "merge_to_right" => Some(Turn::MergeToRight),
            "reverse" => Some(Turn::Reverse),
            "none" => Some(Turn::None),
            _ => None,
        }
    }

    pub fn to_value(self) -> &'static str {
        match self {
            Turn::Through => "through",
            Turn::Left => "left",
            Turn::Right => "right",
            Turn::SlightLeft => "slight_left",
            Turn::SlightRight => "slight_right",
            Turn::SharpLeft => "sharp_left",
            Turn::SharpRight => "sharp_right",
            Turn::MergeToLeft => "merge_to_left",
            Turn::MergeToRight => "merge_to_right",
            Turn::Reverse => "reverse",
            Turn::None => "none",
        }
    }
}

/// The permitted turns for every lane of one direction, innermost lane first.
/// A lane may allow several turns at once (;-delimited). Unrecognized turn
/// values are dropped with a warning; a lane with no turn tagging gets an
/// empty set.
pub fn parse_turn_lanes(
    tags: &Tags,
    dir: PieceDirection,
    num_lanes: usize,
    oneway: bool,
) -> Vec<Vec<Turn>> {
    let whole_direction: Vec<Turn> = dir_tag_value(tags, osm::TURN, dir, oneway)
        .map(|v| parse_multi_turns(&v))
        .unwrap_or_default();

    let positional = dir_tag_value(
        tags,
        &format!("{}:lanes", osm::TURN),
        dir,
        oneway,
    )
    .unwrap_or_default();
    tags::parse_per_lane(&positional, num_lanes)
        .into_iter()
        .map(|v| match v {
            Some(v) => parse_multi_turns(&v),
            None => whole_direction.clone(),
        })
        .collect()
}

fn parse_multi_turns(value: &str) -> Vec<Turn> {
    let mut result = Vec::new();
    for x in tags::split_multi(value) {
        if let Some(t) = Turn::parse(x) {
            if !result.contains(&t) {
                result.push(t);
            }
        } else {
            warn!("Ignoring unrecognized turn value {}", x);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_values() {
        let mut t = Tags::empty();
        t.insert("turn:lanes", "left;through|through|right");
        let lanes = parse_turn_lanes(&t, PieceDirection::Fwd, 3, true);
        assert_eq!(
            lanes,
            vec![
                vec![Turn::Left, Turn::Through],
                vec![Turn::Through],
                vec![Turn::Right]
            ]
        );
    }

    #[test]
    fn unknown_values_dropped() {
        let mut t = Tags::empty();
        t.insert("turn:lanes:forward", "left;u_turn|right");
        let lanes = parse_turn_lanes(&t, PieceDirection::Fwd, 2, false);
        assert_eq!(lanes, vec![vec![Turn::Left], vec![Turn::Right]]);
    }
}
