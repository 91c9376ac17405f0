//! Resolving how many lanes a way has in each direction, and what kind each
//! lane is.

use anyhow::{bail, Result};
use laneutil::Tags;
use serde::{Deserialize, Serialize};

use crate::cross_section::LaneKind;
use crate::{osm, tags, PieceDirection};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LaneCounts {
    pub fwd: usize,
    pub back: usize,
    pub both_ways: usize,
}

impl LaneCounts {
    /// Interprets the lanes tag family. The unsuffixed total is split over
    /// directions that aren't explicitly tagged. Structural contradictions
    /// (more directional lanes than the total, a oneway road tagged with
    /// backward lanes, positional tags disagreeing about the lane count) fail
    /// the whole cross-section.
    pub fn resolve(tags: &Tags, oneway: bool) -> Result<LaneCounts> {
        let total = parse_count(tags, osm::LANES);
        let fwd = parse_count(tags, "lanes:forward");
        let back = parse_count(tags, "lanes:backward");
        let both_ways = parse_count(tags, "lanes:both_ways");

        if oneway && (back.unwrap_or(0) > 0 || both_ways.unwrap_or(0) > 0) {
            bail!("a oneway road can't have backward or both_ways lanes");
        }

        let mut counts = if oneway {
            LaneCounts {
                fwd: fwd.or(total).unwrap_or(1),
                back: 0,
                both_ways: 0,
            }
        } else {
            let both_ways = both_ways.unwrap_or(0);
            let (fwd, back) = match (fwd, back) {
                (Some(f), Some(b)) => {
                    if let Some(t) = total {
                        if t != f + b + both_ways {
                            warn!(
                                "lanes={} disagrees with directional counts {}+{}+{}; trusting the directions",
                                t, f, b, both_ways
                            );
                        }
                    }
                    (f, b)
                }
                (Some(f), None) => {
                    let b = match total {
                        Some(t) => match t.checked_sub(f + both_ways) {
                            Some(b) => b,
                            None => bail!("lanes={} is less than lanes:forward={}", t, f),
                        },
                        None => 1,
                    };
                    (f, b)
                }
                (None, Some(b)) => {
                    let f = match total {
                        Some(t) => match t.checked_sub(b + both_ways) {
                            Some(f) => f,
                            None => bail!("lanes={} is less than lanes:backward={}", t, b),
                        },
                        None => 1,
                    };
                    (f, b)
                }
                (None, None) => match total {
                    Some(t) => {
                        let remaining = match t.checked_sub(both_ways) {
                            Some(x) => x,
                            None => bail!("lanes={} is less than lanes:both_ways={}", t, both_ways),
                        };
                        // Split evenly, with the extra lane going forward
                        ((remaining + 1) / 2, remaining / 2)
                    }
                    None => (1, 1),
                },
            };
            LaneCounts {
                fwd,
                back,
                both_ways,
            }
        };

        // A lone both_ways lane with nothing around it doesn't describe a
        // real road; treat it as a single forward lane.
        if counts.fwd == 0 && counts.back == 0 && counts.both_ways == 1 {
            counts.fwd = 1;
            counts.both_ways = 0;
        }
        if counts.both_ways > 1 {
            warn!("lanes:both_ways={} makes no sense; keeping 1", counts.both_ways);
            counts.both_ways = 1;
        }

        if counts.total() == 0 {
            bail!("no lanes at all");
        }

        validate_positional_lengths(tags, &counts, oneway)?;
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.fwd + self.back + self.both_ways
    }

    pub fn count(&self, dir: PieceDirection) -> usize {
        match dir {
            PieceDirection::Fwd => self.fwd,
            PieceDirection::Back => self.back,
            PieceDirection::Both => self.both_ways,
        }
    }
}

fn parse_count(tags: &Tags, key: &str) -> Option<usize> {
    let value = tags.get(key)?;
    match value.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring unparsable {}={}", key, value);
            None
        }
    }
}

/// Every positional tag on the way must agree with the resolved lane counts.
fn validate_positional_lengths(tags: &Tags, counts: &LaneCounts, oneway: bool) -> Result<()> {
    let mut families: Vec<String> = vec![
        format!("{}:lanes", osm::TURN),
        format!("{}:lanes", osm::CHANGE),
        osm::WIDTH_LANES.to_string(),
    ];
    families.extend(osm::LANE_CLASS_FILTERS.iter().map(|x| x.to_string()));

    for base in families {
        for (key, expected) in [
            (format!("{}:forward", base), counts.fwd),
            (format!("{}:backward", base), counts.back),
        ] {
            if let Some(value) = tags.get(&key) {
                let actual = value.split('|').count();
                if actual != expected {
                    bail!("{}={} describes {} lanes, but there are {}", key, value, actual, expected);
                }
            }
        }
        if let Some(value) = tags.get(&base) {
            if oneway {
                let actual = value.split('|').count();
                if actual != counts.fwd {
                    bail!(
                        "{}={} describes {} lanes, but there are {}",
                        base,
                        value,
                        actual,
                        counts.fwd
                    );
                }
            } else {
                warn!("Ignoring {}={} on a two-way road", base, value);
            }
        }
    }
    Ok(())
}

/// What kind of lane is at this position, according to the per-lane access
/// filters? Innermost lane is position 0.
pub fn lane_kind(tags: &Tags, dir: PieceDirection, pos: usize, oneway: bool) -> LaneKind {
    for key in ["bus:lanes", "psv:lanes", "taxi:lanes"] {
        if positional_value(tags, key, dir, pos, oneway) == Some("designated".to_string()) {
            return LaneKind::Bus;
        }
    }
    if positional_value(tags, "bicycle:lanes", dir, pos, oneway) == Some("designated".to_string())
        || positional_value(tags, "cycleway:lanes", dir, pos, oneway) == Some("lane".to_string())
    {
        return LaneKind::Bicycle;
    }
    LaneKind::Driving
}

fn positional_value(
    tags: &Tags,
    base: &str,
    dir: PieceDirection,
    pos: usize,
    oneway: bool,
) -> Option<String> {
    let value = crate::cross_section::changes::dir_tag_value(tags, base, dir, oneway)?;
    let x = tags::split_positional(&value, pos);
    if x.is_empty() {
        None
    } else {
        Some(x.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(pairs: Vec<(&str, &str)>, oneway: bool) -> Result<LaneCounts> {
        let mut tags = Tags::empty();
        for (k, v) in pairs {
            tags.insert(k, v);
        }
        LaneCounts::resolve(&tags, oneway)
    }

    #[test]
    fn inference() {
        // Subtraction from the total
        assert_eq!(
            resolve(vec![("lanes", "5"), ("lanes:forward", "3")], false).unwrap(),
            LaneCounts {
                fwd: 3,
                back: 2,
                both_ways: 0
            }
        );
        // Even split
        assert_eq!(
            resolve(vec![("lanes", "4")], false).unwrap(),
            LaneCounts {
                fwd: 2,
                back: 2,
                both_ways: 0
            }
        );
        // Odd split gives the extra lane to forward
        assert_eq!(
            resolve(vec![("lanes", "3")], false).unwrap(),
            LaneCounts {
                fwd: 2,
                back: 1,
                both_ways: 0
            }
        );
        // The total goes entirely forward on a oneway
        assert_eq!(
            resolve(vec![("lanes", "2")], true).unwrap(),
            LaneCounts {
                fwd: 2,
                back: 0,
                both_ways: 0
            }
        );
        // Untagged default
        assert_eq!(
            resolve(vec![], false).unwrap(),
            LaneCounts {
                fwd: 1,
                back: 1,
                both_ways: 0
            }
        );
    }

    #[test]
    fn lone_both_ways_lane_corrected() {
        assert_eq!(
            resolve(vec![("lanes", "1"), ("lanes:both_ways", "1")], false).unwrap(),
            LaneCounts {
                fwd: 1,
                back: 0,
                both_ways: 0
            }
        );
    }

    #[test]
    fn structural_contradictions() {
        assert!(resolve(vec![("lanes", "2"), ("lanes:forward", "3")], false).is_err());
        assert!(resolve(vec![("lanes", "2"), ("lanes:backward", "1")], true).is_err());
        assert!(resolve(
            vec![("lanes:forward", "2"), ("turn:lanes:forward", "left|through|right")],
            false
        )
        .is_err());
        // A conflicting length on a oneway's unsuffixed positional tag
        assert!(resolve(vec![("lanes", "2"), ("turn:lanes", "left|through|right")], true).is_err());
    }
}
