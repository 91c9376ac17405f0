//! Lane-level right-of-way across a junction: which lane of the main road
//! continues into which lane of each connected road, so markings flow through
//! forks, merges, and lane-count changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geom::Distance;
use laneutil::{deserialize_btreemap, serialize_btreemap, wraparound_get};

use crate::junction::WayVector;
use crate::osm::NodeID;
use crate::{Direction, DrivingSide, PieceDirection, StreetNetwork};

/// One directed lane on one road. The lane is a signed index counted outward
/// from the road's centerline, positive in the road's forward tagging
/// direction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LaneRef {
    pub vector: WayVector,
    pub lane: i64,
}

/// The lane mapping at one junction, keyed by directed lane index on the main
/// road. Each main lane appears at most once per direction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RightOfWay {
    pub main: WayVector,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    map: BTreeMap<i64, LaneRef>,
}

impl RightOfWay {
    pub fn get(&self, main_lane: i64) -> Option<&LaneRef> {
        self.map.get(&main_lane)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i64, &LaneRef)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The reverse lookup: which main lane continues into this connected
    /// lane?
    pub fn main_lane_for(&self, vector: WayVector, lane: i64) -> Option<i64> {
        self.map
            .iter()
            .find(|(_, r)| r.vector == vector && r.lane == lane)
            .map(|(k, _)| *k)
    }
}

/// How one connected way relates to the junction node, lane-count-wise.
struct ConnectedWay {
    vector: WayVector,
    /// Lanes travelling towards the node.
    in_lanes: usize,
    /// Lanes travelling away from the node.
    out_lanes: usize,
}

impl ConnectedWay {
    /// The sign of directed lane indices for lanes travelling away from the
    /// node. The vector looks outward, so looking forward means the forward
    /// tagging direction leaves the junction.
    fn out_sign(&self) -> i64 {
        if self.vector.dir() == Direction::Fwd {
            1
        } else {
            -1
        }
    }
}

/// Computes the right-of-way at a single-node junction. Only two topologies
/// resolve: a one-way fork or merge, and a two-way road splitting into one-way
/// halves. Anything else yields None, and lanes simply end unconnected.
pub fn compute(network: &StreetNetwork, node: NodeID) -> Option<RightOfWay> {
    let vectors = network.way_vectors_at(node);
    if vectors.len() < 3 {
        return None;
    }
    let mut ways = Vec::new();
    for v in vectors {
        // Junction resolution needs every connected way's lane counts
        let cs = network.cross_section(v.way)?;
        let (in_lanes, out_lanes) = if v.dir() == Direction::Fwd {
            (cs.counts.back, cs.counts.fwd)
        } else {
            (cs.counts.fwd, cs.counts.back)
        };
        ways.push(ConnectedWay {
            vector: v,
            in_lanes,
            out_lanes,
        });
    }

    one_way_fork_or_merge(network, node, &ways).or_else(|| two_way_split(network, node, &ways))
}

/// All roads one-way: a single road flows in and several out (a fork), or
/// several in and one out (a merge).
fn one_way_fork_or_merge(
    network: &StreetNetwork,
    node: NodeID,
    ways: &[ConnectedWay],
) -> Option<RightOfWay> {
    if !ways
        .iter()
        .all(|w| (w.in_lanes == 0) != (w.out_lanes == 0))
    {
        return None;
    }
    let inbound: Vec<&ConnectedWay> = ways.iter().filter(|w| w.in_lanes > 0).collect();
    let outbound: Vec<&ConnectedWay> = ways.iter().filter(|w| w.out_lanes > 0).collect();
    let (main, main_inbound) = if inbound.len() == 1 && outbound.len() >= 2 {
        (inbound[0], true)
    } else if outbound.len() == 1 && inbound.len() >= 2 {
        (outbound[0], false)
    } else {
        return None;
    };

    let branches = clockwise_from_main(ways, main);
    let mut map = BTreeMap::new();
    allocate(network, node, main, &branches, main_inbound, &mut map);
    Some(RightOfWay {
        main: main.vector,
        map,
    })
}

/// Exactly one two-way road, everything else one-way: a dual-carriageway
/// split. The main road's two directions allocate independently.
fn two_way_split(
    network: &StreetNetwork,
    node: NodeID,
    ways: &[ConnectedWay],
) -> Option<RightOfWay> {
    let bidirectional: Vec<&ConnectedWay> = ways
        .iter()
        .filter(|w| w.in_lanes > 0 && w.out_lanes > 0)
        .collect();
    if bidirectional.len() != 1 {
        return None;
    }
    let main = bidirectional[0];
    if !ways
        .iter()
        .all(|w| w.vector == main.vector || (w.in_lanes == 0) != (w.out_lanes == 0))
    {
        return None;
    }

    let branches = clockwise_from_main(ways, main);
    let mut map = BTreeMap::new();
    allocate(network, node, main, &branches, true, &mut map);
    allocate(network, node, main, &branches, false, &mut map);
    Some(RightOfWay {
        main: main.vector,
        map,
    })
}

/// All ways except the main one, in clockwise bearing order starting from the
/// main way.
fn clockwise_from_main<'a>(ways: &'a [ConnectedWay], main: &ConnectedWay) -> Vec<&'a ConnectedWay> {
    let idx = ways
        .iter()
        .position(|w| w.vector == main.vector)
        .unwrap();
    let mut result = Vec::new();
    for i in 1..ways.len() {
        result.push(wraparound_get(ways, (idx + i) as isize));
    }
    result
}

/// Walks the branches clockwise from the main road, each claiming the next
/// contiguous block of the main road's lanes for one flow direction. Traffic
/// flowing out of the main road allocates from its leftmost lane; flowing
/// into it, from its rightmost. Left-to-right order is preserved within each
/// block, which is what keeps markings continuous; whether "leftmost" is the
/// innermost or outermost lane index follows from the handedness.
fn allocate(
    network: &StreetNetwork,
    node: NodeID,
    main: &ConnectedWay,
    branches: &[&ConnectedWay],
    main_inbound: bool,
    map: &mut BTreeMap<i64, LaneRef>,
) {
    let main_total = if main_inbound {
        main.in_lanes
    } else {
        main.out_lanes
    };
    let branch_sizes: Vec<usize> = branches
        .iter()
        .map(|b| if main_inbound { b.out_lanes } else { b.in_lanes })
        .collect();
    let branch_total: usize = branch_sizes.iter().sum();
    if branch_total != main_total {
        warn!(
            "Lane allocation mismatch at {}: the main road has {} lanes, the branches claim {}; mapping what fits",
            node, main_total, branch_total
        );
    }

    let main_side = side_of(network, main);
    let main_sign = if main_inbound {
        -main.out_sign()
    } else {
        main.out_sign()
    };

    // Left-to-right slots on the main road, in the travel frame of this
    // flow. Clockwise branches claim blocks leftmost-first for traffic
    // leaving the main road, rightmost-first for traffic entering it.
    let mut block_starts: Vec<i64> = Vec::with_capacity(branch_sizes.len());
    if main_inbound {
        let mut c = 1i64;
        for m in &branch_sizes {
            block_starts.push(c);
            c += *m as i64;
        }
    } else {
        let mut c = main_total as i64 + 1;
        for m in &branch_sizes {
            c -= *m as i64;
            block_starts.push(c);
        }
    }

    for ((branch, m), start) in branches
        .iter()
        .copied()
        .zip(branch_sizes.iter())
        .zip(block_starts.into_iter())
    {
        let m = *m;
        if m == 0 {
            continue;
        }
        let branch_side = side_of(network, branch);
        let branch_sign = if main_inbound {
            branch.out_sign()
        } else {
            -branch.out_sign()
        };
        for k in 0..m {
            let main_ltr = start + k as i64;
            if main_ltr < 1 || main_ltr > main_total as i64 {
                // Best-effort on a mismatch; the rest won't fit
                continue;
            }
            let main_pos = ltr_to_pos(main_ltr, main_total, main_side);
            let branch_pos = ltr_to_pos(k as i64 + 1, m, branch_side);
            map.insert(
                main_pos * main_sign,
                LaneRef {
                    vector: branch.vector,
                    lane: branch_pos * branch_sign,
                },
            );
        }
    }
}

/// From a left-to-right slot in the travel frame to a lane index counted
/// outward from the centerline. Right-hand traffic has the innermost lane on
/// the left.
fn ltr_to_pos(ltr: i64, total: usize, side: DrivingSide) -> i64 {
    match side {
        DrivingSide::Right => ltr,
        DrivingSide::Left => total as i64 + 1 - ltr,
    }
}

fn side_of(network: &StreetNetwork, way: &ConnectedWay) -> DrivingSide {
    network
        .cross_section(way.vector.way)
        .map(|cs| cs.driving_side)
        .unwrap_or(network.config.driving_side)
}

/// Keeps a junction node lined up with a connected road's placement: maps the
/// placement-designated lane through the right-of-way onto the main road and
/// asks for that lane's offset there. Any failure along the chain means no
/// correction.
pub fn placement_offset(
    network: &StreetNetwork,
    row: &RightOfWay,
    connected: WayVector,
) -> Distance {
    try_placement_offset(network, row, connected).unwrap_or(Distance::ZERO)
}

fn try_placement_offset(
    network: &StreetNetwork,
    row: &RightOfWay,
    connected: WayVector,
) -> Option<Distance> {
    let cs = network.cross_section(connected.way)?;
    let way = network.maybe_way(connected.way)?;
    let placement = if connected.from == 0 {
        cs.placement_start
    } else if connected.from + 1 == way.nodes.len() {
        cs.placement_end
    } else {
        None
    }?;

    let sign = match placement.dir {
        PieceDirection::Fwd => 1,
        PieceDirection::Back => -1,
        PieceDirection::Both => 0,
    };
    let main_lane = row.main_lane_for(connected, placement.lane as i64 * sign)?;
    let main_cs = network.cross_section(row.main.way)?;
    let piece = main_cs.lane_by_index(main_lane)?;
    let fraction = network.node_fraction(row.main.way, row.main.from);
    Some(piece.offset_at(fraction))
}
