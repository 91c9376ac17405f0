//! Junction discovery: find the nodes where roads meet, merge junctions that
//! overlap on the ground, explore the road graph inside each one, and work
//! out lane-level right-of-way.

mod graph;
mod merge;
mod right_of_way;
mod way_vector;

pub use graph::JunctionSegment;
pub use right_of_way::{placement_offset, LaneRef, RightOfWay};
pub use way_vector::WayVector;

use serde::{Deserialize, Serialize};

use geom::LonLat;
use laneutil::Timer;

use crate::osm::NodeID;
use crate::{tags, StreetNetwork};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Junction {
    /// One node usually; several when nearby junctions merged.
    pub nodes: Vec<NodeID>,
    pub center: LonLat,
    /// Roads strictly inside the junction, connecting its nodes.
    pub segments: Vec<JunctionSegment>,
    /// Outward-facing connections to the rest of the network.
    pub connectors: Vec<WayVector>,
    /// Absent when the junction's topology doesn't resolve; lanes then just
    /// end unconnected, which is fine.
    pub right_of_way: Option<RightOfWay>,
}

/// Finds all junctions. Every way's cross-section must already be resolved;
/// the lane counts drive right-of-way.
pub fn find_junctions(network: &StreetNetwork, timer: &mut Timer) -> Vec<Junction> {
    // A node is a junction candidate when more than two road ends touch it.
    // Roundabout nodes never are; the roundabout itself is the junction.
    let mut candidates: Vec<NodeID> = Vec::new();
    for (node, _) in network.all_nodes() {
        let vectors = network.way_vectors_at(*node);
        if vectors.len() <= 2 {
            continue;
        }
        if vectors
            .iter()
            .any(|v| tags::is_roundabout(&network.way(v.way).tags))
        {
            continue;
        }
        candidates.push(*node);
    }

    // Grouping needs the full sorted candidate list; it can't overlap with
    // the per-cluster work below.
    let clusters = merge::merge_candidates(network, candidates);

    timer.parallelize("explore junctions", clusters, |cluster| {
        build_junction(network, cluster)
    })
}

fn build_junction(network: &StreetNetwork, nodes: Vec<NodeID>) -> Junction {
    let pts: Vec<LonLat> = nodes.iter().map(|n| network.node(*n)).collect();
    let center = LonLat::center(&pts);
    let (segments, connectors) = graph::explore(network, &nodes);
    let right_of_way = if nodes.len() == 1 {
        right_of_way::compute(network, nodes[0])
    } else {
        None
    };
    Junction {
        nodes,
        center,
        segments,
        connectors,
        right_of_way,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use laneutil::Tags;

    use crate::osm::WayID;
    use crate::{DrivingSide, MapConfig, Way};

    use super::*;

    const BASE_LAT: f64 = 47.0;
    const METERS_PER_DEG_LAT: f64 = 111_132.0;

    /// A node placed x meters east and y meters north of the base point.
    fn node_at(x: f64, y: f64) -> LonLat {
        let meters_per_deg_lon = METERS_PER_DEG_LAT * BASE_LAT.to_radians().cos();
        LonLat::new(x / meters_per_deg_lon, BASE_LAT + y / METERS_PER_DEG_LAT)
    }

    struct Fixture {
        nodes: BTreeMap<NodeID, LonLat>,
        ways: Vec<Way>,
    }

    impl Fixture {
        fn new() -> Fixture {
            Fixture {
                nodes: BTreeMap::new(),
                ways: Vec::new(),
            }
        }

        fn node(&mut self, id: i64, x: f64, y: f64) -> NodeID {
            let n = NodeID(id);
            self.nodes.insert(n, node_at(x, y));
            n
        }

        fn way(&mut self, id: i64, nodes: Vec<NodeID>, pairs: Vec<(&str, &str)>) -> WayID {
            let mut tags = Tags::empty();
            tags.insert("highway", "primary");
            for (k, v) in pairs {
                tags.insert(k, v);
            }
            let id = WayID(id);
            self.ways.push(Way { id, nodes, tags });
            id
        }

        fn network(self) -> StreetNetwork {
            let mut network = StreetNetwork::new(
                self.nodes,
                self.ways,
                MapConfig::default_for_side(DrivingSide::Right),
            );
            network.recalculate(&mut Timer::throwaway());
            network
        }
    }

    #[test]
    fn fork_allocates_lanes_clockwise() {
        let mut f = Fixture::new();
        let south = f.node(1, 0.0, -50.0);
        let j = f.node(2, 0.0, 0.0);
        let nw = f.node(3, -40.0, 40.0);
        let ne = f.node(4, 40.0, 40.0);
        let main = f.way(10, vec![south, j], vec![("oneway", "yes"), ("lanes", "3")]);
        let left_branch = f.way(11, vec![j, nw], vec![("oneway", "yes"), ("lanes", "2")]);
        let right_branch = f.way(12, vec![j, ne], vec![("oneway", "yes"), ("lanes", "1")]);
        let network = f.network();

        assert_eq!(network.junctions().len(), 1);
        let row = network.junctions()[0].right_of_way.as_ref().unwrap();
        assert_eq!(row.main.way, main);
        assert_eq!(row.len(), 3);

        // With right-hand traffic, the innermost lanes feed the leftward
        // branch
        let one = row.get(1).unwrap();
        let two = row.get(2).unwrap();
        let three = row.get(3).unwrap();
        assert_eq!(one.vector.way, left_branch);
        assert_eq!(one.lane, 1);
        assert_eq!(two.vector.way, left_branch);
        assert_eq!(two.lane, 2);
        assert_eq!(three.vector.way, right_branch);
        assert_eq!(three.lane, 1);

        // Every main lane covered exactly once
        let mut seen: Vec<(WayID, i64)> = row.iter().map(|(_, r)| (r.vector.way, r.lane)).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn placement_maps_through_the_right_of_way() {
        use geom::Distance;

        let mut f = Fixture::new();
        let south = f.node(1, 0.0, -50.0);
        let j = f.node(2, 0.0, 0.0);
        let nw = f.node(3, -40.0, 40.0);
        let ne = f.node(4, 40.0, 40.0);
        f.way(10, vec![south, j], vec![("oneway", "yes"), ("lanes", "3")]);
        f.way(
            11,
            vec![j, nw],
            vec![("oneway", "yes"), ("lanes", "2"), ("placement", "right_of:1")],
        );
        f.way(12, vec![j, ne], vec![("oneway", "yes"), ("lanes", "1")]);
        let network = f.network();

        let row = network.junctions()[0].right_of_way.as_ref().unwrap();
        // The branch's lane 1 corresponds to the main road's innermost lane,
        // which sits 3.5m left of the main road's centerline
        let connected = row.get(1).unwrap().vector;
        assert_eq!(
            placement_offset(&network, row, connected),
            Distance::meters(-3.5)
        );
        // A branch without a placement tag yields no correction
        let other = row.get(3).unwrap().vector;
        assert_eq!(placement_offset(&network, row, other), Distance::ZERO);
    }

    #[test]
    fn two_way_split_resolves_both_directions() {
        let mut f = Fixture::new();
        let south = f.node(1, 0.0, -50.0);
        let j = f.node(2, 0.0, 0.0);
        let nw = f.node(3, -40.0, 40.0);
        let ne = f.node(4, 40.0, 40.0);
        let main = f.way(
            10,
            vec![south, j],
            vec![("lanes", "4"), ("lanes:forward", "2"), ("lanes:backward", "2")],
        );
        let out_half = f.way(11, vec![j, nw], vec![("oneway", "yes"), ("lanes", "2")]);
        let in_half = f.way(12, vec![ne, j], vec![("oneway", "yes"), ("lanes", "2")]);
        let network = f.network();

        let row = network.junctions()[0].right_of_way.as_ref().unwrap();
        assert_eq!(row.main.way, main);
        assert_eq!(row.len(), 4);
        // Forward lanes continue into the outbound half
        assert_eq!(row.get(1).unwrap().vector.way, out_half);
        assert_eq!(row.get(2).unwrap().vector.way, out_half);
        // Backward lanes come from the inbound half
        assert_eq!(row.get(-1).unwrap().vector.way, in_half);
        assert_eq!(row.get(-2).unwrap().vector.way, in_half);
    }

    #[test]
    fn unsupported_topology_has_no_right_of_way() {
        // A plain 4-way crossing of two-way roads
        let mut f = Fixture::new();
        let j = f.node(1, 0.0, 0.0);
        let n = f.node(2, 0.0, 50.0);
        let s = f.node(3, 0.0, -50.0);
        let e = f.node(4, 50.0, 0.0);
        let w = f.node(5, -50.0, 0.0);
        f.way(10, vec![n, j], vec![("lanes", "2")]);
        f.way(11, vec![j, s], vec![("lanes", "2")]);
        f.way(12, vec![j, e], vec![("lanes", "2")]);
        f.way(13, vec![j, w], vec![("lanes", "2")]);
        let network = f.network();

        assert_eq!(network.junctions().len(), 1);
        assert!(network.junctions()[0].right_of_way.is_none());
    }

    #[test]
    fn nearby_junctions_merge() {
        let mut f = Fixture::new();
        // Two 4-way crossings 10m apart, linked by a short road
        let j1 = f.node(1, 0.0, 0.0);
        let j2 = f.node(2, 10.0, 0.0);
        let w = f.node(3, -50.0, 0.0);
        let e = f.node(4, 60.0, 0.0);
        let n1 = f.node(5, 0.0, 50.0);
        let s1 = f.node(6, 0.0, -50.0);
        let n2 = f.node(7, 10.0, 50.0);
        let s2 = f.node(8, 10.0, -50.0);
        f.way(10, vec![w, j1], vec![("lanes", "2")]);
        let link = f.way(11, vec![j1, j2], vec![("lanes", "2")]);
        f.way(12, vec![j2, e], vec![("lanes", "2")]);
        f.way(13, vec![j1, n1], vec![("lanes", "2")]);
        f.way(14, vec![j1, s1], vec![("lanes", "2")]);
        f.way(15, vec![j2, n2], vec![("lanes", "2")]);
        f.way(16, vec![j2, s2], vec![("lanes", "2")]);
        let network = f.network();

        assert_eq!(network.junctions().len(), 1);
        let junction = &network.junctions()[0];
        assert_eq!(junction.nodes.len(), 2);
        // The link road is internal, walked once
        assert_eq!(junction.segments.len(), 1);
        assert!(junction.segments[0].contains(link, 0, 1));
        assert_eq!(junction.connectors.len(), 6);
    }

    #[test]
    fn graph_exploration_stops_at_the_distance_cap() {
        // Two junctions close enough to merge, also linked by a 160m winding
        // road through pass-through nodes. The walk gives up before reaching
        // the other side, so the winding road connects outward instead of
        // being part of the junction.
        let mut f = Fixture::new();
        let j1 = f.node(1, 0.0, 0.0);
        let j2 = f.node(2, 10.0, 0.0);
        let w = f.node(3, -50.0, 0.0);
        let n1 = f.node(4, 0.0, 50.0);
        let e = f.node(5, 60.0, 0.0);
        let s2 = f.node(6, 10.0, -50.0);
        let c1 = f.node(7, 50.0, 30.0);
        let c2 = f.node(8, 15.0, 60.0);
        f.way(10, vec![w, j1], vec![("lanes", "2")]);
        f.way(11, vec![j1, n1], vec![("lanes", "2")]);
        f.way(12, vec![j2, e], vec![("lanes", "2")]);
        f.way(13, vec![j2, s2], vec![("lanes", "2")]);
        f.way(14, vec![j1, c1, c2, j2], vec![("lanes", "2")]);
        let network = f.network();

        assert_eq!(network.junctions().len(), 1);
        let junction = &network.junctions()[0];
        assert_eq!(junction.nodes.len(), 2);
        assert!(junction.segments.is_empty());
        assert_eq!(junction.connectors.len(), 6);
    }

    #[test]
    fn distant_junctions_stay_separate() {
        let mut f = Fixture::new();
        let mut id = 1;
        for (idx, x) in [0.0, 500.0].into_iter().enumerate() {
            let j = f.node(id, x, 0.0);
            let a = f.node(id + 1, x - 40.0, 0.0);
            let b = f.node(id + 2, x + 40.0, 0.0);
            let c = f.node(id + 3, x, 40.0);
            id += 4;
            let base = 20 + (idx as i64) * 10;
            f.way(base, vec![a, j], vec![("lanes", "2")]);
            f.way(base + 1, vec![j, b], vec![("lanes", "2")]);
            f.way(base + 2, vec![j, c], vec![("lanes", "2")]);
        }
        let network = f.network();
        assert_eq!(network.junctions().len(), 2);
    }
}
