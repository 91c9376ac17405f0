//! The road graph strictly inside a merged junction, distinguished from its
//! outward-facing connections.

use std::collections::BTreeSet;

use geom::Distance;
use serde::{Deserialize, Serialize};

use crate::junction::WayVector;
use crate::osm::{NodeID, WayID};
use crate::StreetNetwork;

/// Stop walking a road this far from where the walk started; anything beyond
/// is outside the junction.
const EXPLORE_CAP: Distance = Distance::const_meters(100.0);

/// An ordered run of way vectors describing one edge of the road graph inside
/// a merged junction. A run can hop across several ways when a road passes
/// straight through intermediate nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JunctionSegment {
    pub vectors: Vec<WayVector>,
}

impl JunctionSegment {
    pub fn reversed(&self) -> JunctionSegment {
        JunctionSegment {
            vectors: self.vectors.iter().rev().map(|v| v.reversed()).collect(),
        }
    }

    pub fn first_node(&self, network: &StreetNetwork) -> NodeID {
        network.vector_near_node(self.vectors[0])
    }

    pub fn last_node(&self, network: &StreetNetwork) -> NodeID {
        network.vector_far_node(*self.vectors.last().unwrap())
    }

    /// Does this run traverse the given way segment, in either orientation?
    pub fn contains(&self, way: WayID, from: usize, to: usize) -> bool {
        self.vectors.iter().any(|v| {
            v.way == way && ((v.from == from && v.to == to) || (v.from == to && v.to == from))
        })
    }
}

/// From every node of the junction, follows each outgoing road. Runs ending at
/// another node of the junction are its internal segments; the rest connect
/// outward.
pub fn explore(network: &StreetNetwork, nodes: &[NodeID]) -> (Vec<JunctionSegment>, Vec<WayVector>) {
    let node_set: BTreeSet<NodeID> = nodes.iter().cloned().collect();
    let mut segments: Vec<JunctionSegment> = Vec::new();
    let mut connectors: Vec<WayVector> = Vec::new();
    let mut seen_internal: BTreeSet<(NodeID, NodeID, WayVector)> = BTreeSet::new();

    for n in nodes {
        for start in network.way_vectors_at(*n) {
            let mut run = vec![start];
            let mut dist = network.vector_length(start);
            let mut current = start;

            loop {
                let end_node = network.vector_far_node(current);
                if node_set.contains(&end_node) {
                    break;
                }
                if dist >= EXPLORE_CAP {
                    break;
                }
                let at_end = network.way_vectors_at(end_node);
                if at_end.len() != 2 {
                    // A junction of its own, or a dead end
                    break;
                }
                // A pass-through point; hop onto the continuing road
                let back = current.reversed();
                let Some(next) = at_end.into_iter().find(|v| *v != back) else {
                    break;
                };
                run.push(next);
                dist += network.vector_length(next);
                current = next;
            }

            let end_node = network.vector_far_node(current);
            if node_set.contains(&end_node) {
                // Internal; each segment is found from both of its ends, so
                // dedupe on the endpoints plus the first vector walked
                let key = normalized_key(network, &run);
                if seen_internal.insert(key) {
                    segments.push(JunctionSegment { vectors: run });
                }
            } else {
                connectors.push(start);
            }
        }
    }

    (segments, connectors)
}

fn normalized_key(network: &StreetNetwork, run: &[WayVector]) -> (NodeID, NodeID, WayVector) {
    let a = network.vector_near_node(run[0]);
    let b = network.vector_far_node(*run.last().unwrap());
    if a <= b {
        (a, b, run[0].min(run.last().unwrap().reversed()))
    } else {
        (b, a, run.last().unwrap().reversed().min(run[0]))
    }
}
