//! Groups nearby junction nodes into multi-node junctions, when they're close
//! enough to overlap on the ground.

use geom::{Distance, Polygon, Pt2D};

use crate::osm::NodeID;
use crate::StreetNetwork;

/// Junction centers this close always describe one junction.
const ALWAYS_MERGE: Distance = Distance::const_meters(15.0);
/// Centers this close merge only when their outlines overlap.
const OUTLINE_MERGE: Distance = Distance::const_meters(100.0);
/// Candidates further apart than this in latitude can never merge, pruning
/// the quadratic scan.
const LAT_WINDOW_DEGREES: f64 = 0.0005;
/// How far out along each connected road the coarse outline reaches.
const OUTLINE_REACH: Distance = Distance::const_meters(20.0);

/// Groups the candidate nodes into clusters. Most clusters are a single node;
/// dual carriageways and complex interchanges produce bigger ones.
pub fn merge_candidates(network: &StreetNetwork, mut candidates: Vec<NodeID>) -> Vec<Vec<NodeID>> {
    candidates.sort_by(|a, b| {
        network
            .node(*a)
            .latitude
            .partial_cmp(&network.node(*b).latitude)
            .unwrap()
    });

    let mut outlines: Vec<Option<Option<Polygon>>> = vec![None; candidates.len()];
    let mut parent: Vec<usize> = (0..candidates.len()).collect();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let lat_i = network.node(candidates[i]).latitude;
            let lat_j = network.node(candidates[j]).latitude;
            if (lat_j - lat_i).abs() > LAT_WINDOW_DEGREES {
                // The list is sorted by latitude
                break;
            }
            let dist = network
                .node(candidates[i])
                .gps_dist_meters(network.node(candidates[j]));
            let merge = if dist <= ALWAYS_MERGE {
                true
            } else if dist <= OUTLINE_MERGE {
                let oi = outline_memo(network, &candidates, &mut outlines, i);
                let oj = outline_memo(network, &candidates, &mut outlines, j);
                match (oi, oj) {
                    (Some(oi), Some(oj)) => oi.intersects(&oj),
                    _ => false,
                }
            } else {
                false
            };
            if merge {
                union(&mut parent, i, j);
            }
        }
    }

    let mut clusters: Vec<Vec<NodeID>> = vec![Vec::new(); candidates.len()];
    for i in 0..candidates.len() {
        clusters[find(&mut parent, i)].push(candidates[i]);
    }
    clusters.retain(|c| !c.is_empty());
    clusters
}

fn outline_memo(
    network: &StreetNetwork,
    candidates: &[NodeID],
    outlines: &mut Vec<Option<Option<Polygon>>>,
    idx: usize,
) -> Option<Polygon> {
    if outlines[idx].is_none() {
        outlines[idx] = Some(outline(network, candidates[idx]));
    }
    outlines[idx].clone().unwrap()
}

/// A coarse polygon for the ground a junction covers: the convex hull of the
/// node and a point a short way out along each connected road.
fn outline(network: &StreetNetwork, node: NodeID) -> Option<Polygon> {
    let center = network.world_pt(node)?;
    let mut pts: Vec<Pt2D> = vec![center];
    for v in network.way_vectors_at(node) {
        let reach = network.vector_length(v).min(OUTLINE_REACH);
        if let Some(bearing) = network.vector_bearing(v) {
            pts.push(center.project_away(reach, bearing));
        }
    }
    Polygon::convex_hull(&pts)
}

fn find(parent: &mut Vec<usize>, x: usize) -> usize {
    if parent[x] != x {
        let root = find(parent, parent[x]);
        parent[x] = root;
    }
    parent[x]
}

fn union(parent: &mut Vec<usize>, a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}
