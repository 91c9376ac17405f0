//! The container tying everything together: raw nodes and ways in, derived
//! cross-sections, offset polylines, and junctions out.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, GPSBounds, LonLat, PolyLine, Pt2D, EPSILON_DIST};
use laneutil::{MultiMap, Tags, Timer};

use crate::junction::{self, Junction, WayVector};
use crate::osm::{NodeID, WayID};
use crate::{CrossSection, MapConfig, PieceID};

/// A tagged polyline representing one road segment. Never mutated; edits
/// produce new tag values, applied upstream, and the derived state is rebuilt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Way {
    pub id: WayID,
    pub nodes: Vec<NodeID>,
    pub tags: Tags,
}

pub struct StreetNetwork {
    pub config: MapConfig,
    pub gps_bounds: GPSBounds,
    nodes: BTreeMap<NodeID, LonLat>,
    ways: BTreeMap<WayID, Way>,

    // Derived state, filled in by recalculate()
    world_pts: BTreeMap<NodeID, Pt2D>,
    center_lines: BTreeMap<WayID, PolyLine>,
    cross_sections: BTreeMap<WayID, CrossSection>,
    /// Ways whose tagging contradicts itself. They still render, as bare
    /// corridors without lane detail.
    invalid: BTreeSet<WayID>,
    junctions: Vec<Junction>,
    node_to_ways: MultiMap<NodeID, WayID>,
}

impl StreetNetwork {
    pub fn new(nodes: BTreeMap<NodeID, LonLat>, ways: Vec<Way>, config: MapConfig) -> StreetNetwork {
        let mut gps_bounds = GPSBounds::new();
        for pt in nodes.values() {
            gps_bounds.update(*pt);
        }
        let world_pts: BTreeMap<NodeID, Pt2D> = nodes
            .iter()
            .map(|(id, pt)| (*id, gps_bounds.convert(*pt)))
            .collect();

        let mut node_to_ways = MultiMap::new();
        let mut center_lines = BTreeMap::new();
        let mut way_map = BTreeMap::new();
        for way in ways {
            for n in &way.nodes {
                node_to_ways.insert(*n, way.id);
            }
            let pts: Vec<Pt2D> = way
                .nodes
                .iter()
                .filter_map(|n| world_pts.get(n).copied())
                .collect();
            // A degenerate way keeps its tags and nodes, but has no center
            // line; lane rendering passes it through untouched.
            match PolyLine::new(pts) {
                Ok(pl) => {
                    center_lines.insert(way.id, pl);
                }
                Err(err) => {
                    warn!("{} has degenerate geometry: {}", way.id, err);
                }
            }
            way_map.insert(way.id, way);
        }

        StreetNetwork {
            config,
            gps_bounds,
            nodes,
            ways: way_map,
            world_pts,
            center_lines,
            cross_sections: BTreeMap::new(),
            invalid: BTreeSet::new(),
            junctions: Vec::new(),
            node_to_ways,
        }
    }

    /// Rebuilds all derived state from scratch. Cross-sections for distinct
    /// ways only read their own tags, so they build in parallel; junction
    /// discovery needs every way's lane counts, so it starts strictly after.
    /// Each rebuild produces a fresh object graph, atomically replacing the
    /// old one.
    pub fn recalculate(&mut self, timer: &mut Timer) {
        let requests: Vec<WayID> = self.ways.keys().cloned().collect();
        let ways = &self.ways;
        let config = &self.config;
        let results = timer.parallelize("build cross-sections", requests, |id| {
            (id, CrossSection::build(&ways[&id].tags, config))
        });

        let mut cross_sections = BTreeMap::new();
        let mut invalid = BTreeSet::new();
        for (id, result) in results {
            match result {
                Ok(cs) => {
                    cross_sections.insert(id, cs);
                }
                Err(err) => {
                    warn!("The lanes of {} make no sense, rendering it bare: {}", id, err);
                    invalid.insert(id);
                }
            }
        }
        self.cross_sections = cross_sections;
        self.invalid = invalid;

        self.junctions = junction::find_junctions(self, timer);
    }

    pub fn all_ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    pub fn way(&self, id: WayID) -> &Way {
        &self.ways[&id]
    }

    pub fn maybe_way(&self, id: WayID) -> Option<&Way> {
        self.ways.get(&id)
    }

    pub fn node(&self, id: NodeID) -> LonLat {
        self.nodes[&id]
    }

    pub fn world_pt(&self, id: NodeID) -> Option<Pt2D> {
        self.world_pts.get(&id).copied()
    }

    pub fn center_line(&self, id: WayID) -> Option<&PolyLine> {
        self.center_lines.get(&id)
    }

    pub fn cross_section(&self, id: WayID) -> Option<&CrossSection> {
        self.cross_sections.get(&id)
    }

    /// Did the way's tagging contradict itself?
    pub fn is_invalid(&self, id: WayID) -> bool {
        self.invalid.contains(&id)
    }

    pub fn junctions(&self) -> &Vec<Junction> {
        &self.junctions
    }

    pub fn ways_at_node(&self, node: NodeID) -> &BTreeSet<WayID> {
        self.node_to_ways.get(node)
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = (&NodeID, &LonLat)> {
        self.nodes.iter()
    }

    /// All the ways of looking outward from a node, sorted clockwise by
    /// bearing.
    pub fn way_vectors_at(&self, node: NodeID) -> Vec<WayVector> {
        let mut result = Vec::new();
        for way_id in self.node_to_ways.get(node) {
            let way = &self.ways[way_id];
            for (idx, n) in way.nodes.iter().enumerate() {
                if *n != node {
                    continue;
                }
                if idx > 0 {
                    result.push(WayVector {
                        way: *way_id,
                        from: idx,
                        to: idx - 1,
                    });
                }
                if idx + 1 < way.nodes.len() {
                    result.push(WayVector {
                        way: *way_id,
                        from: idx,
                        to: idx + 1,
                    });
                }
            }
        }
        result.sort_by(|a, b| {
            let a = self
                .vector_bearing(*a)
                .map(|x| x.normalized_degrees())
                .unwrap_or(0.0);
            let b = self
                .vector_bearing(*b)
                .map(|x| x.normalized_degrees())
                .unwrap_or(0.0);
            a.partial_cmp(&b).unwrap()
        });
        result
    }

    /// The bearing looking along the vector. None when the geometry is
    /// degenerate.
    pub fn vector_bearing(&self, v: WayVector) -> Option<Angle> {
        let way = self.ways.get(&v.way)?;
        let from = self.world_pts.get(way.nodes.get(v.from)?)?;
        let to = self.world_pts.get(way.nodes.get(v.to)?)?;
        if from.approx_eq(*to, EPSILON_DIST) {
            return None;
        }
        Some(from.angle_to(*to))
    }

    pub fn vector_length(&self, v: WayVector) -> Distance {
        let way = &self.ways[&v.way];
        match (
            self.world_pts.get(&way.nodes[v.from]),
            self.world_pts.get(&way.nodes[v.to]),
        ) {
            (Some(a), Some(b)) => a.dist_to(*b),
            _ => Distance::ZERO,
        }
    }

    /// The node the vector looks out from.
    pub fn vector_near_node(&self, v: WayVector) -> NodeID {
        self.ways[&v.way].nodes[v.from]
    }

    /// The node the vector looks towards.
    pub fn vector_far_node(&self, v: WayVector) -> NodeID {
        self.ways[&v.way].nodes[v.to]
    }

    /// How far along the way a node index sits, as a fraction of total
    /// length.
    pub fn node_fraction(&self, way: WayID, node_idx: usize) -> f64 {
        let way = &self.ways[&way];
        let mut total = Distance::ZERO;
        let mut at_node = Distance::ZERO;
        for (idx, pair) in way.nodes.windows(2).enumerate() {
            let (Some(a), Some(b)) = (self.world_pts.get(&pair[0]), self.world_pts.get(&pair[1]))
            else {
                continue;
            };
            total += a.dist_to(*b);
            if idx + 1 <= node_idx {
                at_node = total;
            }
        }
        if total == Distance::ZERO {
            return 0.0;
        }
        at_node / total
    }

    /// The polyline to draw one piece of a way's cross-section: the way's
    /// center line, offset sideways by the piece's offsets, blending the ends
    /// with adjoining roads so markings continue across segment boundaries.
    pub fn piece_polyline(&self, way: WayID, piece: PieceID) -> Option<PolyLine> {
        let center = self.center_lines.get(&way)?;
        let cs = self.cross_sections.get(&way)?;
        let p = cs.piece(piece);
        let blend_start = self.adjoining_bearing(way, true);
        let blend_end = self.adjoining_bearing(way, false);
        Some(center.offset_curve(p.offset_start, p.offset_end, blend_start, blend_end))
    }

    /// The travel bearing of the road adjoining one end of this way, oriented
    /// in this way's direction of travel. There's an adjoining road when the
    /// end node is a simple pass-through point, or when a junction's
    /// right-of-way connects us through it.
    pub fn adjoining_bearing(&self, way_id: WayID, at_start: bool) -> Option<Angle> {
        let way = self.ways.get(&way_id)?;
        let node = if at_start {
            *way.nodes.first()?
        } else {
            *way.nodes.last()?
        };

        let vectors = self.way_vectors_at(node);
        let others: Vec<WayVector> = vectors.iter().filter(|v| v.way != way_id).cloned().collect();
        let adjoining = if others.len() == 1 && vectors.len() == 2 {
            others[0]
        } else {
            self.adjoining_via_junction(way_id, node)?
        };

        // The adjoining vector looks outward from the shared node. Traffic
        // continuing through our start arrives along its opposite.
        let bearing = self.vector_bearing(adjoining)?;
        Some(if at_start { bearing.opposite() } else { bearing })
    }

    fn adjoining_via_junction(&self, way_id: WayID, node: NodeID) -> Option<WayVector> {
        let junction = self.junctions.iter().find(|j| j.nodes.contains(&node))?;
        let row = junction.right_of_way.as_ref()?;
        if row.main.way == way_id {
            // The connected road claiming the most of our lanes
            let mut claims: BTreeMap<WayVector, usize> = BTreeMap::new();
            for (_, lane_ref) in row.iter() {
                *claims.entry(lane_ref.vector).or_insert(0) += 1;
            }
            claims.into_iter().max_by_key(|(_, n)| *n).map(|(v, _)| v)
        } else {
            if row.iter().any(|(_, lane_ref)| lane_ref.vector.way == way_id) {
                return Some(row.main);
            }
            None
        }
    }
}
