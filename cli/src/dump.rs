//! Serializable views of the derived model. These're just for JSON output;
//! the real types live in lane_model.

use serde::Serialize;

use lane_model::osm::WayID;
use lane_model::{PieceKind, StreetNetwork};

#[derive(Serialize)]
struct WayOutput {
    way: i64,
    valid: bool,
    pieces: Vec<PieceOutput>,
}

#[derive(Serialize)]
struct PieceOutput {
    kind: String,
    direction: String,
    position: usize,
    width_start_meters: f64,
    width_end_meters: f64,
    offset_start_meters: f64,
    offset_end_meters: f64,
    turns: Vec<String>,
    change: String,
}

pub fn cross_sections(network: &StreetNetwork) {
    let mut output = Vec::new();
    for way in network.all_ways() {
        let mut pieces = Vec::new();
        if let Some(cs) = network.cross_section(way.id) {
            for piece in cs.pieces() {
                pieces.push(PieceOutput {
                    kind: match piece.kind {
                        PieceKind::Lane(lk) => format!("lane ({:?})", lk),
                        PieceKind::Divider(dk) => format!("divider ({:?})", dk),
                        PieceKind::Edge => "edge".to_string(),
                    },
                    direction: format!("{:?}", piece.dir),
                    position: piece.pos,
                    width_start_meters: piece.width(true).inner_meters(),
                    width_end_meters: piece.width(false).inner_meters(),
                    offset_start_meters: piece.offset_start.inner_meters(),
                    offset_end_meters: piece.offset_end.inner_meters(),
                    turns: piece.turns.iter().map(|t| t.to_value().to_string()).collect(),
                    change: piece.effective_change().to_value().to_string(),
                });
            }
        }
        output.push(WayOutput {
            way: way.id.0,
            valid: !network.is_invalid(way.id),
            pieces,
        });
    }
    println!("{}", laneutil::to_json(&output));
}

#[derive(Serialize)]
struct JunctionOutput {
    nodes: Vec<i64>,
    center: [f64; 2],
    internal_segments: usize,
    connectors: usize,
    right_of_way: Option<Vec<RightOfWayEntry>>,
}

#[derive(Serialize)]
struct RightOfWayEntry {
    main_lane: i64,
    way: i64,
    lane: i64,
}

pub fn junctions(network: &StreetNetwork) {
    let mut output = Vec::new();
    for junction in network.junctions() {
        output.push(JunctionOutput {
            nodes: junction.nodes.iter().map(|n| n.0).collect(),
            center: [junction.center.longitude, junction.center.latitude],
            internal_segments: junction.segments.len(),
            connectors: junction.connectors.len(),
            right_of_way: junction.right_of_way.as_ref().map(|row| {
                row.iter()
                    .map(|(main_lane, lane_ref)| RightOfWayEntry {
                        main_lane: *main_lane,
                        way: lane_ref.vector.way.0,
                        lane: lane_ref.lane,
                    })
                    .collect()
            }),
        });
    }
    println!("{}", laneutil::to_json(&output));
}

#[derive(Serialize)]
struct CurveOutput {
    kind: String,
    points: Vec<[f64; 2]>,
}

pub fn offset_curves(network: &StreetNetwork, way: WayID) {
    let Some(cs) = network.cross_section(way) else {
        warn!("{} has no cross-section; it renders as a bare corridor", way);
        return;
    };
    let mut output = Vec::new();
    for piece in cs.pieces() {
        if let Some(pl) = network.piece_polyline(way, piece.id) {
            output.push(CurveOutput {
                kind: format!("{:?}", piece.kind),
                points: pl.points().iter().map(|pt| [pt.x(), pt.y()]).collect(),
            });
        }
    }
    println!("{}", laneutil::to_json(&output));
}
