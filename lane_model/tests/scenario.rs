//! End-to-end scenarios: whole networks in, derived lanes and junctions out.

use std::collections::BTreeMap;

use geom::{Distance, LonLat, EPSILON_DIST};
use lane_model::osm::{NodeID, WayID};
use lane_model::{DrivingSide, MapConfig, PieceDirection, StreetNetwork, Way};
use laneutil::{Tags, Timer};

const BASE_LAT: f64 = 47.0;
const METERS_PER_DEG_LAT: f64 = 111_132.0;

fn node_at(x: f64, y: f64) -> LonLat {
    let meters_per_deg_lon = METERS_PER_DEG_LAT * BASE_LAT.to_radians().cos();
    LonLat::new(x / meters_per_deg_lon, BASE_LAT + y / METERS_PER_DEG_LAT)
}

fn tags(pairs: Vec<(&str, &str)>) -> Tags {
    let mut t = Tags::empty();
    for (k, v) in pairs {
        t.insert(k, v);
    }
    t
}

fn network(nodes: Vec<(i64, f64, f64)>, ways: Vec<(i64, Vec<i64>, Vec<(&str, &str)>)>) -> StreetNetwork {
    let nodes: BTreeMap<NodeID, LonLat> = nodes
        .into_iter()
        .map(|(id, x, y)| (NodeID(id), node_at(x, y)))
        .collect();
    let ways: Vec<Way> = ways
        .into_iter()
        .map(|(id, node_ids, pairs)| Way {
            id: WayID(id),
            nodes: node_ids.into_iter().map(NodeID).collect(),
            tags: tags(pairs),
        })
        .collect();
    let mut network = StreetNetwork::new(nodes, ways, MapConfig::default_for_side(DrivingSide::Right));
    network.recalculate(&mut Timer::throwaway());
    network
}

#[test]
fn a_tagged_primary_road_gets_the_full_cross_section() {
    let network = network(
        vec![(1, 0.0, 0.0), (2, 200.0, 0.0)],
        vec![(
            10,
            vec![1, 2],
            vec![
                ("highway", "primary"),
                ("lanes", "4"),
                ("lanes:forward", "2"),
                ("lanes:backward", "2"),
                ("width", "14"),
            ],
        )],
    );

    let cs = network.cross_section(WayID(10)).unwrap();
    assert_eq!(cs.lanes(PieceDirection::Fwd).len(), 2);
    assert_eq!(cs.lanes(PieceDirection::Back).len(), 2);
    assert_eq!(cs.pieces().filter(|p| p.is_edge()).count(), 2);
    // One painted center line, one divider inside each direction
    assert_eq!(cs.pieces().filter(|p| p.is_divider()).count(), 3);
    let center = cs
        .pieces()
        .find(|p| p.is_divider() && p.dir == PieceDirection::Both)
        .unwrap();
    assert_eq!(center.width(true), Distance::meters(0.5));

    for lane in cs.pieces().filter(|p| p.is_lane()) {
        assert_eq!(lane.width(true), Distance::meters(3.375));
    }
    assert_eq!(cs.total_width(true), Distance::meters(14.0));
}

#[test]
fn markings_continue_across_a_segment_boundary() {
    // One physical road tagged as two ways, bending at the shared node
    let road_tags = vec![("highway", "primary"), ("lanes", "2"), ("width", "7")];
    let network = network(
        vec![(1, 0.0, 0.0), (2, 100.0, 0.0), (3, 190.0, 40.0)],
        vec![
            (10, vec![1, 2], road_tags.clone()),
            (11, vec![2, 3], road_tags),
        ],
    );

    let first = network.cross_section(WayID(10)).unwrap();
    let second = network.cross_section(WayID(11)).unwrap();
    for (a, b) in first.pieces().zip(second.pieces()) {
        assert_eq!(a.kind, b.kind);
        let first_curve = network.piece_polyline(WayID(10), a.id).unwrap();
        let second_curve = network.piece_polyline(WayID(11), b.id).unwrap();
        let gap = first_curve.last_pt().dist_to(second_curve.first_pt());
        assert!(
            gap <= EPSILON_DIST,
            "{:?} marking has a {} gap at the boundary",
            a.kind,
            gap
        );
    }
}

#[test]
fn contradictory_tagging_renders_bare() {
    let network = network(
        vec![(1, 0.0, 0.0), (2, 100.0, 0.0)],
        vec![(
            10,
            vec![1, 2],
            vec![("lanes", "2"), ("lanes:forward", "3")],
        )],
    );

    assert!(network.is_invalid(WayID(10)));
    assert!(network.cross_section(WayID(10)).is_none());
    // The raw geometry still draws
    assert!(network.center_line(WayID(10)).is_some());
}

#[test]
fn a_degenerate_way_passes_through() {
    let network = network(
        vec![(1, 0.0, 0.0)],
        vec![(10, vec![1, 1], vec![("lanes", "2")])],
    );
    // No center line to offset; the way just isn't drawn with lanes
    assert!(network.center_line(WayID(10)).is_none());
    assert!(network.cross_section(WayID(10)).is_some());
    let cs = network.cross_section(WayID(10)).unwrap();
    assert!(network.piece_polyline(WayID(10), cs.pieces().next().unwrap().id).is_none());
}

#[test]
fn edited_changes_serialize_back_compactly() {
    let network = network(
        vec![(1, 0.0, 0.0), (2, 100.0, 0.0)],
        vec![(10, vec![1, 2], vec![("oneway", "yes"), ("lanes", "2")])],
    );
    let mut cs = network.cross_section(WayID(10)).unwrap().clone();

    // Forbid leaving the outer lane leftwards
    let outer = cs.lanes(PieceDirection::Fwd)[1].id;
    cs.override_change(outer, lane_model::Change::NotLeft);

    let tags = cs.change_tags(true);
    assert_eq!(tags.get("change:lanes").unwrap(), "yes|not_left");
}
