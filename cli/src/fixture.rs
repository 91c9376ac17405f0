//! Loading a network from a JSON fixture: a bag of nodes and tagged ways.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use geom::LonLat;
use lane_model::osm::{NodeID, WayID};
use lane_model::{DrivingSide, MapConfig, StreetNetwork, Way};
use laneutil::{Tags, Timer};

#[derive(Deserialize)]
struct Fixture {
    /// "right" or "left"
    driving_side: Option<String>,
    /// id -> [longitude, latitude]
    nodes: BTreeMap<i64, [f64; 2]>,
    ways: Vec<FixtureWay>,
}

#[derive(Deserialize)]
struct FixtureWay {
    id: i64,
    nodes: Vec<i64>,
    tags: BTreeMap<String, String>,
}

pub fn load(path: &str, timer: &mut Timer) -> Result<StreetNetwork> {
    timer.start("load fixture");
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let fixture: Fixture = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;

    let driving_side = match fixture.driving_side.as_deref() {
        None | Some("right") => DrivingSide::Right,
        Some("left") => DrivingSide::Left,
        Some(x) => bail!("unknown driving_side {}", x),
    };

    let nodes: BTreeMap<NodeID, LonLat> = fixture
        .nodes
        .into_iter()
        .map(|(id, [lon, lat])| (NodeID(id), LonLat::new(lon, lat)))
        .collect();
    let ways: Vec<Way> = fixture
        .ways
        .into_iter()
        .map(|w| Way {
            id: WayID(w.id),
            nodes: w.nodes.into_iter().map(NodeID).collect(),
            tags: Tags::new(w.tags),
        })
        .collect();
    info!("{} nodes, {} ways", nodes.len(), ways.len());
    timer.stop("load fixture");

    let mut network = StreetNetwork::new(nodes, ways, MapConfig::default_for_side(driving_side));
    network.recalculate(timer);
    Ok(network)
}
