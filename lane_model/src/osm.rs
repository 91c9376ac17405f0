//! Common OSM keys. Keys used in just one or two places don't really need to
//! be defined here.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct NodeID(pub i64);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WayID(pub i64);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/node/{}", self.0)
    }
}

impl fmt::Display for WayID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/way/{}", self.0)
    }
}

pub const HIGHWAY: &str = "highway";
pub const JUNCTION: &str = "junction";
pub const ONEWAY: &str = "oneway";
pub const DRIVING_SIDE: &str = "driving_side";

pub const LANES: &str = "lanes";
pub const WIDTH: &str = "width";
pub const WIDTH_LANES: &str = "width:lanes";
pub const WIDTH_DIVIDERS: &str = "width:dividers";
pub const WIDTH_CENTRE_DIVIDER: &str = "width:centre_divider";
pub const PLACEMENT: &str = "placement";
pub const TURN: &str = "turn";
pub const CHANGE: &str = "change";

/// Per-lane access filters that decide what kind of lane a position is.
pub const LANE_CLASS_FILTERS: [&str; 7] = [
    "bicycle:lanes",
    "bus:lanes",
    "psv:lanes",
    "taxi:lanes",
    "vehicle:lanes",
    "motor_vehicle:lanes",
    "cycleway:lanes",
];
