use serde::{Deserialize, Serialize};

use crate::osm::WayID;
use crate::Direction;

/// Looking outward from a node along one way: the node's index in the way,
/// plus the adjacent index looked towards.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WayVector {
    pub way: WayID,
    pub from: usize,
    pub to: usize,
}

impl WayVector {
    /// Looking back the other way.
    pub fn reversed(self) -> WayVector {
        WayVector {
            way: self.way,
            from: self.to,
            to: self.from,
        }
    }

    /// Does the vector look along the way's forward direction?
    pub fn dir(self) -> Direction {
        if self.to > self.from {
            Direction::Fwd
        } else {
            Direction::Back
        }
    }
}
