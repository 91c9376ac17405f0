//! A model of road lane layouts, derived from OSM-style tagged polylines.
//!
//! Raw ways go in; out come per-way cross-sections (ordered lanes, dividers,
//! and edges with widths and lateral offsets), offset polylines suitable for
//! drawing each piece, and junctions with lane-level right-of-way. The model
//! is rebuilt wholesale when tags change; nothing is edited in place.

#[macro_use]
extern crate log;

pub mod edit;
pub mod osm;
pub mod tags;

mod cross_section;
mod junction;
mod network;
mod types;

pub use crate::cross_section::{
    Change, CrossSection, DividerKind, LaneCounts, LaneKind, Piece, PieceID, PieceKind, Placement,
    PlacementAnchor, Turn,
};
pub use crate::junction::{
    placement_offset, Junction, JunctionSegment, LaneRef, RightOfWay, WayVector,
};
pub use crate::network::{StreetNetwork, Way};
pub use crate::types::{Direction, DrivingSide, MapConfig, PieceDirection};
