//! Geometry for road-space math: typed distances and angles, world-space
//! points, polylines with lateral offsetting, and GPS conversion. Nothing in
//! here knows about tags or roads.

mod angle;
mod bounds;
mod distance;
mod gps;
mod line;
mod polygon;
mod polyline;
mod pt;

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::distance::Distance;
pub use crate::gps::{GPSBounds, LonLat};
pub use crate::line::{line_intersection, Line};
pub use crate::polygon::Polygon;
pub use crate::polyline::PolyLine;
pub use crate::pt::{HashablePt2D, Pt2D};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Below this distance, two points count as the same place.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.01);

// Reduce floating point precision, for deterministic serialization and to
// hide noise from repeated arithmetic.
pub(crate) fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// Serialize lossily as an f32 to save space.
pub(crate) fn serialize_f64<S: Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    (*x as f32).serialize(s)
}

pub(crate) fn deserialize_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let x = <f32>::deserialize(d)?;
    Ok(x.into())
}
