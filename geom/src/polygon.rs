use geo::{ConvexHull, Intersects};
use serde::{Deserialize, Serialize};

use crate::Pt2D;

/// A simple closed ring of points, used for coarse overlap tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Pt2D>,
}

impl Polygon {
    /// The convex hull of a set of points. None with fewer than 3 points.
    pub fn convex_hull(pts: &[Pt2D]) -> Option<Polygon> {
        if pts.len() < 3 {
            return None;
        }
        let multi: geo::MultiPoint<f64> = pts
            .iter()
            .map(|pt| geo::Point::new(pt.x(), pt.y()))
            .collect::<Vec<_>>()
            .into();
        let hull = multi.convex_hull();
        let points: Vec<Pt2D> = hull
            .exterior()
            .coords()
            .map(|c| Pt2D::new(c.x, c.y))
            .collect();
        if points.len() < 3 {
            return None;
        }
        Some(Polygon { points })
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.points
    }

    /// Do the two polygons overlap at all, boundaries included?
    pub fn intersects(&self, other: &Polygon) -> bool {
        self.to_geo().intersects(&other.to_geo())
    }

    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.to_geo()
            .intersects(&geo::Point::new(pt.x(), pt.y()))
    }

    fn to_geo(&self) -> geo::Polygon<f64> {
        let exterior: Vec<(f64, f64)> = self.points.iter().map(|pt| (pt.x(), pt.y())).collect();
        geo::Polygon::new(geo::LineString::from(exterior), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hulls_overlap() {
        let a = Polygon::convex_hull(&[
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(0.0, 10.0),
        ])
        .unwrap();
        let b = Polygon::convex_hull(&[
            Pt2D::new(5.0, 5.0),
            Pt2D::new(15.0, 5.0),
            Pt2D::new(15.0, 15.0),
        ])
        .unwrap();
        let c = Polygon::convex_hull(&[
            Pt2D::new(50.0, 50.0),
            Pt2D::new(60.0, 50.0),
            Pt2D::new(60.0, 60.0),
        ])
        .unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
