use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Fails if the two points are the same place.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Option<Line> {
        if pt1.dist_to(pt2) <= EPSILON_DIST {
            return None;
        }
        Some(Line(pt1, pt2))
    }

    /// Panics if the two points are the same place.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).expect("Line from degenerate points")
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.0.dist_to(self.1)
    }

    pub fn angle(&self) -> Angle {
        self.0.angle_to(self.1)
    }

    pub fn middle(&self) -> Pt2D {
        Pt2D::new(
            (self.0.x() + self.1.x()) / 2.0,
            (self.0.y() + self.1.y()) / 2.0,
        )
    }

    pub fn reversed(&self) -> Line {
        Line(self.1, self.0)
    }

    /// Shifts the line sideways: to the right of its direction of travel for a
    /// positive width, left for negative.
    pub fn shift_either_direction(&self, width: Distance) -> Line {
        let angle = self.angle().rotate_degs(90.0);
        Line(
            self.0.project_away(width, angle),
            self.1.project_away(width, angle),
        )
    }

    pub fn unbounded_dist_along(&self, dist: Distance) -> Pt2D {
        let percent = dist / self.length();
        Pt2D::new(
            self.0.x() + percent * (self.1.x() - self.0.x()),
            self.0.y() + percent * (self.1.y() - self.0.y()),
        )
    }

    pub fn dist_along(&self, dist: Distance) -> Option<Pt2D> {
        if dist < Distance::ZERO || dist > self.length() + EPSILON_DIST {
            return None;
        }
        Some(self.unbounded_dist_along(dist))
    }

    /// Where do the two segments cross?
    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        if !self.crosses(other) {
            return None;
        }
        line_intersection(self, other)
    }

    /// Do the two segments cross, endpoints included?
    pub fn crosses(&self, other: &Line) -> bool {
        // From http://bryceboe.com/2006/10/23/line-segment-intersection-algorithm/
        is_counter_clockwise(self.0, other.0, other.1)
            != is_counter_clockwise(self.1, other.0, other.1)
            && is_counter_clockwise(self.0, self.1, other.0)
                != is_counter_clockwise(self.0, self.1, other.1)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({} to {})", self.0, self.1)
    }
}

/// Where do the two lines intersect, extending them infinitely? None when
/// they're parallel or too close to it.
pub fn line_intersection(l1: &Line, l2: &Line) -> Option<Pt2D> {
    let (x1, y1, x2, y2) = (l1.pt1().x(), l1.pt1().y(), l1.pt2().x(), l1.pt2().y());
    let (x3, y3, x4, y4) = (l2.pt1().x(), l2.pt1().y(), l2.pt2().x(), l2.pt2().y());

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < 1e-9 {
        return None;
    }
    let n1 = x1 * y2 - y1 * x2;
    let n2 = x3 * y4 - y3 * x4;
    Some(Pt2D::new(
        (n1 * (x3 - x4) - (x1 - x2) * n2) / denom,
        (n1 * (y3 - y4) - (y1 - y2) * n2) / denom,
    ))
}

fn is_counter_clockwise(pt1: Pt2D, pt2: Pt2D, pt3: Pt2D) -> bool {
    (pt3.y() - pt1.y()) * (pt2.x() - pt1.x()) > (pt2.y() - pt1.y()) * (pt3.x() - pt1.x())
}
