use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{Angle, Bounds, Distance, Line, Pt2D, EPSILON_DIST};

/// Ignore an adjoining road's bearing when it differs from ours by more than
/// this. Blending towards a near-perpendicular road would smear the corridor
/// sideways instead of joining it.
const MAX_BLEND_DIFF_RADS: f64 = 1.8;

/// When the two segments at a vertex nearly reverse direction, the miter join
/// shoots off towards infinity. Below this cosine of the half turn angle,
/// fall back to a flat joint.
const MIN_MITER_COS: f64 = 0.05;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt2D>,
    length: Distance,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt2D>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("PolyLine needs at least 2 points");
        }
        let pts = deduped(pts);
        if pts.len() < 2 {
            bail!("PolyLine collapses to a single point");
        }
        let length = pts.windows(2).map(|pair| pair[0].dist_to(pair[1])).sum();
        Ok(PolyLine { pts, length })
    }

    pub fn must_new(pts: Vec<Pt2D>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<Pt2D> {
        self.pts
    }

    // Makes a copy :\
    pub fn lines(&self) -> Vec<Line> {
        self.pts
            .windows(2)
            .map(|pair| Line::must_new(pair[0], pair[1]))
            .collect()
    }

    pub fn length(&self) -> Distance {
        self.length
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        PolyLine::must_new(pts)
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pts[0]
    }
    pub fn last_pt(&self) -> Pt2D {
        *self.pts.last().unwrap()
    }
    pub fn first_line(&self) -> Line {
        Line::must_new(self.pts[0], self.pts[1])
    }
    pub fn last_line(&self) -> Line {
        Line::must_new(self.pts[self.pts.len() - 2], self.pts[self.pts.len() - 1])
    }

    /// The point and bearing at a distance along the polyline. None past
    /// either end.
    pub fn dist_along(&self, dist_along: Distance) -> Option<(Pt2D, Angle)> {
        if dist_along < Distance::ZERO {
            return None;
        }

        let mut dist_left = dist_along;
        let num_lines = self.pts.len() - 1;
        for (idx, l) in self.lines().into_iter().enumerate() {
            let length = l.length();
            let epsilon = if idx == num_lines - 1 {
                EPSILON_DIST
            } else {
                Distance::ZERO
            };
            if dist_left <= length + epsilon {
                return Some((l.unbounded_dist_along(dist_left), l.angle()));
            }
            dist_left -= length;
        }
        None
    }

    pub fn middle(&self) -> Pt2D {
        self.dist_along(self.length / 2.0).unwrap().0
    }

    pub fn get_bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        for pt in &self.pts {
            b.update(*pt);
        }
        b
    }

    /// Shifts the polyline sideways to the right of its direction of travel.
    // Things to remember about shifting polylines:
    // - the length before and after probably don't match up
    // - the number of points does match
    pub fn shift_right(&self, width: Distance) -> PolyLine {
        self.offset_curve(width, width, None, None)
    }

    pub fn shift_left(&self, width: Distance) -> PolyLine {
        self.offset_curve(-width, -width, None, None)
    }

    /// Produces a curve parallel to this one, displaced sideways by an offset
    /// interpolated linearly over arc length from `offset_start` to
    /// `offset_end`. Positive offsets go to the right of the direction of
    /// travel.
    ///
    /// At interior vertices, the output point is displaced along the bisector
    /// of the incoming and outgoing bearings, scaled so a constant-width
    /// corridor stays constant width through the turn.
    ///
    /// `blend_start` and `blend_end` are the travel bearings of an adjoining
    /// road sharing that endpoint, when there is one. The endpoint is then
    /// displaced along the average of the two perpendiculars, with a
    /// compensating length, so the offset curves of the two roads meet without
    /// a gap or kink. A blend bearing differing too much from ours is ignored.
    ///
    /// If displacement collapses the result (a sharp inside corner), the
    /// input passes through unmodified.
    pub fn offset_curve(
        &self,
        offset_start: Distance,
        offset_end: Distance,
        blend_start: Option<Angle>,
        blend_end: Option<Angle>,
    ) -> PolyLine {
        // When the offsets at the two ends differ, rotate the whole corridor
        // slightly, spreading the taper over the full length.
        let skew = if offset_start == offset_end {
            0.0
        } else {
            (((offset_end - offset_start) / self.length).clamp(-1.0, 1.0)).asin()
        };

        let n = self.pts.len();
        let mut result: Vec<Pt2D> = Vec::with_capacity(n);
        let mut dist_so_far = Distance::ZERO;
        for idx in 0..n {
            if idx > 0 {
                dist_so_far += self.pts[idx - 1].dist_to(self.pts[idx]);
            }
            let offset = offset_start + (offset_end - offset_start) * (dist_so_far / self.length);

            let (normal, scale) = if idx == 0 {
                let dir = self.pts[0].angle_to(self.pts[1]).rotate_rads(skew);
                endpoint_normal(dir, blend_start)
            } else if idx == n - 1 {
                let dir = self.pts[n - 2].angle_to(self.pts[n - 1]).rotate_rads(skew);
                endpoint_normal(dir, blend_end)
            } else {
                let dir_in = self.pts[idx - 1].angle_to(self.pts[idx]).rotate_rads(skew);
                let dir_out = self.pts[idx].angle_to(self.pts[idx + 1]).rotate_rads(skew);
                let half = dir_in.shortest_rotation_towards(dir_out) / 2.0;
                if half.cos().abs() < MIN_MITER_COS {
                    (dir_in.rotate_degs(90.0), 1.0)
                } else {
                    (dir_in.rotate_rads(half).rotate_degs(90.0), 1.0 / half.cos())
                }
            };
            result.push(self.pts[idx].project_away(offset * scale, normal));
        }

        match PolyLine::new(result) {
            Ok(pl) => pl,
            Err(_) => self.clone(),
        }
    }
}

/// The displacement direction and length multiplier at a polyline endpoint,
/// optionally blended with an adjoining road's travel bearing.
fn endpoint_normal(dir: Angle, blend: Option<Angle>) -> (Angle, f64) {
    if let Some(adjoining) = blend {
        let diff = dir.shortest_rotation_towards(adjoining);
        if diff.abs() <= MAX_BLEND_DIFF_RADS {
            let half = diff / 2.0;
            return (dir.rotate_rads(half).rotate_degs(90.0), 1.0 / half.cos());
        }
    }
    (dir.rotate_degs(90.0), 1.0)
}

fn deduped(pts: Vec<Pt2D>) -> Vec<Pt2D> {
    let mut result: Vec<Pt2D> = Vec::with_capacity(pts.len());
    for pt in pts {
        if let Some(last) = result.last() {
            if last.approx_eq(pt, EPSILON_DIST) {
                continue;
            }
        }
        result.push(pt);
    }
    result
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PolyLine::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    #[test]
    fn shifting_a_straight_line_is_parallel() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..100 {
            let bearing = Angle::new_degs(rng.gen_range(0.0..360.0));
            let k = Distance::meters(rng.gen_range(0.5..10.0));
            let start = Pt2D::new(rng.gen_range(100.0..900.0), rng.gen_range(100.0..900.0));
            let end = start.project_away(Distance::meters(50.0), bearing);
            let pl = PolyLine::must_new(vec![start, end]);

            let shifted = pl.shift_right(k);
            for (orig, new) in pl.points().iter().zip(shifted.points().iter()) {
                let dist = orig.dist_to(*new);
                assert!(
                    (dist - k).abs() < Distance::meters(0.01),
                    "shifted by {} instead of {} at bearing {}",
                    dist,
                    k,
                    bearing
                );
            }
            assert!(shifted.first_line().angle().approx_eq(bearing, 0.01));
        }
    }

    #[test]
    fn shift_right_then_left_round_trips() {
        let pl = PolyLine::must_new(vec![
            Pt2D::new(100.0, 100.0),
            Pt2D::new(150.0, 120.0),
            Pt2D::new(200.0, 100.0),
            Pt2D::new(260.0, 150.0),
        ]);
        let k = Distance::meters(3.0);
        let round_trip = pl.shift_right(k).shift_left(k);
        for (orig, new) in pl.points().iter().zip(round_trip.points().iter()) {
            assert!(
                orig.approx_eq(*new, Distance::meters(0.02)),
                "{} moved to {}",
                orig,
                new
            );
        }
    }

    #[test]
    fn miter_preserves_corridor_width() {
        // A 90 degree turn. The vertex displacement is k / cos(45 degrees),
        // leaving both segments of the result exactly k away.
        let pl = PolyLine::must_new(vec![
            Pt2D::new(100.0, 100.0),
            Pt2D::new(200.0, 100.0),
            Pt2D::new(200.0, 200.0),
        ]);
        let k = Distance::meters(2.0);
        let shifted = pl.shift_right(k);
        let vertex = shifted.points()[1];
        let expected = Pt2D::new(198.0, 102.0);
        assert!(vertex.approx_eq(expected, Distance::meters(0.01)), "{}", vertex);
    }

    #[test]
    fn blended_endpoints_coincide() {
        // Two roads of one physical corridor meet at (200, 100) with a bend.
        // Offsetting each independently, blending with the other's bearing,
        // must close the joint exactly.
        let first = PolyLine::must_new(vec![Pt2D::new(100.0, 100.0), Pt2D::new(200.0, 100.0)]);
        let second = PolyLine::must_new(vec![Pt2D::new(200.0, 100.0), Pt2D::new(290.0, 140.0)]);
        let k = Distance::meters(2.5);

        let first_shifted =
            first.offset_curve(k, k, None, Some(second.first_line().angle()));
        let second_shifted =
            second.offset_curve(k, k, Some(first.last_line().angle()), None);
        assert!(
            first_shifted
                .last_pt()
                .approx_eq(second_shifted.first_pt(), EPSILON_DIST),
            "gap between {} and {}",
            first_shifted.last_pt(),
            second_shifted.first_pt()
        );

        // Collinear roads shouldn't even need the compensating length.
        let third = PolyLine::must_new(vec![Pt2D::new(200.0, 100.0), Pt2D::new(300.0, 100.0)]);
        let first_shifted =
            first.offset_curve(k, k, None, Some(third.first_line().angle()));
        assert!(first_shifted
            .last_pt()
            .approx_eq(Pt2D::new(200.0, 102.5), EPSILON_DIST));
    }

    #[test]
    fn near_perpendicular_blend_is_ignored() {
        let first = PolyLine::must_new(vec![Pt2D::new(100.0, 100.0), Pt2D::new(200.0, 100.0)]);
        let sideways = Angle::new_degs(110.0);
        let k = Distance::meters(2.0);
        let shifted = first.offset_curve(k, k, None, Some(sideways));
        // Same as not blending at all
        assert_eq!(shifted, first.shift_right(k));
    }

    #[test]
    fn tapered_offset_interpolates() {
        let pl = PolyLine::must_new(vec![Pt2D::new(100.0, 100.0), Pt2D::new(200.0, 100.0)]);
        let tapered = pl.offset_curve(Distance::ZERO, Distance::meters(2.0), None, None);
        // The corridor rotates slightly, so allow some slack.
        assert!(tapered.first_pt().approx_eq(pl.first_pt(), Distance::meters(0.05)));
        assert!(tapered
            .last_pt()
            .approx_eq(Pt2D::new(200.0, 102.0), Distance::meters(0.05)));
    }
}
