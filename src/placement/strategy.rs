//! Placement objectives: a closed sum type rather than an open trait
//! hierarchy, since there are exactly three strategies and none are
//! pluggable from outside the crate.

use crate::config::PlacementType;
use crate::point::Point;

/// A scored placement candidate, compared lexicographically on
/// `(score, x, y)` so ties resolve deterministically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub position: Point,
    pub score: f64,
}

impl Candidate {
    pub fn is_better_than(&self, other: &Candidate) -> bool {
        (self.score, self.position.x, self.position.y) < (other.score, other.position.x, other.position.y)
    }
}

/// Score a candidate placement of a shape with bounding box `(w, h)` at
/// `position`, combined with the bounds of everything already placed on the
/// sheet (`placed_points`: every vertex of every already-placed part, not
/// just its reference point, so the combined extent reflects each part's
/// true occupied area per §4.6), lower is better.
pub fn score(
    placement_type: PlacementType,
    position: Point,
    w: i64,
    h: i64,
    placed_points: &[Point],
) -> f64 {
    match placement_type {
        // Minimize `2*width + height` of the combined bounding box, biasing
        // toward tall/narrow packs (§4.6 gravity strategy).
        PlacementType::Gravity => {
            let (cw, ch) = combined_extent(position, w, h, placed_points);
            2.0 * cw + ch
        }
        // Minimize the combined bounding-box area (§4.6 bounding-box strategy).
        PlacementType::Box => {
            let (cw, ch) = combined_extent(position, w, h, placed_points);
            cw * ch
        }
        // Minimize the area of the convex hull over every already-placed
        // reference point plus the candidate's own corners (§4.6 convex-hull
        // strategy).
        PlacementType::ConvexHull => {
            let mut pts: Vec<Point> = placed_points.to_vec();
            pts.push(position);
            pts.push(Point::new(position.x + w, position.y));
            pts.push(Point::new(position.x + w, position.y + h));
            pts.push(Point::new(position.x, position.y + h));
            convex_hull_area(&pts)
        }
    }
}

fn combined_extent(position: Point, w: i64, h: i64, placed_points: &[Point]) -> (f64, f64) {
    let mut min_x = position.x;
    let mut min_y = position.y;
    let mut max_x = position.x + w;
    let mut max_y = position.y + h;
    for p in placed_points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    ((max_x - min_x) as f64, (max_y - min_y) as f64)
}

/// Graham scan, ported from `ConvexHull.cpp`.
fn convex_hull_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| (a.x, a.y).cmp(&(b.x, b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return 0.0;
    }

    let cross = |o: Point, a: Point, b: Point| (a - o).cross(b - o);

    let mut lower: Vec<Point> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    let hull: Vec<Point> = lower.into_iter().chain(upper).collect();

    let mut area2: i128 = 0;
    let n = hull.len();
    for i in 0..n {
        let p0 = hull[i];
        let p1 = hull[(i + 1) % n];
        area2 += p0.x as i128 * p1.y as i128 - p1.x as i128 * p0.y as i128;
    }
    (area2.unsigned_abs() as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_prefers_lower_combined_bound() {
        let near = score(PlacementType::Gravity, Point::new(0, 0), 10, 10, &[]);
        let far = score(PlacementType::Gravity, Point::new(100, 100), 10, 10, &[]);
        assert!(near < far);
    }

    #[test]
    fn hull_area_of_square_matches_its_area() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(convex_hull_area(&pts), 100.0);
    }

    #[test]
    fn candidate_ordering_breaks_ties_by_position() {
        let a = Candidate { position: Point::new(0, 0), score: 1.0 };
        let b = Candidate { position: Point::new(5, 0), score: 1.0 };
        assert!(a.is_better_than(&b));
    }
}
