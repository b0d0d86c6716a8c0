//! Boolean and offset operations on integer polygons, wrapping `geo-clipper`.
//!
//! Our [`Polygon`] is already integer-valued in the kernel's working units,
//! so conversions to `geo_clipper`'s `f64`-with-internal-scale API pass
//! `scale = 1.0`: the coordinates handed to Clipper are already the integers
//! we want it to clip on, rather than a second independent scale factor
//! layered on top (see DESIGN.md for this decision).

use geo_clipper::Clipper;
use geo_types::{LineString, MultiPolygon, Polygon as GeoPolygon};

use crate::point::Point;
use crate::polygon::Polygon;

const CLIPPER_UNIT_SCALE: f64 = 1.0;

fn ring_to_geo(points: &[Point]) -> LineString<f64> {
    let mut coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    coords.into()
}

fn ring_from_geo(ls: &LineString<f64>) -> Vec<Point> {
    ls.points()
        .map(|c| Point::new(c.x().round() as i64, c.y().round() as i64))
        .collect()
}

fn to_geo(poly: &Polygon) -> GeoPolygon<f64> {
    let exterior = ring_to_geo(poly.outer());
    let interiors: Vec<LineString<f64>> = poly.holes().iter().map(|h| ring_to_geo(h.outer())).collect();
    GeoPolygon::new(exterior, interiors)
}

fn to_geo_multi(polys: &[Polygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(polys.iter().map(to_geo).collect())
}

/// Convert a `geo` polygon-with-holes back into our kernel representation.
/// Holes that fail re-validation (degenerate after clipping) are dropped —
/// a hole with fewer than 3 vertices left over from a clip carries no
/// information and would only complicate downstream boolean ops.
fn from_geo(poly: &GeoPolygon<f64>) -> Option<Polygon> {
    let outer = ring_from_geo(poly.exterior());
    let mut holes = Vec::new();
    for interior in poly.interiors() {
        let hole_points = ring_from_geo(interior);
        if let Ok(hole) = Polygon::new(hole_points, vec![]) {
            holes.push(hole.reversed());
        }
    }
    Polygon::new(outer, holes).ok()
}

fn from_geo_multi(mp: &MultiPolygon<f64>) -> Vec<Polygon> {
    mp.0.iter().filter_map(from_geo).collect()
}

/// Union of a set of polygons. May split into multiple disjoint rings;
/// callers must handle a multi-polygon result.
pub fn union_all(polys: &[Polygon]) -> Vec<Polygon> {
    if polys.is_empty() {
        return Vec::new();
    }
    let mut acc = to_geo_multi(&polys[0..1]);
    for poly in &polys[1..] {
        acc = acc.union(&to_geo(poly), CLIPPER_UNIT_SCALE);
    }
    from_geo_multi(&acc)
}

pub fn intersect(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    let result = to_geo(a).intersection(&to_geo(b), CLIPPER_UNIT_SCALE);
    from_geo_multi(&result)
}

pub fn difference(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    let result = to_geo(a).difference(&to_geo(b), CLIPPER_UNIT_SCALE);
    from_geo_multi(&result)
}

/// Difference of a polygon against a set of forbidden regions, unioned first.
pub fn difference_many(a: &Polygon, forbidden: &[Polygon]) -> Vec<Polygon> {
    if forbidden.is_empty() {
        return vec![a.clone()];
    }
    let unioned = union_all(forbidden);
    let mut result = vec![a.clone()];
    for f in &unioned {
        let mut next = Vec::new();
        for r in &result {
            next.extend(difference(r, f));
        }
        result = next;
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Miter,
    Square,
    Round,
}

/// Offset a polygon by `delta` (positive grows, negative shrinks).
pub fn offset(poly: &Polygon, delta: f64, join: JoinType, _arc_tolerance: f64) -> Vec<Polygon> {
    let geo_join = match join {
        JoinType::Miter => geo_clipper::JoinType::Miter(2.0),
        JoinType::Square => geo_clipper::JoinType::Square,
        JoinType::Round => geo_clipper::JoinType::Round(0.25),
    };
    let result = to_geo(poly).offset(
        delta,
        geo_join,
        geo_clipper::EndType::ClosedPolygon,
        CLIPPER_UNIT_SCALE,
    );
    from_geo_multi(&result)
}

/// True if `poly`'s outer ring is an axis-aligned rectangle: exactly four
/// vertices whose shoelace area matches its own bounding-box area (a
/// rotated quadrilateral's area is always strictly smaller than its bbox
/// area, so equality pins it to the axis-aligned case). Used to pick the
/// rectangle-sheet inner-NFP shortcut over the general frame trick.
pub fn is_rectangle(poly: &Polygon, tolerance: f64) -> bool {
    if poly.outer().len() != 4 {
        return false;
    }
    let bbox_area = poly.bounds().area() as f64;
    if bbox_area <= 0.0 {
        return false;
    }
    let poly_area = poly.signed_area().abs();
    (bbox_area - poly_area).abs() <= tolerance.max(1e-9) * bbox_area
}

/// Remove degenerate slivers by offsetting out and back in by a negligible
/// amount, the standard Clipper "clean" idiom.
pub fn clean(poly: &Polygon) -> Polygon {
    let grown = offset(poly, 1.0, JoinType::Miter, 0.0);
    if let Some(first) = grown.into_iter().next() {
        let shrunk = offset(&first, -1.0, JoinType::Miter, 0.0);
        if let Some(result) = shrunk.into_iter().next() {
            return result;
        }
    }
    poly.clone()
}

/// Ramer-Douglas-Peucker polygon simplification: a radial-distance
/// prefilter pass, then RDP proper.
pub fn simplify(poly: &Polygon, tolerance: f64) -> Polygon {
    let sq_tolerance = tolerance * tolerance;
    let prefiltered = simplify_radial_distance(poly.outer(), sq_tolerance);
    let simplified = simplify_douglas_peucker(&prefiltered, sq_tolerance);
    match Polygon::new(simplified, poly.holes().to_vec()) {
        Ok(p) => p,
        Err(_) => poly.clone(),
    }
}

fn simplify_radial_distance(points: &[Point], sq_tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut result = vec![points[0]];
    let mut prev = points[0];
    for &p in &points[1..] {
        if sq_dist(prev, p) > sq_tolerance {
            result.push(p);
            prev = p;
        }
    }
    if result.last() != points.last() {
        result.push(*points.last().unwrap());
    }
    result
}

fn simplify_douglas_peucker(points: &[Point], sq_tolerance: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;
    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut index = first;
        for i in (first + 1)..last {
            let d = sq_segment_dist(points[i], points[first], points[last]);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        if max_dist > sq_tolerance {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }
    points
        .iter()
        .zip(keep.iter())
        .filter(|(_, &k)| k)
        .map(|(&p, _)| p)
        .collect()
}

fn sq_dist(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

fn sq_segment_dist(p: Point, s1: Point, s2: Point) -> f64 {
    let (mut x, mut y) = (s1.x as f64, s1.y as f64);
    let (dx0, dy0) = ((s2.x - s1.x) as f64, (s2.y - s1.y) as f64);
    if dx0 != 0.0 || dy0 != 0.0 {
        let t = (((p.x as f64 - x) * dx0) + ((p.y as f64 - y) * dy0)) / (dx0 * dx0 + dy0 * dy0);
        if t > 1.0 {
            x = s2.x as f64;
            y = s2.y as f64;
        } else if t > 0.0 {
            x += dx0 * t;
            y += dy0 * t;
        }
    }
    let dx = p.x as f64 - x;
    let dy = p.y as f64 - y;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: i64, y: i64, side: i64) -> Polygon {
        Polygon::new(
            vec![
                Point::new(x, y),
                Point::new(x + side, y),
                Point::new(x + side, y + side),
                Point::new(x, y + side),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn union_of_overlapping_squares_grows_area() {
        let a = square(0, 0, 10);
        let b = square(5, 5, 10);
        let result = union_all(&[a.clone(), b.clone()]);
        let total: f64 = result.iter().map(|p| p.signed_area().abs()).sum();
        assert!(total > 100.0 && total < 200.0);
    }

    #[test]
    fn difference_of_identical_squares_is_empty() {
        let a = square(0, 0, 10);
        let b = square(0, 0, 10);
        let result = difference(&a, &b);
        assert!(result.iter().all(|p| p.signed_area().abs() < 1.0));
    }

    #[test]
    fn difference_then_union_round_trips_area() {
        let a = square(0, 0, 10);
        let b = square(20, 0, 10);
        let unioned = union_all(&[a.clone(), b.clone()]);
        let mut diffed = Vec::new();
        for u in &unioned {
            diffed.extend(difference(u, &b));
        }
        let area: f64 = diffed.iter().map(|p| p.signed_area().abs()).sum();
        assert!((area - 100.0).abs() < 1.0);
    }

    #[test]
    fn offset_grows_and_shrinks_area() {
        let a = square(0, 0, 10);
        let grown = offset(&a, 1.0, JoinType::Miter, 0.0);
        let grown_area: f64 = grown.iter().map(|p| p.signed_area().abs()).sum();
        assert!(grown_area > 100.0);
    }

    #[test]
    fn axis_aligned_square_is_a_rectangle() {
        let poly = square(0, 0, 10);
        assert!(is_rectangle(&poly, 1e-6));
    }

    #[test]
    fn rotated_square_is_not_a_rectangle() {
        let poly = square(0, 0, 10).rotated(30.0).unwrap();
        assert!(!is_rectangle(&poly, 1e-6));
    }

    #[test]
    fn pentagon_is_not_a_rectangle() {
        let poly = Polygon::new(
            vec![
                Point::new(0, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(5, 15),
                Point::new(0, 10),
            ],
            vec![],
        )
        .unwrap();
        assert!(!is_rectangle(&poly, 1e-6));
    }

    #[test]
    fn simplify_collapses_near_collinear_points() {
        let poly = Polygon::new(
            vec![
                Point::new(0, 0),
                Point::new(5, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(0, 10),
            ],
            vec![],
        )
        .unwrap();
        let simplified = simplify(&poly, 0.5);
        assert!(simplified.outer().len() < poly.outer().len());
    }
}
