//! Minkowski-sum-based no-fit-polygon. The no-fit polygon of A (stationary)
//! and B (orbiting) is the boundary of `A (+) reflect(B)`; this module
//! builds that sum as a union of per-edge-pair parallelogram cells plus
//! single-point translations.
//!
//! Scale choice: pick an integer scale `s` such that
//! `s * max(|coord|) <= 0.1 * i64::MAX`, convolve in that scale, then the
//! caller rescales back down.

use crate::boolean;
use crate::point::Point;
use crate::polygon::Polygon;

const SCALE_HEADROOM: f64 = 0.1;

/// Pick a scale factor so that convolved coordinates (which can be as large
/// as the sum of the two inputs' extents) stay well inside `i64` range.
pub fn choose_scale(a: &Polygon, b: &Polygon) -> f64 {
    let max_coord = [a.outer(), b.outer()]
        .iter()
        .flat_map(|ring| ring.iter())
        .map(|p| p.x.unsigned_abs().max(p.y.unsigned_abs()))
        .max()
        .unwrap_or(1)
        .max(1) as f64;
    let headroom = SCALE_HEADROOM * i64::MAX as f64;
    (headroom / (2.0 * max_coord)).max(1.0)
}

fn convolve_two_segments(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Polygon> {
    let points = vec![a1 + b1, a2 + b1, a2 + b2, a1 + b2];
    Polygon::new(points, vec![]).ok()
}

/// All edges of `a` convolved against all edges of `b`: a brute-force
/// approach (but correct, since the union washes out the redundant cells)
/// rather than an angle-sorted convex-decomposition algorithm.
fn convolve_two_point_sequences(a: &[Point], b: &[Point]) -> Vec<Polygon> {
    let mut cells = Vec::new();
    let na = a.len();
    let nb = b.len();
    if na < 2 || nb < 2 {
        return cells;
    }
    for i in 0..na {
        let a1 = a[i];
        let a2 = a[(i + 1) % na];
        for j in 0..nb {
            let b1 = b[j];
            let b2 = b[(j + 1) % nb];
            if let Some(cell) = convolve_two_segments(a1, a2, b1, b2) {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Every ring of `a` (outer plus holes) convolved against every ring of `b`.
fn convolve_point_sequence_with_polygon(a_ring: &[Point], b: &Polygon) -> Vec<Polygon> {
    let mut cells = convolve_two_point_sequences(a_ring, b.outer());
    for hole in b.holes() {
        cells.extend(convolve_two_point_sequences(a_ring, hole.outer()));
    }
    cells
}

fn translate_ring(ring: &[Point], by: Point) -> Vec<Point> {
    ring.iter().map(|p| *p + by).collect()
}

/// Top-level driver, mirroring `convolve_two_polygon_sets`: convolves every
/// ring pair between A and B, plus single-vertex translations of the whole
/// opposite polygon (needed so isolated vertices that touch no compatible
/// edge still contribute a cell), then unions everything into one region.
pub fn convolve_two_polygon_sets(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    let mut cells = Vec::new();
    cells.extend(convolve_point_sequence_with_polygon(a.outer(), b));
    for hole in a.holes() {
        cells.extend(convolve_point_sequence_with_polygon(hole.outer(), b));
    }
    for &pb in b.outer() {
        if let Ok(shifted) = Polygon::new(translate_ring(a.outer(), pb), vec![]) {
            cells.push(shifted);
        }
    }
    for &pa in a.outer() {
        if let Ok(shifted) = Polygon::new(translate_ring(b.outer(), pa), vec![]) {
            cells.push(shifted);
        }
    }
    if cells.is_empty() {
        return Vec::new();
    }
    boolean::union_all(&cells)
}

/// No-fit polygon of A (stationary) and B (orbiting), computed via
/// convolution of A with the point-reflection of B (`-B`), per the Minkowski
/// difference definition `NFP(A, B) = A (+) (-B)`.
pub fn calculate_nfp(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    let reflected_outer: Vec<Point> = b.outer().iter().map(|p| Point::new(-p.x, -p.y)).collect();
    let mut reflected_holes = Vec::with_capacity(b.holes().len());
    for h in b.holes() {
        let pts: Vec<Point> = h.outer().iter().map(|p| Point::new(-p.x, -p.y)).collect();
        if let Ok(hole) = Polygon::new(pts, vec![]) {
            reflected_holes.push(hole.reversed());
        }
    }
    let reflected = match Polygon::new(reflected_outer, reflected_holes) {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };
    convolve_two_polygon_sets(a, &reflected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> Polygon {
        Polygon::new(
            vec![
                Point::new(0, 0),
                Point::new(side, 0),
                Point::new(side, side),
                Point::new(0, side),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn nfp_of_two_unit_squares_is_a_larger_square() {
        let a = square(10);
        let b = square(10);
        let nfp = calculate_nfp(&a, &b);
        assert!(!nfp.is_empty());
        let total_area: f64 = nfp.iter().map(|p| p.signed_area().abs()).sum();
        // NFP of two 10x10 squares is a 20x20 square (area 400) centered so
        // that B's reference vertex traces it out.
        assert!(total_area > 350.0 && total_area < 450.0, "area={total_area}");
    }

    #[test]
    fn choose_scale_keeps_product_within_headroom() {
        let a = square(1_000_000);
        let b = square(1_000_000);
        let scale = choose_scale(&a, &b);
        let max_coord = 1_000_000.0;
        assert!(scale * max_coord * 2.0 <= 0.1 * i64::MAX as f64 + 1.0);
    }
}
