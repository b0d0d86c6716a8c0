//! Edge-alignment bonus: total length of edges shared between already-placed
//! parts on the same sheet.
//!
//! Nesting runs that butt parts edge-to-edge waste less material in real
//! cutting (shared kerf), so placements with long runs of touching edges are
//! rewarded. Since lower fitness is better, the bonus is *subtracted* from
//! fitness rather than added.

use crate::placement::PlacedPart;
use crate::point::Point;

const MERGE_TOLERANCE: i64 = 0;

fn edge_key(a: Point, b: Point) -> (Point, Point) {
    if (a.x, a.y) <= (b.x, b.y) {
        (a, b)
    } else {
        (b, a)
    }
}

fn edge_length(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Total length of edges shared between any two placed parts on the same
/// sheet, after snapping vertices within [`MERGE_TOLERANCE`] integer units
/// of each other (coordinates are already on the kernel's integer lattice,
/// so this tolerance is normally 0 — exact coincidence).
pub fn merged_length(placements: &[PlacedPart]) -> f64 {
    let mut edges: Vec<(Point, Point)> = Vec::new();
    for placement in placements {
        let ring = placement.polygon.outer();
        let n = ring.len();
        for i in 0..n {
            edges.push(edge_key(ring[i], ring[(i + 1) % n]));
        }
        for hole in placement.polygon.holes() {
            let ring = hole.outer();
            let n = ring.len();
            for i in 0..n {
                edges.push(edge_key(ring[i], ring[(i + 1) % n]));
            }
        }
    }

    edges.sort_by_key(|(a, b)| (a.x, a.y, b.x, b.y));

    let mut total = 0.0;
    let mut i = 0;
    while i + 1 < edges.len() {
        if edges[i] == edges[i + 1] {
            total += edge_length(edges[i].0, edges[i].1);
            i += 2;
        } else {
            i += 1;
        }
    }
    let _ = MERGE_TOLERANCE;
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Polygon;

    fn square_at(x: i64, y: i64, side: i64) -> Polygon {
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
    fn adjacent_squares_share_one_edge() {
        let a = PlacedPart { part_index: 0, polygon: square_at(0, 0, 10), local_polygon: square_at(0, 0, 10), position: Point::new(0, 0), rotation: 0.0 };
        let b = PlacedPart { part_index: 1, polygon: square_at(10, 0, 10), local_polygon: square_at(0, 0, 10), position: Point::new(10, 0), rotation: 0.0 };
        assert_eq!(merged_length(&[a, b]), 10.0);
    }

    #[test]
    fn disjoint_squares_share_nothing() {
        let a = PlacedPart { part_index: 0, polygon: square_at(0, 0, 10), local_polygon: square_at(0, 0, 10), position: Point::new(0, 0), rotation: 0.0 };
        let b = PlacedPart { part_index: 1, polygon: square_at(100, 100, 10), local_polygon: square_at(0, 0, 10), position: Point::new(100, 100), rotation: 0.0 };
        assert_eq!(merged_length(&[a, b]), 0.0);
    }
}
