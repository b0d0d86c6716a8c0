//! Pre-convolution degeneracy gate.
//!
//! The Minkowski convolution path degrades badly on slivers: near-zero-area
//! rings, extremely thin bounding boxes, and runs of near-collinear vertices
//! all produce numerically unstable parallelogram cells. Rather than let the
//! convolution run and hope `geo-clipper` cleans up the mess, this short-
//! circuits straight to orbital tracing whenever a shape crosses one of
//! three empirically-calibrated thresholds, each overridable through
//! [`crate::config::DegeneracyOverrides`] instead of being baked in as
//! unreachable constants.

use crate::config::DegeneracyOverrides;
use crate::polygon::Polygon;

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub min_doubled_area: f64,
    pub min_bbox_thinness: f64,
    pub max_collinear_fraction: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_doubled_area: 100.0,
            min_bbox_thinness: 2.0,
            max_collinear_fraction: 0.8,
        }
    }
}

pub fn resolve(overrides: &DegeneracyOverrides) -> Thresholds {
    let defaults = Thresholds::default();
    Thresholds {
        min_doubled_area: overrides.min_doubled_area.unwrap_or(defaults.min_doubled_area),
        min_bbox_thinness: overrides.min_bbox_thinness.unwrap_or(defaults.min_bbox_thinness),
        max_collinear_fraction: overrides
            .max_collinear_fraction
            .unwrap_or(defaults.max_collinear_fraction),
    }
}

/// True if convolving `poly` is likely to produce an unstable result and the
/// caller should prefer orbital tracing instead. Three independent gates
/// (§4.3: "rejects... whose shoelace-area doubled is below a small
/// threshold..., whose bounding-box is thinner than 2 units, or in which
/// >80% of vertices are near-collinear") — any one tripping is enough,
/// they are not conjoined.
pub fn is_degenerate(poly: &Polygon, thresholds: &Thresholds) -> bool {
    let doubled_area = poly.signed_area().abs() * 2.0;
    if doubled_area < thresholds.min_doubled_area {
        return true;
    }
    let bounds = poly.bounds();
    let (w, h) = (bounds.width as f64, bounds.height as f64);
    if w.min(h) < thresholds.min_bbox_thinness {
        return true;
    }
    if collinear_fraction(poly) >= thresholds.max_collinear_fraction {
        return true;
    }
    false
}

fn collinear_fraction(poly: &Polygon) -> f64 {
    let pts = poly.outer();
    let n = pts.len();
    if n < 3 {
        return 1.0;
    }
    let mut collinear = 0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let c = pts[(i + 2) % n];
        let cross = (b - a).cross(c - b);
        if cross == 0 {
            collinear += 1;
        }
    }
    collinear as f64 / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    #[test]
    fn thin_sliver_is_degenerate() {
        let poly = Polygon::new(
            vec![
                Point::new(0, 0),
                Point::new(1000, 0),
                Point::new(1000, 1),
                Point::new(0, 1),
            ],
            vec![],
        )
        .unwrap();
        assert!(is_degenerate(&poly, &Thresholds::default()));
    }

    #[test]
    fn regular_square_is_not_degenerate() {
        let poly = Polygon::new(
            vec![
                Point::new(0, 0),
                Point::new(100, 0),
                Point::new(100, 100),
                Point::new(0, 100),
            ],
            vec![],
        )
        .unwrap();
        assert!(!is_degenerate(&poly, &Thresholds::default()));
    }

    #[test]
    fn overrides_widen_the_gate() {
        let poly = Polygon::new(
            vec![
                Point::new(0, 0),
                Point::new(100, 0),
                Point::new(100, 100),
                Point::new(0, 100),
            ],
            vec![],
        )
        .unwrap();
        let overrides = DegeneracyOverrides {
            min_doubled_area: Some(1_000_000.0),
            ..Default::default()
        };
        assert!(is_degenerate(&poly, &resolve(&overrides)));
    }
}
