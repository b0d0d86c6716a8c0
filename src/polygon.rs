use crate::error::NestError;
use crate::point::Point;

/// Axis-aligned bounding box in the same integer units as [`Point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    pub fn of_points(points: &[Point]) -> Option<BoundingBox> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let (mut min_x, mut max_x) = (first.x, first.x);
        let (mut min_y, mut max_y) = (first.y, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    pub fn area(&self) -> i128 {
        self.width as i128 * self.height as i128
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Expand the box around its center by `factor`, keeping it concentric.
    pub fn scaled_around_center(&self, factor: f64) -> BoundingBox {
        let cx = self.x as f64 + self.width as f64 / 2.0;
        let cy = self.y as f64 + self.height as f64 / 2.0;
        let new_w = self.width as f64 * factor;
        let new_h = self.height as f64 * factor;
        BoundingBox {
            x: (cx - new_w / 2.0).round() as i64,
            y: (cy - new_h / 2.0).round() as i64,
            width: new_w.round() as i64,
            height: new_h.round() as i64,
        }
    }
}

/// Outer ring (CCW, implicitly closed) plus an ordered collection of holes.
/// Holes hold only geometry, never a back-pointer to their parent ring —
/// traversal is always outer-first via [`Polygon::outer`]/[`Polygon::holes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    outer: Vec<Point>,
    holes: Vec<Polygon>,
    pub id: i64,
    pub source: i64,
    pub rotation: f64,
    pub quantity: u32,
    pub is_sheet: bool,
    pub label: Option<String>,
}

const MIN_DOUBLED_AREA: i128 = 0;

impl Polygon {
    /// Ingest a polygon, enforcing its winding and non-degeneracy invariants.
    /// Reverses CW input to the canonical CCW winding. Rejects degenerate rings.
    pub fn new(mut outer: Vec<Point>, holes: Vec<Polygon>) -> Result<Polygon, NestError> {
        dedupe_consecutive(&mut outer);
        if outer.len() < 3 {
            return Err(NestError::InvalidPolygon {
                reason: format!("outer ring has {} vertices after cleaning, need >= 3", outer.len()),
            });
        }
        let area2 = shoelace_doubled(&outer);
        if area2 == MIN_DOUBLED_AREA {
            return Err(NestError::InvalidPolygon {
                reason: "outer ring has zero area".to_string(),
            });
        }
        if area2 < 0 {
            outer.reverse();
        }
        for hole in &holes {
            if hole.signed_area() > 0.0 {
                return Err(NestError::InvalidPolygon {
                    reason: "hole must be wound opposite the outer ring".to_string(),
                });
            }
        }
        Ok(Polygon {
            outer,
            holes,
            id: 0,
            source: 0,
            rotation: 0.0,
            quantity: 1,
            is_sheet: false,
            label: None,
        })
    }

    pub fn outer(&self) -> &[Point] {
        &self.outer
    }

    pub fn holes(&self) -> &[Polygon] {
        &self.holes
    }

    /// All rings, outer first, each paired with whether it is a hole.
    pub fn rings(&self) -> impl Iterator<Item = (&[Point], bool)> {
        std::iter::once((self.outer.as_slice(), false))
            .chain(self.holes.iter().map(|h| (h.outer.as_slice(), true)))
    }

    pub fn signed_area(&self) -> f64 {
        shoelace_doubled(&self.outer) as f64 / 2.0
    }

    pub fn centroid(&self) -> (f64, f64) {
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut area2 = 0.0;
        let n = self.outer.len();
        for i in 0..n {
            let p0 = self.outer[i];
            let p1 = self.outer[(i + 1) % n];
            let cross = (p0.x * p1.y - p1.x * p0.y) as f64;
            cx += (p0.x + p1.x) as f64 * cross;
            cy += (p0.y + p1.y) as f64 * cross;
            area2 += cross;
        }
        if area2.abs() < f64::EPSILON {
            let (sx, sy) = self.outer.iter().fold((0i64, 0i64), |(sx, sy), p| (sx + p.x, sy + p.y));
            return (sx as f64 / n as f64, sy as f64 / n as f64);
        }
        (cx / (3.0 * area2), cy / (3.0 * area2))
    }

    pub fn bounds(&self) -> BoundingBox {
        // Holes lie strictly inside the outer ring, so the outer ring alone
        // determines the bounding box.
        BoundingBox::of_points(&self.outer).expect("outer ring always has >= 3 points")
    }

    pub fn translated(&self, dx: i64, dy: i64) -> Polygon {
        Polygon {
            outer: self.outer.iter().map(|p| p.translated(dx, dy)).collect(),
            holes: self.holes.iter().map(|h| h.translated(dx, dy)).collect(),
            ..self.clone_metadata()
        }
    }

    /// Rotate through doubles and re-validate the resulting integer polygon,
    /// so a rotation that collapses a sliver to a degenerate ring is caught
    /// here rather than surfacing as a silent geometry bug downstream.
    pub fn rotated(&self, angle_deg: f64) -> Result<Polygon, NestError> {
        let rotate_ring = |ring: &[Point]| -> Vec<Point> {
            let rad = angle_deg.to_radians();
            let (sin, cos) = rad.sin_cos();
            ring.iter()
                .map(|p| {
                    let x = p.x as f64;
                    let y = p.y as f64;
                    Point {
                        x: round_half_to_even_f(x * cos - y * sin),
                        y: round_half_to_even_f(x * sin + y * cos),
                    }
                })
                .collect()
        };
        let new_outer = rotate_ring(&self.outer);
        let mut new_holes = Vec::with_capacity(self.holes.len());
        for h in &self.holes {
            new_holes.push(h.rotated(angle_deg)?);
        }
        let mut result = Polygon::new(new_outer, new_holes)?;
        result.id = self.id;
        result.source = self.source;
        result.rotation = (self.rotation + angle_deg).rem_euclid(360.0);
        result.quantity = self.quantity;
        result.is_sheet = self.is_sheet;
        result.label = self.label.clone();
        Ok(result)
    }

    pub fn reversed(&self) -> Polygon {
        let mut outer = self.outer.clone();
        outer.reverse();
        Polygon {
            outer,
            holes: self.holes.clone(),
            ..self.clone_metadata()
        }
    }

    fn clone_metadata(&self) -> Polygon {
        Polygon {
            outer: Vec::new(),
            holes: Vec::new(),
            id: self.id,
            source: self.source,
            rotation: self.rotation,
            quantity: self.quantity,
            is_sheet: self.is_sheet,
            label: self.label.clone(),
        }
    }
}

fn round_half_to_even_f(v: f64) -> i64 {
    let floor = v.floor();
    let diff = v - floor;
    let floor_i = floor as i64;
    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
    }
}

fn dedupe_consecutive(points: &mut Vec<Point>) {
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
}

fn shoelace_doubled(points: &[Point]) -> i128 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    let mut area2: i128 = 0;
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        area2 += p0.x as i128 * p1.y as i128 - p1.x as i128 * p0.y as i128;
    }
    area2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ]
    }

    #[test]
    fn area_of_ccw_square_is_positive() {
        let poly = Polygon::new(square(10), vec![]).unwrap();
        assert_eq!(poly.signed_area(), 100.0);
    }

    #[test]
    fn cw_input_is_reversed_to_ccw() {
        let mut pts = square(10);
        pts.reverse();
        let poly = Polygon::new(pts, vec![]).unwrap();
        assert_eq!(poly.signed_area(), 100.0);
    }

    #[test]
    fn reverse_reverse_is_identity() {
        let poly = Polygon::new(square(10), vec![]).unwrap();
        let back = poly.reversed().reversed();
        assert_eq!(poly.outer(), back.outer());
    }

    #[test]
    fn reverse_negates_area() {
        let poly = Polygon::new(square(10), vec![]).unwrap();
        assert_eq!(poly.reversed().signed_area(), -poly.signed_area());
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let pts = vec![Point::new(0, 0), Point::new(1, 0)];
        assert!(Polygon::new(pts, vec![]).is_err());
    }

    #[test]
    fn zero_area_polygon_is_rejected() {
        let pts = vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
        assert!(Polygon::new(pts, vec![]).is_err());
    }

    #[test]
    fn rotate_90_then_neg_90_round_trips_within_one_unit() {
        let poly = Polygon::new(square(100), vec![]).unwrap();
        let round_tripped = poly.rotated(37.0).unwrap().rotated(-37.0).unwrap();
        for (a, b) in poly.outer().iter().zip(round_tripped.outer()) {
            let dx = (a.x - b.x).abs();
            let dy = (a.y - b.y).abs();
            assert!(dx <= 1 && dy <= 1, "a={a:?} b={b:?}");
        }
    }

    #[test]
    fn bounding_box_matches_square() {
        let poly = Polygon::new(square(10), vec![]).unwrap();
        let b = poly.bounds();
        assert_eq!(b, BoundingBox { x: 0, y: 0, width: 10, height: 10 });
    }
}
