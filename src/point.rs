use std::ops::{Add, Sub};

/// Integer 2D coordinate. The kernel operates entirely in scaled integer
/// units; floating point only crosses the boundary through [`Point::from_real`]
/// and [`Point::to_real`], so every downstream geometric predicate can stay
/// exact rather than epsilon-guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }

    /// Scale a real-valued coordinate into the integer frame. Rounding uses
    /// round-half-to-even (banker's rounding) so repeated scale/unscale
    /// round trips don't drift in one direction.
    pub fn from_real(x: f64, y: f64, scale: f64) -> Self {
        Point {
            x: round_half_to_even(x * scale),
            y: round_half_to_even(y * scale),
        }
    }

    pub fn to_real(self, scale: f64) -> (f64, f64) {
        (self.x as f64 / scale, self.y as f64 / scale)
    }

    /// Integer dot product, widened to avoid overflow for the coordinate
    /// ranges this kernel is specified to handle.
    pub fn dot(self, other: Point) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    /// Signed cross product (z-component), widened to i128 to stay
    /// overflow-safe on worst-case Minkowski-sum intermediate magnitudes.
    pub fn cross(self, other: Point) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    pub fn translated(self, dx: i64, dy: i64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

fn round_half_to_even(v: f64) -> i64 {
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
