//! Orbital-tracing no-fit-polygon, the fallback path when Minkowski
//! convolution is gated off by [`super::degenerate`] or returns nothing:
//! slide B around the outside of A, recording the path traced by B's
//! reference vertex until it returns to its start.

use crate::point::Point;
use crate::polygon::Polygon;

const SAFETY_MULTIPLIER: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Contact {
    /// Index of the touching vertex in A.
    a_idx: usize,
    /// Index of the touching vertex in B.
    b_idx: usize,
}

fn ring_at(ring: &[Point], i: usize) -> Point {
    ring[i % ring.len()]
}

/// Vertices of A and (translated) B that coincide within the polygon's own
/// integer grid — the orbital algorithm only needs exact coincidence since
/// both inputs share the same integer lattice.
fn find_touching_contacts(a: &[Point], b: &[Point], offset: Point) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for (i, &pa) in a.iter().enumerate() {
        for (j, &pb) in b.iter().enumerate() {
            if pa == pb + offset {
                contacts.push(Contact { a_idx: i, b_idx: j });
            }
        }
    }
    contacts
}

/// Candidate translation vectors generated at each touching contact: the two
/// edges of A leaving the contact point (slide B along A's boundary) and the
/// reversed edges of B leaving its contact point (slide B out from under A).
fn generate_translation_vectors(contacts: &[Contact], a: &[Point], b: &[Point]) -> Vec<Point> {
    let mut vectors = Vec::new();
    let na = a.len();
    let nb = b.len();
    for c in contacts {
        let a_prev = ring_at(a, (c.a_idx + na - 1) % na);
        let a_here = ring_at(a, c.a_idx);
        let a_next = ring_at(a, c.a_idx + 1);
        vectors.push(a_next - a_here);
        vectors.push(a_prev - a_here);

        let b_prev = ring_at(b, (c.b_idx + nb - 1) % nb);
        let b_here = ring_at(b, c.b_idx);
        let b_next = ring_at(b, c.b_idx + 1);
        vectors.push(b_here - b_next);
        vectors.push(b_here - b_prev);
    }
    vectors.retain(|v| v.x != 0 || v.y != 0);
    vectors
}

/// A vector that reverses a previous step is never useful: it would just
/// retrace the same edge and the trace would never terminate.
fn is_backtracking(vector: Point, prev_vector: Option<Point>) -> bool {
    match prev_vector {
        None => false,
        Some(prev) => vector.cross(prev) == 0 && vector.dot(prev) < 0,
    }
}

fn gcd_i64(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn scale_point(p: Point, k: i64) -> Point {
    Point::new(p.x * k, p.y * k)
}

/// The longest feasible slide along `v`'s direction starting from `offset`:
/// reduce `v` to its primitive lattice step, then find the largest integer
/// multiple of that step whose endpoint doesn't overlap A (§4.3 step 4,
/// "pick the vector with the maximum feasible slide; if the slide is
/// shorter than the candidate vector, scale it down"). Returns the zero
/// vector if even one primitive step already overlaps.
fn max_feasible_slide(a: &Polygon, b_ring: &[Point], offset: Point, v: Point) -> Point {
    let g = gcd_i64(v.x, v.y);
    if g == 0 {
        return Point::new(0, 0);
    }
    let unit = Point::new(v.x / g, v.y / g);
    let max_steps = g;

    if !would_overlap(a, b_ring, offset + v) {
        return v;
    }
    if would_overlap(a, b_ring, offset + scale_point(unit, 1)) {
        return Point::new(0, 0);
    }

    // Binary search the largest feasible step count in [1, max_steps];
    // feasibility is monotone non-increasing as the step count grows since
    // B only ever moves further along a fixed direction away from its
    // known-feasible starting contact.
    let (mut lo, mut hi) = (1i64, max_steps);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if would_overlap(a, b_ring, offset + scale_point(unit, mid)) {
            hi = mid - 1;
        } else {
            lo = mid;
        }
    }
    scale_point(unit, lo)
}

/// Would translating every vertex of B by `offset + step` push any vertex of
/// B to the interior side of any edge of A (i.e. an overlap)? Approximated,
/// as the original does for its quick per-step feasibility check, via a
/// point-in-polygon test of B's vertices against A.
fn would_overlap(a: &Polygon, b: &[Point], offset: Point) -> bool {
    b.iter().any(|&p| point_strictly_inside(a.outer(), p + offset))
}

fn point_strictly_inside(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = ring[i];
        let pj = ring[j];
        let intersects = ((pi.y > p.y) != (pj.y > p.y))
            && ((p.x as f64)
                < (pj.x - pi.x) as f64 * (p.y - pi.y) as f64 / (pj.y - pi.y) as f64 + pi.x as f64);
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Find a starting offset at which B touches A from the outside without
/// overlapping: try placing B so its leftmost-lowest vertex sits at A's
/// leftmost-lowest vertex, then nudge along A's edges until a
/// non-overlapping touch is found.
fn search_start_point(a: &Polygon, b: &Polygon, inside: bool) -> Option<Point> {
    let a_ring = a.outer();
    let b_ring = b.outer();
    let b_ref = *b_ring.first()?;
    if inside {
        // B starts touching A's boundary from the inside: align B's
        // reference vertex with A's topmost vertex, matching the frame
        // trick's consumer which always traces the frame from outside in.
        let a_top = a_ring
            .iter()
            .copied()
            .min_by_key(|p| (p.y, p.x))
            .unwrap_or(b_ref);
        return Some(a_top - b_ref);
    }
    for &pa in a_ring {
        let candidate = pa - b_ref;
        if !would_overlap(a, b_ring, candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Trace the no-fit polygon boundary by orbiting B around A, recording the
/// path of B's reference vertex. Returns an empty vector if no valid start
/// point exists (B cannot touch A without overlapping).
pub fn trace_nfp(a: &Polygon, b: &Polygon, inside: bool) -> Vec<Point> {
    let start_offset = match search_start_point(a, b, inside) {
        Some(o) => o,
        None => return Vec::new(),
    };

    let a_ring = a.outer();
    let b_ring = b.outer();
    let cap = SAFETY_MULTIPLIER * (a_ring.len() + b_ring.len());

    let mut offset = start_offset;
    let mut path = vec![offset];
    let mut prev_vector: Option<Point> = None;

    for _ in 0..cap {
        let contacts = find_touching_contacts(a_ring, b_ring, offset);
        let mut candidates = generate_translation_vectors(&contacts, a_ring, b_ring);
        candidates.retain(|&v| !is_backtracking(v, prev_vector));
        if candidates.is_empty() {
            break;
        }
        // Each candidate direction gets scaled down to its own maximum
        // feasible slide; the candidate chosen is whichever slide travels
        // furthest, not whichever raw vector was shortest.
        let mut best: Option<Point> = None;
        let mut best_len2: i128 = -1;
        for &v in &candidates {
            let slide = max_feasible_slide(a, b_ring, offset, v);
            if slide.x == 0 && slide.y == 0 {
                continue;
            }
            let len2 = slide.x as i128 * slide.x as i128 + slide.y as i128 * slide.y as i128;
            if len2 > best_len2 {
                best_len2 = len2;
                best = Some(slide);
            }
        }
        let step = match best {
            Some(s) => s,
            None => break,
        };
        offset += step;
        prev_vector = Some(step);
        if offset == start_offset {
            break;
        }
        path.push(offset);
    }
    path
}
