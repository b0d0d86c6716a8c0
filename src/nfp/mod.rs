//! No-fit-polygon engine: the cascade of Minkowski convolution,
//! orbital-tracing fallback, and a last-resort bounding-box approximation.
//! Every failure mode is reported back as a structured [`NfpOutcome`]
//! rather than silently substituted — callers decide whether a degraded
//! result is acceptable.

pub mod cache;
pub mod degenerate;
mod minkowski;
mod orbital;

use tracing::{debug, trace, warn};

use crate::boolean;
use crate::config::Config;
use crate::point::Point;
use crate::polygon::{BoundingBox, Polygon};

pub use cache::{CacheKey, NfpCache};

/// Result of attempting to compute a no-fit-polygon. Every variant but
/// `Empty` carries at least one usable region; `Empty` means B cannot be
/// placed relative to A at all (B larger than the available space).
#[derive(Debug, Clone)]
pub enum NfpOutcome {
    /// Computed by exact integer Minkowski convolution.
    Exact(Vec<Polygon>),
    /// Computed by orbital tracing after convolution was gated off or
    /// returned nothing; geometrically valid but less precise on highly
    /// concave inputs.
    OrbitalApproximate(Vec<Polygon>),
    /// Neither convolution nor tracing produced a usable boundary; a
    /// conservative bounding-box approximation was substituted.
    CoarseAabb(Vec<Polygon>),
    /// No valid NFP exists (B cannot fit relative to A under any
    /// translation).
    Empty,
}

impl NfpOutcome {
    pub fn regions(&self) -> &[Polygon] {
        match self {
            NfpOutcome::Exact(v) | NfpOutcome::OrbitalApproximate(v) | NfpOutcome::CoarseAabb(v) => v,
            NfpOutcome::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions().is_empty()
    }

    fn with_regions(&self, regions: Vec<Polygon>) -> NfpOutcome {
        if regions.is_empty() {
            return NfpOutcome::Empty;
        }
        match self {
            NfpOutcome::Exact(_) => NfpOutcome::Exact(regions),
            NfpOutcome::OrbitalApproximate(_) => NfpOutcome::OrbitalApproximate(regions),
            NfpOutcome::CoarseAabb(_) => NfpOutcome::CoarseAabb(regions),
            NfpOutcome::Empty => NfpOutcome::Empty,
        }
    }
}

fn coarse_aabb_outer(a: &Polygon, b: &Polygon) -> Vec<Polygon> {
    let ab = a.bounds();
    let bb = b.bounds();
    let expanded = BoundingBox {
        x: ab.x - bb.width,
        y: ab.y - bb.height,
        width: ab.width + 2 * bb.width,
        height: ab.height + 2 * bb.height,
    };
    bbox_to_polygon(&expanded).into_iter().collect()
}

fn coarse_aabb_inner(sheet: &Polygon, b: &Polygon) -> Vec<Polygon> {
    let sb = sheet.bounds();
    let bb = b.bounds();
    if bb.width >= sb.width || bb.height >= sb.height {
        return Vec::new();
    }
    let shrunk = BoundingBox {
        x: sb.x,
        y: sb.y,
        width: sb.width - bb.width,
        height: sb.height - bb.height,
    };
    bbox_to_polygon(&shrunk).into_iter().collect()
}

fn bbox_to_polygon(b: &BoundingBox) -> Option<Polygon> {
    if b.width <= 0 || b.height <= 0 {
        return None;
    }
    Polygon::new(
        vec![
            Point::new(b.x, b.y),
            Point::new(b.x + b.width, b.y),
            Point::new(b.x + b.width, b.y + b.height),
            Point::new(b.x, b.y + b.height),
        ],
        vec![],
    )
    .ok()
}

fn path_to_polygon(path: &[Point]) -> Option<Polygon> {
    Polygon::new(path.to_vec(), vec![]).ok()
}

/// Outer no-fit-polygon of A (stationary) and B (orbiting): the locus of
/// positions of B's reference vertex such that B touches but does not
/// overlap A. Results for `inside == false` are cached; inner-NFP calls
/// (`inside == true`, used internally by [`inner_nfp`]) bypass the cache
/// since they are keyed by a synthetic frame polygon, not a stable id.
pub fn outer_nfp(a: &Polygon, b: &Polygon, inside: bool, cache: &NfpCache, config: &Config) -> NfpOutcome {
    if !inside {
        let key = CacheKey::new(a.id, b.id, a.rotation, b.rotation);
        if let Some(hit) = cache.get(&key) {
            trace!(a_id = a.id, b_id = b.id, "nfp cache hit");
            return NfpOutcome::Exact(hit);
        }
        let computed = compute_outer_nfp(a, b, config);
        if let NfpOutcome::Exact(regions) = &computed {
            cache.insert(key, regions.clone());
        }
        computed
    } else {
        compute_outer_nfp(a, b, config)
    }
}

fn compute_outer_nfp(a: &Polygon, b: &Polygon, config: &Config) -> NfpOutcome {
    let thresholds = degenerate::resolve(&config.degeneracy_overrides);
    if !degenerate::is_degenerate(a, &thresholds) && !degenerate::is_degenerate(b, &thresholds) {
        let mut regions = minkowski::calculate_nfp(a, b);
        if !regions.is_empty() {
            // The Minkowski sum can split into disjoint pieces under certain
            // winding/numeric conditions; only the largest-area region is
            // the physically meaningful NFP (§4.3 step 6).
            if regions.len() > 1 {
                let dominant = regions
                    .iter()
                    .enumerate()
                    .max_by(|(_, x), (_, y)| x.signed_area().abs().partial_cmp(&y.signed_area().abs()).unwrap())
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                regions = vec![regions.swap_remove(dominant)];
            }
            debug!(a_id = a.id, b_id = b.id, "nfp via minkowski convolution");
            return NfpOutcome::Exact(regions);
        }
    } else {
        debug!(a_id = a.id, b_id = b.id, "degeneracy gate engaged, skipping convolution");
    }

    let path = orbital::trace_nfp(a, b, false);
    if path.len() >= 3 {
        if let Some(poly) = path_to_polygon(&path) {
            warn!(a_id = a.id, b_id = b.id, "nfp fell back to orbital tracing");
            return NfpOutcome::OrbitalApproximate(vec![poly]);
        }
    }

    let coarse = coarse_aabb_outer(a, b);
    if !coarse.is_empty() {
        warn!(a_id = a.id, b_id = b.id, "nfp fell back to coarse bounding-box approximation");
        return NfpOutcome::CoarseAabb(coarse);
    }
    NfpOutcome::Empty
}

/// Build the 1.1x bounding-box frame around `sheet` with `sheet` pushed in
/// as a hole. The outer NFP of this frame against B, restricted to its hole
/// regions, is the inner NFP of `sheet` against B.
fn create_frame(sheet: &Polygon) -> Option<Polygon> {
    let expanded = sheet.bounds().scaled_around_center(1.1);
    let outer = bbox_to_polygon(&expanded)?;
    let hole = sheet.reversed();
    Polygon::new(outer.outer().to_vec(), vec![hole]).ok()
}

/// Exact inner NFP for an axis-aligned rectangular sheet with no holes: a
/// point `P` lies inside an axis-aligned rectangle `R` iff `bbox(P) ⊆ R`,
/// so the valid locus for B's reference vertex is `sheet`'s bounding box
/// shrunk by B's own bounding-box extent, shifted so the reference vertex's
/// offset within B's bbox is preserved. Exact, not an approximation — this
/// bypasses the Minkowski/frame machinery entirely for the overwhelmingly
/// common rectangular-stock case.
fn no_fit_polygon_rectangle(sheet: &Polygon, b: &Polygon) -> Option<Polygon> {
    let sheet_bounds = sheet.bounds();
    let part_bounds = b.bounds();
    if part_bounds.width >= sheet_bounds.width || part_bounds.height >= sheet_bounds.height {
        return None;
    }
    let reference = *b.outer().first()?;
    let region = BoundingBox {
        x: sheet_bounds.x + (reference.x - part_bounds.x),
        y: sheet_bounds.y + (reference.y - part_bounds.y),
        width: sheet_bounds.width - part_bounds.width,
        height: sheet_bounds.height - part_bounds.height,
    };
    bbox_to_polygon(&region)
}

/// Inner no-fit-polygon: valid positions for B's reference vertex such that B
/// is placed entirely inside `sheet` (minus any of `sheet`'s own holes),
/// computed via the frame trick above.
pub fn inner_nfp(sheet: &Polygon, b: &Polygon, cache: &NfpCache, config: &Config) -> NfpOutcome {
    if sheet.holes().is_empty() && boolean::is_rectangle(sheet, config.overlap_tolerance) {
        return match no_fit_polygon_rectangle(sheet, b) {
            Some(region) => NfpOutcome::Exact(vec![region]),
            None => NfpOutcome::Empty,
        };
    }

    let frame = match create_frame(sheet) {
        Some(f) => f,
        None => return NfpOutcome::Empty,
    };

    let frame_result = outer_nfp(&frame, b, true, cache, config);
    let mut regions: Vec<Polygon> = frame_result
        .regions()
        .iter()
        .flat_map(|p| p.holes().iter().cloned())
        .collect();

    if regions.is_empty() {
        // The synthetic frame carries no children when convolution and
        // tracing both failed to preserve hole structure (e.g. the coarse
        // AABB path, which has no holes at all); fall back to a direct
        // bbox-shrink approximation instead of reporting empty outright.
        let coarse = coarse_aabb_inner(sheet, b);
        if coarse.is_empty() {
            return NfpOutcome::Empty;
        }
        return NfpOutcome::CoarseAabb(coarse);
    }

    for hole in sheet.holes() {
        let hole_nfp = outer_nfp(hole, b, false, cache, config);
        if hole_nfp.is_empty() {
            continue;
        }
        regions = subtract_all(&regions, hole_nfp.regions());
    }

    frame_result.with_regions(regions)
}

fn subtract_all(regions: &[Polygon], forbidden: &[Polygon]) -> Vec<Polygon> {
    let mut result = Vec::new();
    for r in regions {
        let mut remaining = vec![r.clone()];
        for f in forbidden {
            let mut next = Vec::new();
            for piece in &remaining {
                next.extend(crate::boolean::difference(piece, f));
            }
            remaining = next;
        }
        result.extend(remaining.into_iter().filter(|p| p.signed_area().abs() >= 0.1));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

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
    fn outer_nfp_cascade_produces_exact_result_for_squares() {
        let cache = NfpCache::new();
        let config = Config::default();
        let a = square(50);
        let b = square(10);
        let result = outer_nfp(&a, &b, false, &cache, &config);
        assert!(!result.is_empty());
    }

    #[test]
    fn outer_nfp_cache_is_reused_on_second_call() {
        let cache = NfpCache::new();
        let config = Config::default();
        let mut a = square(50);
        a.id = 1;
        let mut b = square(10);
        b.id = 2;
        let _ = outer_nfp(&a, &b, false, &cache, &config);
        let misses_after_first = cache.misses();
        let _ = outer_nfp(&a, &b, false, &cache, &config);
        assert!(cache.hits() >= 1);
        assert_eq!(cache.misses(), misses_after_first);
    }

    #[test]
    fn inner_nfp_of_small_part_in_large_sheet_is_nonempty() {
        let cache = NfpCache::new();
        let config = Config::default();
        let sheet = square(1000);
        let part = square(10);
        let result = inner_nfp(&sheet, &part, &cache, &config);
        assert!(!result.is_empty());
    }

    #[test]
    fn rectangular_sheet_takes_the_exact_fast_path() {
        let cache = NfpCache::new();
        let config = Config::default();
        let sheet = square(100);
        let part = square(10);
        let result = inner_nfp(&sheet, &part, &cache, &config);
        match result {
            NfpOutcome::Exact(regions) => {
                assert_eq!(regions.len(), 1);
                let b = regions[0].bounds();
                // reference vertex is part's own first vertex (0,0), so the
                // valid locus is exactly [0, 90] x [0, 90].
                assert_eq!(b, BoundingBox { x: 0, y: 0, width: 90, height: 90 });
            }
            other => panic!("expected exact rectangle fast path, got {other:?}"),
        }
    }

    #[test]
    fn inner_nfp_of_oversized_part_is_empty() {
        let cache = NfpCache::new();
        let config = Config::default();
        let sheet = square(10);
        let part = square(1000);
        let result = inner_nfp(&sheet, &part, &cache, &config);
        assert!(result.is_empty());
    }
}
