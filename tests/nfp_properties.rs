//! NFP correctness and fallback-cascade scenarios.

use nestkit::config::DegeneracyOverrides;
use nestkit::nfp::{self, NfpCache};
use nestkit::{Config, Point, Polygon};

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

/// Outer NFP of two identical 2x2 squares is a 4x4 region, modulo the
/// largest-region selection rule. At minimum the result must be non-empty
/// and its bounding extent must be double the input square's side.
#[test]
fn outer_nfp_of_identical_squares_spans_double_extent() {
    let cache = NfpCache::new();
    let config = Config::default();
    let a = square(2);
    let b = square(2);
    let result = nfp::outer_nfp(&a, &b, false, &cache, &config);
    assert!(!result.is_empty());

    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    for region in result.regions() {
        let b = region.bounds();
        min_x = min_x.min(b.x);
        max_x = max_x.max(b.x + b.width);
    }
    assert!((max_x - min_x) >= 3, "nfp span too small: {}", max_x - min_x);
}

/// Inner NFP of a small part inside a much larger sheet is non-empty, and
/// every region it reports lies within the sheet's own bounds (up to the
/// part's own extent, since the NFP anchors the part's reference vertex).
#[test]
fn inner_nfp_of_small_part_stays_within_sheet_bounds() {
    let cache = NfpCache::new();
    let config = Config::default();
    let sheet = square(1000);
    let part = square(10);
    let result = nfp::inner_nfp(&sheet, &part, &cache, &config);
    assert!(!result.is_empty());
    let sheet_bounds = sheet.bounds();
    for region in result.regions() {
        let rb = region.bounds();
        assert!(rb.x >= sheet_bounds.x - 1);
        assert!(rb.y >= sheet_bounds.y - 1);
    }
}

/// A thin, nearly-collinear sliver trips the degeneracy gate (via a
/// tightened override) and the cascade still returns a usable (orbital or
/// coarse) result rather than `Empty`.
#[test]
fn degenerate_input_still_produces_an_approximate_nfp() {
    let cache = NfpCache::new();
    let config = Config {
        degeneracy_overrides: DegeneracyOverrides {
            min_doubled_area: Some(1_000_000.0),
            ..Default::default()
        },
        ..Config::default()
    };
    let sliver = Polygon::new(
        vec![
            Point::new(0, 0),
            Point::new(1000, 0),
            Point::new(1000, 1),
            Point::new(0, 1),
        ],
        vec![],
    )
    .unwrap();
    let small = square(5);
    let result = nfp::outer_nfp(&sliver, &small, false, &cache, &config);
    assert!(!result.is_empty());
}

/// Cache hit/miss bookkeeping: a repeated request for the same (id, rotation)
/// pair is served from cache after the first computation.
#[test]
fn repeated_outer_nfp_request_is_a_cache_hit() {
    let cache = NfpCache::new();
    let config = Config::default();
    let mut a = square(50);
    a.id = 11;
    let mut b = square(10);
    b.id = 12;

    let _ = nfp::outer_nfp(&a, &b, false, &cache, &config);
    let hits_before = cache.hits();
    let _ = nfp::outer_nfp(&a, &b, false, &cache, &config);
    assert!(cache.hits() > hits_before);
}
