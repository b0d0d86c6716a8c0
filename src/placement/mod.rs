//! The placement worker: an NFP-driven bottom-left constructive packer.
//! Given one ordering and one rotation choice per part (an individual's
//! genes, see [`crate::genetic`]), lays parts onto sheets one at a time and
//! returns both the physical layout and its fitness.

pub mod strategy;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::boolean;
use crate::config::Config;
use crate::nfp::{self, NfpCache};
use crate::point::Point;
use crate::polygon::Polygon;

/// Weight applied to each square unit of unplaced-part area, heavily
/// penalizing any individual that fails to place everything.
const UNPLACED_AREA_WEIGHT: f64 = 1e8;

/// Rings smaller than this (by absolute area) or with fewer than 3 vertices
/// are treated as clipping noise and discarded.
const MIN_USABLE_RING_AREA: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct PlacedPart {
    pub part_index: usize,
    /// The placed shape in sheet coordinates (rotated and translated).
    pub polygon: Polygon,
    /// The same shape rotated but *not* translated — kept so later parts
    /// can request `outer_nfp(local_polygon, candidate)` against the same
    /// (id, rotation) pair the cache is keyed on, then translate the result
    /// by `position - local_polygon.outer()[0]`.
    pub local_polygon: Polygon,
    pub position: Point,
    pub rotation: f64,
}

#[derive(Debug, Clone)]
pub struct SheetPlacement {
    pub sheet_index: usize,
    pub placements: Vec<PlacedPart>,
}

#[derive(Debug, Clone)]
pub struct PlaceResult {
    pub sheets: Vec<SheetPlacement>,
    pub unplaced: Vec<usize>,
    pub fitness: f64,
    /// Set when `cancel` was observed mid-placement; per §7 the partial
    /// result this carries is meant to be discarded by the caller, not
    /// scored.
    pub cancelled: bool,
}

/// Every vertex of every ring of `poly` — outer and holes alike, per §4.5's
/// "candidates ← vertices of every ring of feasible".
fn ring_vertices(poly: &Polygon) -> impl Iterator<Item = Point> + '_ {
    poly.rings().flat_map(|(ring, _)| ring.iter().copied())
}

/// The forbidden region for placing `candidate` alongside everything in
/// `placed`: the union, over each already-placed part `Q`, of `outer_nfp(Q,
/// candidate)` translated to `Q`'s placement — a region strictly larger
/// than `Q` by `candidate`'s own extent, not `Q` itself. Differencing `Q`'s
/// bare geometry instead (as opposed to its outer NFP) under-forbids: a
/// candidate reference-vertex position outside `Q` can still place
/// `candidate`'s body overlapping `Q`, since the NFP locus is defined
/// relative to the *reference vertex*, not `Q`'s boundary (§4.5, §8
/// No-overlap).
fn forbidden_region(placed: &[PlacedPart], candidate: &Polygon, cache: &NfpCache, config: &Config) -> Vec<Polygon> {
    let mut regions = Vec::new();
    for q in placed {
        let offset = q.position - q.local_polygon.outer()[0];
        let outer = nfp::outer_nfp(&q.local_polygon, candidate, false, cache, config);
        regions.extend(outer.regions().iter().map(|r| r.translated(offset.x, offset.y)));
    }
    regions
}

/// Place every part named in `order` (indices into `parts`) onto copies of
/// `sheets`, trying each part's preferred rotation first and, for the very
/// first part laid on a fresh sheet, every configured rotation — there is
/// nothing yet on the sheet for the first part's orientation to be
/// consistent with. `cancel` is checked at the top of the per-part loop
/// (§4.8/§5: "cancellation check... between parts"); on a hit, the worker
/// stops immediately and returns whatever it had placed so far with
/// `cancelled = true`.
pub fn place_parts(
    parts: &[Polygon],
    sheets: &[Polygon],
    order: &[usize],
    rotations: &[f64],
    config: &Config,
    cache: &NfpCache,
    cancel: &AtomicBool,
) -> PlaceResult {
    let mut remaining: Vec<usize> = order.to_vec();
    let mut result_sheets = Vec::new();
    let mut fitness = 0.0;
    let mut cancelled = false;

    'sheets: for (sheet_index, sheet) in sheets.iter().enumerate() {
        if remaining.is_empty() || cancelled {
            break;
        }
        let sheet_area = sheet.bounds().area() as f64;
        fitness += sheet_area;

        let mut placements: Vec<PlacedPart> = Vec::new();
        let mut minarea_accumulator = 0.0;
        let mut still_remaining = Vec::new();

        for (i, &part_idx) in remaining.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                cancelled = true;
                still_remaining.extend(remaining[i..].iter().copied());
                break;
            }

            let part = &parts[part_idx];
            let attempt_angles: Vec<f64> = if placements.is_empty() && config.rotations > 0 {
                config.rotation_angles()
            } else {
                vec![rotations[part_idx]]
            };

            let mut placed_this_part = false;
            for angle in attempt_angles {
                let rotated = match part.rotated(angle) {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                let inner = nfp::inner_nfp(sheet, &rotated, cache, config);
                if inner.is_empty() {
                    continue;
                }

                let candidate_regions: Vec<Polygon> = if placements.is_empty() {
                    inner.regions().to_vec()
                } else {
                    let forbidden = forbidden_region(&placements, &rotated, cache, config);
                    let mut combined = boolean::union_all(&forbidden);
                    if combined.is_empty() {
                        combined = forbidden;
                    }
                    let mut regions = Vec::new();
                    for region in inner.regions() {
                        let mut remainder = vec![region.clone()];
                        for obstacle in &combined {
                            let mut next = Vec::new();
                            for piece in &remainder {
                                next.extend(boolean::difference(piece, obstacle));
                            }
                            remainder = next;
                        }
                        regions.extend(remainder);
                    }
                    regions
                        .into_iter()
                        .filter(|p| p.signed_area().abs() >= MIN_USABLE_RING_AREA && p.outer().len() >= 3)
                        .collect()
                };

                if candidate_regions.is_empty() {
                    continue;
                }

                let reference = rotated.outer()[0];
                let bounds = rotated.bounds();
                let placed_vertices: Vec<Point> = placements
                    .iter()
                    .flat_map(|p| ring_vertices(&p.polygon))
                    .collect();

                let chosen = if placements.is_empty() {
                    // First part on the sheet: the top-leftmost candidate
                    // point, breaking ties by y, matches the original's
                    // `candidatePos.x < minX || (almostEqual && y < minY)`.
                    candidate_regions
                        .iter()
                        .flat_map(ring_vertices)
                        .min_by_key(|p| (p.x, p.y))
                } else {
                    let mut best: Option<(Point, f64)> = None;
                    for region in &candidate_regions {
                        for p in ring_vertices(region) {
                            let score = strategy::score(
                                config.placement_type,
                                p,
                                bounds.width,
                                bounds.height,
                                &placed_vertices,
                            );
                            best = match best {
                                None => Some((p, score)),
                                Some((bp, bs)) => {
                                    let candidate = strategy::Candidate { position: p, score };
                                    let current = strategy::Candidate { position: bp, score: bs };
                                    if candidate.is_better_than(&current) {
                                        Some((p, score))
                                    } else {
                                        Some((bp, bs))
                                    }
                                }
                            };
                        }
                    }
                    best.map(|(p, _)| p)
                };

                let chosen = match chosen {
                    Some(c) => c,
                    None => continue,
                };

                let dx = chosen.x - reference.x;
                let dy = chosen.y - reference.y;
                let final_polygon = rotated.translated(dx, dy);

                minarea_accumulator += (bounds.width as f64) * (bounds.height as f64) / sheet_area;
                placements.push(PlacedPart {
                    part_index: part_idx,
                    polygon: final_polygon,
                    local_polygon: rotated,
                    position: chosen,
                    rotation: angle,
                });
                placed_this_part = true;
                break;
            }

            if !placed_this_part {
                still_remaining.push(part_idx);
            }
        }

        if placements.is_empty() {
            // Nothing fit on a fresh sheet; no further sheet will do better.
            remaining = still_remaining;
            break 'sheets;
        }

        let mut min_x = i64::MAX;
        let mut max_x = i64::MIN;
        for p in &placements {
            let b = p.polygon.bounds();
            min_x = min_x.min(b.x);
            max_x = max_x.max(b.x + b.width);
        }
        let bounds_width = (max_x - min_x) as f64;
        fitness += bounds_width / sheet_area + minarea_accumulator;

        if config.merge_lines {
            fitness -= config.time_ratio * crate::alignment::merged_length(&placements);
        }

        debug!(sheet_index, placed = placements.len(), "sheet filled");
        result_sheets.push(SheetPlacement { sheet_index, placements });
        remaining = still_remaining;
    }

    if !cancelled {
        let total_sheet_area: f64 = sheets.iter().map(|s| s.bounds().area() as f64).sum::<f64>().max(1.0);
        for &idx in &remaining {
            let area = parts[idx].signed_area().abs();
            fitness += UNPLACED_AREA_WEIGHT * (area / total_sheet_area);
        }
        if !remaining.is_empty() {
            info!(unplaced = remaining.len(), "individual left parts unplaced");
        }
    }

    PlaceResult {
        sheets: result_sheets,
        unplaced: remaining,
        fitness,
        cancelled,
    }
}
