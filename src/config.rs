use serde::{Deserialize, Serialize};

/// Placement objective selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementType {
    Gravity,
    Box,
    ConvexHull,
}

impl Default for PlacementType {
    fn default() -> Self {
        PlacementType::Gravity
    }
}

/// Immutable engine configuration, built once at `initialize` and shared by
/// value into every component (GA, worker, evaluator, engine facade) — there
/// is no global/module-level config singleton to keep in sync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Config {
    /// Minimum inter-part gap, in the same real-valued units as polygons.
    pub spacing: f64,
    /// Passed to offset/simplification when clients use the boolean engine
    /// directly (e.g. to clean traced curves before ingest).
    pub curve_tolerance: f64,
    /// Number of permitted rotations. Permitted angles are
    /// `{ k * 360 / rotations : 0 <= k < rotations }`. `0` disables rotation.
    pub rotations: u32,
    /// GA population size, minimum 2.
    pub population_size: usize,
    /// Percent chance (0..100) per gene slot of mutating.
    pub mutation_rate: u8,
    /// Worker pool size for the parallel evaluator.
    pub threads: usize,
    /// Placement objective.
    pub placement_type: PlacementType,
    /// Enable the edge-alignment bonus: placements whose edges run flush
    /// against already-placed neighbors score better, modeling the benefit
    /// of shared-kerf cutting.
    pub merge_lines: bool,
    /// Weight of the alignment bonus in the fitness sum.
    pub time_ratio: f64,
    /// Allowed numerical slack when judging touching-not-overlapping.
    pub overlap_tolerance: f64,
    /// Number of top results the engine retains.
    pub top_k: usize,
    /// Overrides for the NFP degeneracy gate; `None` uses the
    /// empirically-calibrated defaults in [`crate::nfp::degenerate`].
    pub degeneracy_overrides: DegeneracyOverrides,
}

/// Parameterized thresholds for the pre-convolution degeneracy gate. Left as
/// an explicit struct rather than bare constants so callers can tune them
/// per material/tolerance without forking the crate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DegeneracyOverrides {
    pub min_doubled_area: Option<f64>,
    pub min_bbox_thinness: Option<f64>,
    pub max_collinear_fraction: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            spacing: 0.0,
            curve_tolerance: 0.3,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            threads: 1,
            placement_type: PlacementType::Gravity,
            merge_lines: false,
            time_ratio: 0.0,
            overlap_tolerance: 1e-9,
            top_k: 10,
            degeneracy_overrides: DegeneracyOverrides::default(),
        }
    }
}

impl Config {
    /// Permitted rotation angles in degrees, derived from `rotations`.
    pub fn rotation_angles(&self) -> Vec<f64> {
        if self.rotations == 0 {
            return vec![0.0];
        }
        (0..self.rotations)
            .map(|k| k as f64 * 360.0 / self.rotations as f64)
            .collect()
    }

    pub fn mutation_probability(&self) -> f64 {
        self.mutation_rate as f64 * 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_angles_cover_full_circle() {
        let cfg = Config {
            rotations: 4,
            ..Config::default()
        };
        assert_eq!(cfg.rotation_angles(), vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn zero_rotations_disables_rotation() {
        let cfg = Config {
            rotations: 0,
            ..Config::default()
        };
        assert_eq!(cfg.rotation_angles(), vec![0.0]);
    }
}
