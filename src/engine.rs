//! Engine facade: the only entry point most callers need. Owns the state
//! machine (`Uninitialized -> Initialized -> Running -> Stopped`), quantity
//! expansion, spacing application, and the bounded top-K result list.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::boolean::{self, JoinType};
use crate::config::Config;
use crate::error::{NestError, Result};
use crate::evaluator;
use crate::genetic::GeneticAlgorithm;
use crate::nfp::NfpCache;
use crate::placement::PlaceResult;
use crate::polygon::Polygon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

/// A scored candidate nesting, kept in the engine's top-K list via a
/// sorted-insert-then-truncate update.
#[derive(Debug, Clone)]
pub struct NestingResult {
    pub fitness: f64,
    pub placement: PlaceResult,
}

/// Called after each generation advances, with the run's progress in
/// `[0, 1]` (generation / max_generations; `0.0` when `max_generations`
/// is unbounded). Invoked from whatever thread calls `step()` — the
/// engine does not do its own UI threading; marshaling onto a UI or
/// async runtime thread is the caller's responsibility.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

/// Called whenever a newly evaluated individual beats the current best
/// result.
pub type ResultCallback = Box<dyn Fn(&NestingResult) + Send + Sync>;

pub struct Engine {
    state: EngineState,
    config: Config,
    parts: Vec<Polygon>,
    sheets: Vec<Polygon>,
    cache: NfpCache,
    ga: Option<GeneticAlgorithm>,
    rng: StdRng,
    cancel: AtomicBool,
    results: Vec<NestingResult>,
    generation: u64,
    max_generations: u64,
    progress_cb: Option<ProgressCallback>,
    result_cb: Option<ResultCallback>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Engine {
            state: EngineState::Uninitialized,
            config,
            parts: Vec::new(),
            sheets: Vec::new(),
            cache: NfpCache::new(),
            ga: None,
            rng: StdRng::seed_from_u64(0),
            cancel: AtomicBool::new(false),
            results: Vec::new(),
            generation: 0,
            max_generations: 0,
            progress_cb: None,
            result_cb: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Expand `(part, quantity)` pairs and `(sheet, quantity)` pairs into
    /// dense, spacing-adjusted polygon lists, assign stable ids, and sort
    /// parts descending by area before constructing the GA.
    pub fn initialize(
        &mut self,
        part_defs: &[(Polygon, u32)],
        sheet_defs: &[(Polygon, u32)],
        max_generations: u64,
    ) -> Result<()> {
        let mut parts = Vec::new();
        let mut next_id = 0i64;
        for (source_idx, (part, quantity)) in part_defs.iter().enumerate() {
            let grown = if self.config.spacing.abs() > 1e-9 {
                boolean::offset(part, self.config.spacing / 2.0, JoinType::Miter, self.config.curve_tolerance)
                    .into_iter()
                    .next()
                    .ok_or_else(|| NestError::InvalidPolygon {
                        reason: "spacing offset collapsed part to nothing".to_string(),
                    })?
            } else {
                part.clone()
            };
            for _ in 0..*quantity {
                let mut instance = grown.clone();
                instance.id = next_id;
                instance.source = source_idx as i64;
                next_id += 1;
                parts.push(instance);
            }
        }
        parts.sort_by(|a, b| b.signed_area().abs().partial_cmp(&a.signed_area().abs()).unwrap());

        let mut sheets = Vec::new();
        let mut next_sheet_id = 0i64;
        for (sheet, quantity) in sheet_defs {
            let shrunk = if self.config.spacing.abs() > 1e-9 {
                boolean::offset(sheet, -self.config.spacing / 2.0, JoinType::Miter, self.config.curve_tolerance)
                    .into_iter()
                    .next()
                    .ok_or_else(|| NestError::InvalidPolygon {
                        reason: "spacing offset collapsed sheet to nothing".to_string(),
                    })?
            } else {
                sheet.clone()
            };
            for _ in 0..*quantity {
                let mut instance = shrunk.clone();
                instance.id = next_sheet_id;
                instance.is_sheet = true;
                next_sheet_id += 1;
                sheets.push(instance);
            }
        }

        if parts.is_empty() || sheets.is_empty() {
            return Err(NestError::InvalidPolygon {
                reason: "initialize requires at least one part and one sheet".to_string(),
            });
        }

        let base_ordering: Vec<usize> = (0..parts.len()).collect();
        let ga = GeneticAlgorithm::new(base_ordering, self.config, &mut self.rng);

        self.parts = parts;
        self.sheets = sheets;
        self.ga = Some(ga);
        self.max_generations = max_generations;
        self.generation = 0;
        self.results.clear();
        self.cancel.store(false, Ordering::Relaxed);
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Mark the engine running. `progress_cb` is invoked once per completed
    /// generation with the run's progress in `[0, 1]`; `result_cb` is
    /// invoked whenever a newly evaluated individual beats the current best.
    /// Neither callback does any work itself — `start` only records them.
    pub fn start(&mut self, progress_cb: Option<ProgressCallback>, result_cb: Option<ResultCallback>) -> Result<()> {
        if self.state == EngineState::Uninitialized {
            return Err(NestError::Unconfigured);
        }
        self.progress_cb = progress_cb;
        self.result_cb = result_cb;
        self.cancel.store(false, Ordering::Relaxed);
        self.state = EngineState::Running;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.state = EngineState::Stopped;
    }

    /// Advance the engine by one generation. Returns `Ok(false)` when the
    /// run has naturally completed (max generations reached); the caller is
    /// expected to call `step()` in its own loop — there is no internal
    /// thread here, callers own the scheduling.
    pub fn step(&mut self) -> Result<bool> {
        if self.state != EngineState::Running {
            return Err(NestError::Unconfigured);
        }
        if self.max_generations > 0 && self.generation >= self.max_generations {
            self.state = EngineState::Stopped;
            return Ok(false);
        }

        let ga = self.ga.as_mut().ok_or(NestError::Unconfigured)?;
        if ga.is_generation_complete() && self.generation > 0 {
            ga.generation(&mut self.rng);
        }

        evaluator::evaluate_population(
            ga.population_mut(),
            &self.parts,
            &self.sheets,
            &self.config,
            &self.cache,
            &self.cancel,
        )?;

        for individual in ga.population() {
            if let (Some(fitness), Some(placement)) = (individual.fitness, individual.result.clone()) {
                self.record_result(NestingResult { fitness, placement });
            }
        }

        self.generation += 1;
        info!(generation = self.generation, "generation complete");

        if let Some(progress_cb) = &self.progress_cb {
            let progress = if self.max_generations > 0 {
                (self.generation as f64 / self.max_generations as f64).min(1.0)
            } else {
                0.0
            };
            progress_cb(progress);
        }

        Ok(true)
    }

    /// Insert `result` into the sorted top-K list, invoking `result_cb` if
    /// it became the new best (mirrors the source's `displayCallback`,
    /// fired only when `results[0].fitness` improves).
    fn record_result(&mut self, result: NestingResult) {
        let improved_best = self.results.first().map(|r| result.fitness < r.fitness).unwrap_or(true);
        let pos = self.results.partition_point(|r| r.fitness <= result.fitness);
        self.results.insert(pos, result);
        self.results.truncate(self.config.top_k.max(1));
        if improved_best {
            if let (Some(result_cb), Some(best)) = (&self.result_cb, self.results.first()) {
                result_cb(best);
            }
        }
    }

    pub fn results(&self) -> &[NestingResult] {
        &self.results
    }

    pub fn best(&self) -> Option<&NestingResult> {
        self.results.first()
    }
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
    fn step_before_initialize_is_unconfigured() {
        let mut engine = Engine::new(Config::default());
        assert!(matches!(engine.start(None, None), Err(NestError::Unconfigured)));
    }

    #[test]
    fn full_lifecycle_produces_a_result() {
        let mut config = Config::default();
        config.population_size = 4;
        let mut engine = Engine::new(config);
        engine
            .initialize(&[(square(50), 2)], &[(square(400), 1)], 2)
            .unwrap();
        engine.start(None, None).unwrap();
        while engine.step().unwrap() {}
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(engine.best().is_some());
    }

    #[test]
    fn progress_callback_fires_once_per_generation() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::Arc;

        let mut config = Config::default();
        config.population_size = 4;
        let mut engine = Engine::new(config);
        engine
            .initialize(&[(square(50), 2)], &[(square(400), 1)], 3)
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = calls.clone();
        engine
            .start(
                Some(Box::new(move |_progress: f64| {
                    calls_in_cb.fetch_add(1, Ordering::Relaxed);
                })),
                None,
            )
            .unwrap();
        while engine.step().unwrap() {}
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn result_callback_fires_on_improvement() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::Arc;

        let mut config = Config::default();
        config.population_size = 4;
        let mut engine = Engine::new(config);
        engine
            .initialize(&[(square(50), 2)], &[(square(400), 1)], 2)
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = calls.clone();
        engine
            .start(
                None,
                Some(Box::new(move |_result: &NestingResult| {
                    calls_in_cb.fetch_add(1, Ordering::Relaxed);
                })),
            )
            .unwrap();
        while engine.step().unwrap() {}
        assert!(calls.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn stop_sets_cancellation_flag() {
        let mut config = Config::default();
        config.population_size = 2;
        let mut engine = Engine::new(config);
        engine.initialize(&[(square(50), 1)], &[(square(400), 1)], 0).unwrap();
        engine.start(None, None).unwrap();
        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
    }
}
