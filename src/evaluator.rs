//! Parallel fitness evaluation over a `rayon` thread pool, threading a
//! shared [`Config`] and [`NfpCache`] through every individual and checking
//! a cooperative cancellation flag both between individuals and, inside
//! each individual's placement run, between parts (§4.8/§5/§7) so a
//! long-running generation can still be interrupted promptly.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::config::Config;
use crate::error::NestError;
use crate::genetic::Individual;
use crate::nfp::NfpCache;
use crate::placement::{self, PlaceResult};
use crate::polygon::Polygon;

/// Evaluate every individual in `population` that doesn't already carry a
/// fitness value, in parallel across `rayon`'s global pool. Returns
/// `Err(NestError::Cancelled)` if `cancel` was observed set mid-evaluation;
/// individuals scored before cancellation keep their fitness.
pub fn evaluate_population(
    population: &mut [Individual],
    parts: &[Polygon],
    sheets: &[Polygon],
    config: &Config,
    cache: &NfpCache,
    cancel: &AtomicBool,
) -> Result<(), NestError> {
    let run = || {
        population
            .par_iter_mut()
            .filter(|ind| ind.fitness.is_none())
            .for_each(|ind| {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let result = evaluate_individual(ind, parts, sheets, config, cache, cancel);
                // A partial result from mid-placement cancellation is never
                // scored (§7): leave `fitness`/`result` unset so this
                // individual is picked up again, or simply dropped, on the
                // next call rather than competing on an incomplete layout.
                if !result.cancelled {
                    ind.fitness = Some(result.fitness);
                    ind.result = Some(result);
                }
            });
    };

    // A scoped pool sized by `config.threads`, rather than rayon's ambient
    // global pool — built fresh per generation so `Config` stays the single
    // source of truth rather than a one-time process-global setting.
    match rayon::ThreadPoolBuilder::new().num_threads(config.threads.max(1)).build() {
        Ok(pool) => pool.install(run),
        Err(_) => run(),
    }

    if cancel.load(Ordering::Relaxed) {
        return Err(NestError::Cancelled);
    }
    Ok(())
}

fn evaluate_individual(
    individual: &Individual,
    parts: &[Polygon],
    sheets: &[Polygon],
    config: &Config,
    cache: &NfpCache,
    cancel: &AtomicBool,
) -> PlaceResult {
    placement::place_parts(parts, sheets, &individual.ordering, &individual.rotations, config, cache, cancel)
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
    fn unevaluated_individuals_all_receive_a_fitness() {
        let mut sheet = square(400);
        sheet.is_sheet = true;
        let parts = vec![square(100), square(100)];
        let config = Config::default();
        let cache = NfpCache::new();
        let cancel = AtomicBool::new(false);
        let mut population = vec![
            Individual { ordering: vec![0, 1], rotations: vec![0.0, 0.0], fitness: None, result: None },
            Individual { ordering: vec![1, 0], rotations: vec![0.0, 0.0], fitness: None, result: None },
        ];
        evaluate_population(&mut population, &parts, &[sheet], &config, &cache, &cancel).unwrap();
        assert!(population.iter().all(|i| i.fitness.is_some()));
    }

    #[test]
    fn already_scored_individuals_are_left_untouched() {
        let mut sheet = square(400);
        sheet.is_sheet = true;
        let parts = vec![square(100)];
        let config = Config::default();
        let cache = NfpCache::new();
        let cancel = AtomicBool::new(false);
        let mut population = vec![Individual { ordering: vec![0], rotations: vec![0.0], fitness: Some(42.0), result: None }];
        evaluate_population(&mut population, &parts, &[sheet], &config, &cache, &cancel).unwrap();
        assert_eq!(population[0].fitness, Some(42.0));
    }

    #[test]
    fn cancellation_is_reported() {
        let mut sheet = square(400);
        sheet.is_sheet = true;
        let parts = vec![square(100)];
        let config = Config::default();
        let cache = NfpCache::new();
        let cancel = AtomicBool::new(true);
        let mut population = vec![Individual { ordering: vec![0], rotations: vec![0.0], fitness: None, result: None }];
        let result = evaluate_population(&mut population, &parts, &[sheet], &config, &cache, &cancel);
        assert!(matches!(result, Err(NestError::Cancelled)));
    }
}
