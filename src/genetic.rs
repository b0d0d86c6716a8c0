//! Genetic search over part orderings and rotation choices. Evaluation
//! itself (which needs the NFP cache and is expensive) is split out into
//! [`crate::evaluator`] so this module stays pure population bookkeeping.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::Config;
use crate::placement::PlaceResult;

/// One candidate solution: a permutation of part indices (`ordering`) plus
/// one rotation angle per part (`rotations`, indexed by part index, not by
/// position in `ordering`). `fitness` is `None` until the evaluator scores
/// it — only newly produced individuals need scoring each generation.
/// `result` carries the placement that produced `fitness`, so callers don't
/// re-run the placement worker to see the layout behind a score.
#[derive(Debug, Clone)]
pub struct Individual {
    pub ordering: Vec<usize>,
    pub rotations: Vec<f64>,
    pub fitness: Option<f64>,
    pub result: Option<PlaceResult>,
}

impl Individual {
    fn new(ordering: Vec<usize>, rotations: Vec<f64>) -> Self {
        Individual { ordering, rotations, fitness: None, result: None }
    }
}

pub struct GeneticAlgorithm {
    config: Config,
    population: Vec<Individual>,
}

impl GeneticAlgorithm {
    /// Seed the population with one individual per the descending-area base
    /// ordering passed in by the caller, then fills the rest by mutating
    /// copies of it.
    pub fn new(base_ordering: Vec<usize>, config: Config, rng: &mut impl Rng) -> Self {
        let part_count = base_ordering.len();
        let rotation_choices = config.rotation_angles();
        let base_rotations: Vec<f64> = (0..part_count)
            .map(|_| *rotation_choices.choose(rng).unwrap_or(&0.0))
            .collect();

        let mut population = vec![Individual::new(base_ordering.clone(), base_rotations.clone())];
        while population.len() < config.population_size.max(2) {
            let mut individual = Individual::new(base_ordering.clone(), base_rotations.clone());
            mutate(&mut individual, &rotation_choices, config.mutation_probability(), rng);
            population.push(individual);
        }

        GeneticAlgorithm { config, population }
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut [Individual] {
        &mut self.population
    }

    pub fn best(&self) -> Option<&Individual> {
        self.population
            .iter()
            .filter(|i| i.fitness.is_some())
            .min_by(|a, b| a.fitness.unwrap().partial_cmp(&b.fitness.unwrap()).unwrap())
    }

    pub fn is_generation_complete(&self) -> bool {
        self.population.iter().all(|i| i.fitness.is_some())
    }

    /// Produce the next generation: one elite survivor, the rest bred via
    /// rank-weighted selection, OX1 crossover, and per-slot mutation.
    /// Requires every current individual to be scored.
    pub fn generation(&mut self, rng: &mut impl Rng) {
        let mut scored = self.population.clone();
        scored.sort_by(|a, b| {
            a.fitness
                .unwrap_or(f64::MAX)
                .partial_cmp(&b.fitness.unwrap_or(f64::MAX))
                .unwrap()
        });

        let rotation_choices = self.config.rotation_angles();
        let mut next = Vec::with_capacity(scored.len());
        // 1 elite.
        if let Some(best) = scored.first() {
            next.push(Individual::new(best.ordering.clone(), best.rotations.clone()));
        }

        while next.len() < scored.len() {
            let i = random_weighted_index(scored.len(), rng);
            let j = random_weighted_index(scored.len(), rng);
            let mut child = mate(&scored[i], &scored[j], rng);
            mutate(&mut child, &rotation_choices, self.config.mutation_probability(), rng);
            next.push(child);
        }

        self.population = next;
    }
}

/// OX1-style order-preserving crossover: copy a contiguous slice of parent
/// A's ordering verbatim, then fill the remaining slots with parent B's
/// ordering in its own relative order, skipping anything already copied.
/// Rotations are inherited per-part from whichever parent placed that part
/// first in the child's final ordering.
fn mate(a: &Individual, b: &Individual, rng: &mut impl Rng) -> Individual {
    let n = a.ordering.len();
    if n == 0 {
        return Individual::new(Vec::new(), Vec::new());
    }
    let cut_start = (rng.gen_range(0.0..0.9_f64) * n as f64) as usize;
    let cut_len = ((rng.gen_range(0.1..0.9_f64) * n as f64) as usize).max(1);
    let cut_end = (cut_start + cut_len).min(n);

    let mut child_ordering = vec![None; n];
    for idx in cut_start..cut_end {
        child_ordering[idx] = Some(a.ordering[idx]);
    }
    let taken: std::collections::HashSet<usize> = child_ordering.iter().flatten().copied().collect();

    let mut fill_iter = b.ordering.iter().filter(|v| !taken.contains(v));
    for slot in child_ordering.iter_mut() {
        if slot.is_none() {
            *slot = fill_iter.next().copied();
        }
    }

    let ordering: Vec<usize> = child_ordering.into_iter().flatten().collect();
    let rotations: Vec<usize> = (0..a.rotations.len()).collect();
    let child_rotations = rotations
        .iter()
        .map(|&part_idx| {
            if cut_start <= part_idx && part_idx < cut_end {
                a.rotations[part_idx]
            } else {
                b.rotations[part_idx]
            }
        })
        .collect();

    Individual::new(ordering, child_rotations)
}

/// Per-gene-slot mutation: each ordering slot has `probability` chance of
/// swapping with its successor (a local perturbation, not a full shuffle),
/// and each rotation slot has `probability` chance of being resampled.
fn mutate(individual: &mut Individual, rotation_choices: &[f64], probability: f64, rng: &mut impl Rng) {
    let n = individual.ordering.len();
    for i in 0..n.saturating_sub(1) {
        if rng.gen::<f64>() < probability {
            individual.ordering.swap(i, i + 1);
        }
    }
    for r in individual.rotations.iter_mut() {
        if rng.gen::<f64>() < probability {
            *r = *rotation_choices.choose(rng).unwrap_or(&0.0);
        }
    }
    individual.fitness = None;
    individual.result = None;
}

/// Rank-weighted selection: index `0` (the fittest, since the caller keeps
/// the population sorted ascending by fitness) is the most likely to be
/// drawn, with linearly decaying weight down to the worst individual.
fn random_weighted_index(len: usize, rng: &mut impl Rng) -> usize {
    if len <= 1 {
        return 0;
    }
    let total_weight: f64 = (1..=len).map(|r| r as f64).sum();
    let mut pick = rng.gen::<f64>() * total_weight;
    for rank in 0..len {
        let weight = (len - rank) as f64;
        if pick < weight {
            return rank;
        }
        pick -= weight;
    }
    len - 1
}
