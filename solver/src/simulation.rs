//! Monte Carlo walks, used to cross-check the Markov chain expectation.
//!
//! Each walk starts from [`Grid::initial`] and picks one of the legal
//! directions uniformly at random until every seed is delivered. Walks run in
//! parallel, each with its own `SmallRng` seeded `seed + i`, so a batch is
//! reproducible for a fixed seed regardless of thread count.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::transitions::apply_move;
use crate::types::{Grid, Move};

/// Results of a batch of walks.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationResult {
    /// Step counts of the walks that finished, sorted ascending.
    #[serde(skip)]
    pub steps: Vec<u32>,
    pub walks: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Standard error of the mean.
    pub std_error: f64,
    pub min: u32,
    pub max: u32,
    pub median: u32,
    /// Walks abandoned at the step cap.
    pub truncated: usize,
    pub elapsed: Duration,
}

/// Play one walk. Returns the number of steps, or `None` if the walk was still
/// running after `max_steps`.
pub fn simulate_walk(grid: &Grid, rng: &mut SmallRng, max_steps: u32) -> Option<u32> {
    let mut current = grid.initial();
    let mut steps = 0u32;
    let mut options = [Move::Up; 4];

    while !current.is_terminal(grid) {
        if steps >= max_steps {
            return None;
        }

        let (x, y) = (current.x as usize, current.y as usize);
        let mut n = 0;
        for mv in Move::ALL {
            if mv.target(grid.size, x, y).is_some() {
                options[n] = mv;
                n += 1;
            }
        }
        if n == 0 {
            return None;
        }

        let mv = options[rng.random_range(0..n)];
        if let Some(next) = apply_move(grid, &current, mv) {
            current = next;
        }
        steps += 1;
    }

    Some(steps)
}

/// Play `walks` walks in parallel and summarize their lengths.
pub fn simulate_batch(grid: &Grid, walks: usize, seed: u64, max_steps: u32) -> SimulationResult {
    let start = Instant::now();

    let outcomes: Vec<Option<u32>> = (0..walks)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i as u64));
            simulate_walk(grid, &mut rng, max_steps)
        })
        .collect();

    let mut steps: Vec<u32> = outcomes.iter().flatten().copied().collect();
    let truncated = walks - steps.len();
    steps.sort_unstable();

    let finished = steps.len();
    let (mean, std_dev) = if finished == 0 {
        (0.0, 0.0)
    } else {
        let mean = steps.iter().map(|&s| s as f64).sum::<f64>() / finished as f64;
        let variance = steps
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / finished as f64;
        (mean, variance.sqrt())
    };
    let std_error = if finished == 0 {
        0.0
    } else {
        std_dev / (finished as f64).sqrt()
    };

    let result = SimulationResult {
        walks,
        mean,
        std_dev,
        std_error,
        min: steps.first().copied().unwrap_or(0),
        max: steps.last().copied().unwrap_or(0),
        median: steps.get(finished / 2).copied().unwrap_or(0),
        truncated,
        elapsed: start.elapsed(),
        steps,
    };

    info!(
        walks,
        mean = result.mean,
        std_error = result.std_error,
        truncated,
        elapsed_secs = result.elapsed.as_secs_f64(),
        "simulation complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_deterministic_for_seed() {
        let grid = Grid::reference();
        let mut rng1 = SmallRng::seed_from_u64(7);
        let mut rng2 = SmallRng::seed_from_u64(7);
        assert_eq!(
            simulate_walk(&grid, &mut rng1, 1_000_000),
            simulate_walk(&grid, &mut rng2, 1_000_000)
        );
    }

    #[test]
    fn test_walk_respects_step_cap() {
        let grid = Grid::reference();
        let mut rng = SmallRng::seed_from_u64(1);
        // Delivering five seeds takes far more than ten steps.
        assert_eq!(simulate_walk(&grid, &mut rng, 10), None);
    }

    #[test]
    fn test_minimum_walk_length() {
        let grid = Grid::new(3, 1).unwrap();
        let result = simulate_batch(&grid, 2_000, 3, 100_000);
        // One step down to pick up, two steps up to drop.
        assert!(result.min >= 3);
        assert_eq!(result.truncated, 0);
    }

    #[test]
    fn test_batch_mean_near_small_grid_expectation() {
        let grid = Grid::new(3, 3).unwrap();
        let result = simulate_batch(&grid, 20_000, 42, 1_000_000);
        assert_eq!(result.truncated, 0);
        assert_eq!(result.steps.len(), 20_000);
        // Exact expectation is 64.096..., allow six standard errors.
        let tolerance = 6.0 * result.std_error;
        assert!(
            (result.mean - 64.096).abs() < tolerance,
            "mean {} ± {}",
            result.mean,
            tolerance
        );
    }

    #[test]
    fn test_empty_batch() {
        let result = simulate_batch(&Grid::reference(), 0, 0, 10);
        assert_eq!(result.walks, 0);
        assert_eq!(result.mean, 0.0);
        assert_eq!(result.median, 0);
    }
}
