//! Redundant worker runs and their reduction.
//!
//! Each worker runs the whole enumerate → build → solve pipeline on its own
//! data; nothing is shared while solving. The solve is deterministic, so the
//! workers agree to the last bit and the average equals any single result.
//! The fan-out exists to reproduce the reference report (worker count plus
//! averaged figures); a single worker is sufficient for the number itself.
//!
//! Reduction (join-then-reduce, no shared accumulators):
//! - `expected_steps = round6(Σ expected_steps / successes)`
//! - `steps_to_converge = Σ steps_to_converge / successes` (integer division)
//!
//! Model defects ([`SolveError::is_defect`]) from any worker fail the run.
//! Workers that hit [`SolveError::NonConvergence`] are left out of the average
//! and counted in [`AggregateReport::failed_workers`].

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SolveError;
use crate::expectation::{round6, run_pipeline, ExpectationResult, SolverConfig};
use crate::types::Grid;

/// Averaged result over all successful workers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub grid: Grid,
    /// Workers started.
    pub workers: usize,
    /// Workers excluded from the average because they did not converge.
    pub failed_workers: usize,
    /// Mean expected step count, rounded to 6 decimals.
    pub expected_steps: f64,
    /// Mean convergence step, integer division.
    pub steps_to_converge: u64,
    pub solver: SolverConfig,
    pub elapsed_secs: f64,
}

/// Run the pipeline `workers` times on a dedicated rayon pool of that size.
pub fn run_workers(
    grid: &Grid,
    config: &SolverConfig,
    workers: usize,
) -> Result<AggregateReport, SolveError> {
    if workers == 0 {
        return Err(SolveError::InvalidWorkerCount);
    }
    let start = Instant::now();

    let run_all = || -> Vec<Result<ExpectationResult, SolveError>> {
        (0..workers)
            .into_par_iter()
            .map(|worker| {
                debug!(worker, "worker started");
                let outcome = run_pipeline(grid, config);
                if let Err(e) = &outcome {
                    warn!(worker, error = %e, "worker failed");
                }
                outcome
            })
            .collect()
    };

    let outcomes = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(run_all),
        Err(e) => {
            warn!(error = %e, "could not build worker pool, using the global pool");
            run_all()
        }
    };

    let mut report = reduce_outcomes(grid, config, outcomes)?;
    report.elapsed_secs = start.elapsed().as_secs_f64();

    info!(
        workers = report.workers,
        failed = report.failed_workers,
        expected_steps = report.expected_steps,
        steps_to_converge = report.steps_to_converge,
        elapsed_secs = report.elapsed_secs,
        "aggregation complete"
    );
    Ok(report)
}

/// Combine per-worker outcomes into one report.
///
/// Returns the first defect if any worker reported one; otherwise averages
/// the successes. With no successes at all, the first error is returned.
pub fn reduce_outcomes(
    grid: &Grid,
    config: &SolverConfig,
    outcomes: Vec<Result<ExpectationResult, SolveError>>,
) -> Result<AggregateReport, SolveError> {
    if outcomes.is_empty() {
        return Err(SolveError::InvalidWorkerCount);
    }
    let workers = outcomes.len();

    let mut successes = Vec::with_capacity(workers);
    let mut first_failure = None;
    for outcome in outcomes {
        match outcome {
            Ok(result) => successes.push(result),
            Err(e) if e.is_defect() => return Err(e),
            Err(e) => {
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    if successes.is_empty() {
        return Err(first_failure.unwrap_or(SolveError::InvalidWorkerCount));
    }

    let count = successes.len();
    let total_expected: f64 = successes.iter().map(|r| r.expected_steps).sum();
    let total_steps: u64 = successes.iter().map(|r| r.steps_to_converge as u64).sum();

    Ok(AggregateReport {
        grid: *grid,
        workers,
        failed_workers: workers - count,
        expected_steps: round6(total_expected / count as f64),
        steps_to_converge: total_steps / count as u64,
        solver: config.clone(),
        elapsed_secs: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(expected_steps: f64, steps_to_converge: u32) -> ExpectationResult {
        ExpectationResult {
            expected_steps,
            steps_to_converge,
            absorbed_mass: 1.0,
            trace: Vec::new(),
        }
    }

    fn non_convergence() -> SolveError {
        SolveError::NonConvergence {
            max_steps: 10,
            expected_steps: 3.0,
        }
    }

    #[test]
    fn test_reduce_averages_and_rounds() {
        let grid = Grid::reference();
        let report = reduce_outcomes(
            &grid,
            &SolverConfig::default(),
            vec![Ok(result(10.0000004, 7)), Ok(result(10.0000012, 8))],
        )
        .unwrap();
        assert_eq!(report.workers, 2);
        assert_eq!(report.failed_workers, 0);
        assert_eq!(report.expected_steps, 10.000001);
        assert_eq!(report.steps_to_converge, 7);
    }

    #[test]
    fn test_reduce_excludes_non_converged_workers() {
        let grid = Grid::reference();
        let report = reduce_outcomes(
            &grid,
            &SolverConfig::default(),
            vec![Ok(result(5.0, 100)), Err(non_convergence()), Ok(result(7.0, 101))],
        )
        .unwrap();
        assert_eq!(report.workers, 3);
        assert_eq!(report.failed_workers, 1);
        assert_eq!(report.expected_steps, 6.0);
        assert_eq!(report.steps_to_converge, 100);
    }

    #[test]
    fn test_reduce_fails_on_defect() {
        let grid = Grid::reference();
        let err = reduce_outcomes(
            &grid,
            &SolverConfig::default(),
            vec![Ok(result(5.0, 100)), Err(SolveError::NoTransitions { key: 3 })],
        )
        .unwrap_err();
        assert!(matches!(err, SolveError::NoTransitions { key: 3 }));
    }

    #[test]
    fn test_reduce_all_failed() {
        let grid = Grid::reference();
        let err = reduce_outcomes(
            &grid,
            &SolverConfig::default(),
            vec![Err(non_convergence()), Err(non_convergence())],
        )
        .unwrap_err();
        assert!(matches!(err, SolveError::NonConvergence { .. }));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = run_workers(&Grid::reference(), &SolverConfig::default(), 0).unwrap_err();
        assert!(matches!(err, SolveError::InvalidWorkerCount));
    }

    #[test]
    fn test_workers_agree_on_small_grid() {
        let grid = Grid::new(3, 3).unwrap();
        let config = SolverConfig::default();
        let single = run_pipeline(&grid, &config).unwrap();
        let report = run_workers(&grid, &config, 3).unwrap();
        assert_eq!(report.failed_workers, 0);
        assert_eq!(report.expected_steps, round6(single.expected_steps));
        assert_eq!(report.steps_to_converge, single.steps_to_converge as u64);
    }
}
