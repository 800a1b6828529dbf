//! Expected steps to absorption by forward probability propagation.
//!
//! Starting from the initial configuration with probability 1.0, push the
//! distribution one step at a time through the [`TransitionTable`]:
//!
//! ```text
//! next[m] += dist[k] / d(k)     for every non-terminal k and every entry m of row k
//! ```
//!
//! Terminal keys have no row, so mass that lands on them is observed for
//! exactly one step (the step it is absorbed) and then leaves circulation.
//! The expectation accumulates
//!
//! ```text
//! E = Σ_t  t · P(absorbed at step t)
//! ```
//!
//! with each term optionally rounded to 6 decimals before it is added. The
//! rounding is applied per term and never to the running total, so rounding
//! error compounds; this matches the reference results and is kept.
//!
//! Iteration stops once `window` steps with `E > 1` and a term below `epsilon`
//! have been seen ([`ConvergenceRule`]), or fails with
//! [`SolveError::NonConvergence`] after `max_steps`.
//!
//! Sources are swept in ascending key order and terminal mass is summed in
//! ascending key order, so the result is bit-for-bit reproducible.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::*;
use crate::error::SolveError;
use crate::state_space::enumerate_states;
use crate::transitions::build_transitions;
use crate::types::{Grid, StateSpace, TransitionTable};

/// How sub-epsilon steps are counted towards the convergence window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceRule {
    /// The window must be filled without interruption; a larger term resets it.
    #[default]
    Consecutive,
    /// Every qualifying step counts, interrupted or not.
    Cumulative,
}

/// Iteration budget and stopping criterion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_steps: u32,
    pub epsilon: f64,
    pub convergence_window: u32,
    pub convergence_rule: ConvergenceRule,
    /// Round each step's contribution to 6 decimals before accumulating it.
    pub round_contributions: bool,
    /// Keep a [`TraceEntry`] per step in the result.
    pub record_trace: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            epsilon: CONVERGENCE_EPSILON,
            convergence_window: CONVERGENCE_WINDOW,
            convergence_rule: ConvergenceRule::Consecutive,
            round_contributions: true,
            record_trace: false,
        }
    }
}

impl SolverConfig {
    /// Reject settings under which the stopping criterion cannot mean convergence.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.convergence_window == 0 {
            return Err(SolveError::InvalidConfig(
                "convergence window must be at least 1",
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(SolveError::InvalidConfig(
                "epsilon must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// Per-step diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub step: u32,
    /// Probability absorbed at exactly this step.
    pub absorbed: f64,
    /// Term added to the expectation (`step * absorbed`, possibly rounded).
    pub contribution: f64,
    /// Running expectation after this step.
    pub expected_steps: f64,
    /// Probability still on non-terminal configurations.
    pub in_circulation: f64,
}

/// Outcome of one solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub expected_steps: f64,
    /// Step at which the convergence window was filled.
    pub steps_to_converge: u32,
    /// Total probability absorbed up to convergence (≤ 1).
    pub absorbed_mass: f64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trace: Vec<TraceEntry>,
}

/// Round half away from zero to `decimals` places.
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// [`round_to`] with 6 decimals.
#[inline]
pub fn round6(value: f64) -> f64 {
    round_to(value, RESULT_DECIMALS)
}

/// One-step transition operator over a dense, key-indexed distribution.
///
/// Uses ping-pong buffers: `advance` writes into the spare buffer and swaps.
pub struct Propagator<'a> {
    space: &'a StateSpace,
    table: &'a TransitionTable,
    current: Vec<f64>,
    next: Vec<f64>,
    step: u32,
}

impl<'a> Propagator<'a> {
    /// All mass on the initial configuration, step 0.
    pub fn new(space: &'a StateSpace, table: &'a TransitionTable) -> Self {
        let len = space.dense_len();
        let mut current = vec![0.0f64; len];
        current[space.initial as usize] = 1.0;
        Self {
            space,
            table,
            current,
            next: vec![0.0f64; len],
            step: 0,
        }
    }

    /// Steps taken so far.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Current distribution, indexed by configuration key. Terminal entries
    /// hold the mass absorbed at the latest step only.
    pub fn distribution(&self) -> &[f64] {
        &self.current
    }

    /// Total mass on non-terminal configurations.
    pub fn mass_in_circulation(&self) -> f64 {
        self.table
            .sources
            .iter()
            .map(|&k| self.current[k as usize])
            .sum()
    }

    /// Total mass on terminal configurations, i.e. absorbed at the latest step.
    pub fn terminal_mass(&self) -> f64 {
        self.space
            .terminal
            .iter()
            .map(|&k| self.current[k as usize])
            .sum()
    }

    /// Apply the transition operator once and return the newly absorbed mass.
    pub fn advance(&mut self) -> f64 {
        self.next.fill(0.0);

        for (i, &source) in self.table.sources.iter().enumerate() {
            let mass = self.current[source as usize];
            if mass == 0.0 {
                continue;
            }
            let row = self.table.row(i);
            let share = (1.0 / row.len() as f64) * mass;
            for &dest in row {
                self.next[dest as usize] += share;
            }
        }

        std::mem::swap(&mut self.current, &mut self.next);
        self.step += 1;
        self.terminal_mass()
    }
}

/// Iterate until convergence and return the expected number of steps.
pub fn solve_expected_steps(
    space: &StateSpace,
    table: &TransitionTable,
    config: &SolverConfig,
) -> Result<ExpectationResult, SolveError> {
    config.validate()?;
    let start = Instant::now();
    let mut propagator = Propagator::new(space, table);

    let mut expected_steps = 0.0f64;
    let mut absorbed_mass = 0.0f64;
    let mut qualifying = 0u32;
    let mut trace = Vec::new();

    while propagator.step() < config.max_steps {
        let absorbed = propagator.advance();
        let step = propagator.step();

        let mut contribution = absorbed * step as f64;
        if config.round_contributions {
            contribution = round6(contribution);
        }
        expected_steps += contribution;
        absorbed_mass += absorbed;

        if expected_steps > 1.0 && contribution < config.epsilon {
            qualifying += 1;
        } else if config.convergence_rule == ConvergenceRule::Consecutive {
            qualifying = 0;
        }

        if config.record_trace {
            trace.push(TraceEntry {
                step,
                absorbed,
                contribution,
                expected_steps,
                in_circulation: propagator.mass_in_circulation(),
            });
        }

        if step % 500 == 0 {
            debug!(step, expected_steps, absorbed_mass, "propagating");
        }

        if qualifying >= config.convergence_window {
            info!(
                steps = step,
                expected_steps,
                absorbed_mass,
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "expectation converged"
            );
            return Ok(ExpectationResult {
                expected_steps,
                steps_to_converge: step,
                absorbed_mass,
                trace,
            });
        }
    }

    Err(SolveError::NonConvergence {
        max_steps: config.max_steps,
        expected_steps,
    })
}

/// Enumerate, build transitions and solve for one grid. Nothing is shared
/// between calls.
pub fn run_pipeline(grid: &Grid, config: &SolverConfig) -> Result<ExpectationResult, SolveError> {
    config.validate()?;
    let space = enumerate_states(grid)?;
    let table = build_transitions(&space)?;
    solve_expected_steps(&space, &table, config)
}
