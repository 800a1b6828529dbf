//! Error taxonomy for the enumerate → build → solve pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the pipeline and its report writers.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Grid parameters outside the supported range.
    #[error("invalid grid: size {size}, markers {markers} ({reason})")]
    InvalidGrid {
        size: usize,
        markers: usize,
        reason: &'static str,
    },

    /// Solver settings that cannot produce a meaningful stopping point.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(&'static str),

    /// Aggregation was asked to run zero workers.
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    /// Enumeration produced no valid, no terminal, or no initial configuration.
    #[error("state space is empty: {0}")]
    StateSpaceEmpty(&'static str),

    /// A non-terminal configuration has no legal move.
    #[error("configuration {key} is non-terminal but has no outgoing moves")]
    NoTransitions { key: u32 },

    /// The fixed-point iteration ran out of steps before converging.
    #[error("no convergence within {max_steps} steps (expectation so far {expected_steps:.6})")]
    NonConvergence { max_steps: u32, expected_steps: f64 },

    /// A report artifact could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization of a report artifact failed.
    #[error("failed to serialize {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SolveError {
    /// Whether the error reflects a defect in the model rather than a budget or I/O problem.
    /// Defects abort aggregation; everything else is reported per worker.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            SolveError::InvalidGrid { .. }
                | SolveError::InvalidConfig(_)
                | SolveError::StateSpaceEmpty(_)
                | SolveError::NoTransitions { .. }
        )
    }
}
