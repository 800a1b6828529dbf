//! State enumeration: every valid configuration of a grid.
//!
//! Brute force over the full Cartesian product
//! x ∈ [0, n) × y ∈ [0, n) × c ∈ {0, 1} × T ∈ [0, 2^n) × S ∈ [0, 2^n),
//! keeping what passes [`Configuration::is_valid`]. For the 5×5 grid that is
//! 51,200 candidates and 10,270 survivors.
//!
//! The pass also records the absorbing configurations and locates the starting
//! configuration, so the transition builder and solver never re-derive them.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use crate::error::SolveError;
use crate::types::{Configuration, Grid, StateSpace};

/// Enumerate all valid configurations of `grid`.
///
/// Fails with [`SolveError::StateSpaceEmpty`] when no configuration, no
/// terminal configuration, or not the initial configuration survives the
/// validity filter.
pub fn enumerate_states(grid: &Grid) -> Result<StateSpace, SolveError> {
    let start = Instant::now();
    let n = grid.size;
    let row_sets = 1u16 << n;

    let mut states = BTreeMap::new();
    for x in 0..n {
        for y in 0..n {
            for carrying in [false, true] {
                for target in 0..row_sets {
                    for source in 0..row_sets {
                        let current = Configuration {
                            x: x as u8,
                            y: y as u8,
                            carrying,
                            source: source as u8,
                            target: target as u8,
                        };
                        if current.is_valid(grid) {
                            states.insert(current.key(grid), current);
                        }
                    }
                }
            }
        }
    }

    if states.is_empty() {
        return Err(SolveError::StateSpaceEmpty("no valid configurations"));
    }

    let terminal: Vec<u32> = states
        .iter()
        .filter(|(_, c)| c.is_terminal(grid))
        .map(|(&key, _)| key)
        .collect();
    if terminal.is_empty() {
        return Err(SolveError::StateSpaceEmpty("no terminal configurations"));
    }

    let initial = grid.initial().key(grid);
    if !states.contains_key(&initial) {
        return Err(SolveError::StateSpaceEmpty(
            "initial configuration is not valid",
        ));
    }

    let max_key = states.keys().next_back().copied().unwrap_or(0);

    info!(
        size = n,
        markers = grid.markers,
        states = states.len(),
        terminal = terminal.len(),
        max_key,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "enumerated state space"
    );

    Ok(StateSpace {
        grid: *grid,
        states,
        initial,
        terminal,
        max_key,
    })
}
