//! Transition graph: one-step successors of every non-terminal configuration.
//!
//! For a configuration C, each legal direction (up, down, left, right; moves
//! off the grid are dropped) moves the ant one cell and then applies at most
//! one side effect at the destination:
//! - **drop**: carrying, in the target row, on an empty target cell
//! - **pickup**: empty-handed, in the source row, on a seeded source cell
//!
//! The two conditions cannot both hold for the same destination (the rows
//! differ), so the order they are checked in does not matter. Each direction
//! contributes one successor; coinciding successors are kept as separate
//! entries because every direction is chosen with probability 1/d.

use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::constants::*;
use crate::error::SolveError;
use crate::types::{Configuration, Grid, Move, StateSpace, TransitionTable};

/// Move the ant one cell in direction `mv` and apply the pickup/drop rule.
/// Returns `None` when the move leaves the grid.
pub fn apply_move(grid: &Grid, current: &Configuration, mv: Move) -> Option<Configuration> {
    let (x, y) = mv.target(grid.size, current.x as usize, current.y as usize)?;
    let mut next = Configuration {
        x: x as u8,
        y: y as u8,
        ..*current
    };

    if next.carrying && y == TARGET_ROW && !is_column_set(next.target, x) {
        next.carrying = false;
        next.target |= 1 << x;
    } else if !next.carrying && y == grid.source_row() && is_column_set(next.source, x) {
        next.carrying = true;
        next.source &= !(1 << x);
    }

    Some(next)
}

/// Successor keys of `current`, one per legal move in [`Move::ALL`] order.
pub fn successors(grid: &Grid, current: &Configuration) -> Vec<u32> {
    Move::ALL
        .into_iter()
        .filter_map(|mv| apply_move(grid, current, mv))
        .map(|next| {
            debug_assert!(
                next.is_valid(grid),
                "transition {:?} -> {:?} leaves the state space",
                current,
                next
            );
            next.key(grid)
        })
        .collect()
}

/// Build the CSR transition table for every non-terminal configuration.
///
/// Rows are computed in parallel and stored in ascending source-key order.
/// Terminal configurations get no row: they absorb.
pub fn build_transitions(space: &StateSpace) -> Result<TransitionTable, SolveError> {
    let start = Instant::now();
    let grid = &space.grid;

    let open: Vec<(u32, &Configuration)> = space
        .states
        .iter()
        .filter(|(_, c)| !c.is_terminal(grid))
        .map(|(&key, c)| (key, c))
        .collect();

    let rows: Vec<(u32, Vec<u32>)> = open
        .par_iter()
        .map(|&(key, current)| {
            let succ = successors(grid, current);
            if succ.is_empty() {
                Err(SolveError::NoTransitions { key })
            } else {
                Ok((key, succ))
            }
        })
        .collect::<Result<_, _>>()?;

    let mut table = TransitionTable::new();
    for (key, succ) in &rows {
        table.push_row(*key, succ);
    }

    info!(
        rows = table.len(),
        entries = table.targets.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "built transition table"
    );

    Ok(table)
}
