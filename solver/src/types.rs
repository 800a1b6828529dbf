//! Core data structures: grid parameters, configurations, the enumerated state
//! space and the transition table.
//!
//! A configuration C = (x, y, c, S, T) where:
//! - `(x, y)`: the ant's cell, `y = 0` is the target row, `y = n - 1` the source row
//! - `c`: whether the ant carries a seed
//! - `S`: n-bit set, bit i set if a seed still lies at column i of the source row
//! - `T`: n-bit set, bit i set if a seed has been dropped at column i of the target row
//!
//! [`StateSpace`] and [`TransitionTable`] are built once per pipeline run by
//! [`crate::state_space::enumerate_states`] and
//! [`crate::transitions::build_transitions`], then shared read-only by the solver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SolveError;

/// Grid side length and number of seeds to relocate.
///
/// Only [`Grid::new`] checks the bounds (size 3..=8, markers 1..=size). A
/// literal outside them is accepted by the other methods but not meaningful:
/// row sets are `u8`, so sizes above 8 lose columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub size: usize,
    pub markers: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self::reference()
    }
}

impl Grid {
    /// The 5×5 grid with five seeds.
    pub const fn reference() -> Self {
        Self {
            size: GRID_SIZE,
            markers: MARKER_COUNT,
        }
    }

    pub fn new(size: usize, markers: usize) -> Result<Self, SolveError> {
        let invalid = |reason| SolveError::InvalidGrid {
            size,
            markers,
            reason,
        };
        if size < MIN_GRID_SIZE {
            return Err(invalid("size must be at least 3"));
        }
        if size > MAX_GRID_SIZE {
            return Err(invalid("size must be at most 8"));
        }
        if markers == 0 || markers > size {
            return Err(invalid("markers must be between 1 and size"));
        }
        Ok(Self { size, markers })
    }

    /// Row the seeds start in.
    #[inline(always)]
    pub fn source_row(&self) -> usize {
        self.size - 1
    }

    /// Occupancy set with every column of a row set.
    #[inline(always)]
    pub fn full_row(&self) -> u8 {
        ((1u16 << self.size) - 1) as u8
    }

    /// Number of addressable keys, i.e. the largest packed key plus one.
    pub fn key_space(&self) -> usize {
        let n = self.size;
        let full = self.full_row();
        state_key(n, n - 1, n - 1, true, full, full) as usize + 1
    }

    /// Ant in the center cell, empty-handed, seeds on the low `markers` columns
    /// of the source row, nothing delivered.
    pub fn initial(&self) -> Configuration {
        Configuration {
            x: (self.size / 2) as u8,
            y: (self.size / 2) as u8,
            carrying: false,
            source: ((1u16 << self.markers) - 1) as u8,
            target: 0,
        }
    }
}

/// One ant step. Moves off the grid are not candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Candidate order used when building transition rows.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Destination cell, or `None` when the move would leave the grid.
    #[inline(always)]
    pub fn target(self, size: usize, x: usize, y: usize) -> Option<(usize, usize)> {
        match self {
            Move::Up if y > 0 => Some((x, y - 1)),
            Move::Down if y + 1 < size => Some((x, y + 1)),
            Move::Left if x > 0 => Some((x - 1, y)),
            Move::Right if x + 1 < size => Some((x + 1, y)),
            _ => None,
        }
    }
}

/// A single state of the Markov chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub x: u8,
    pub y: u8,
    pub carrying: bool,
    /// Seeds still in the source row, bit i = column i.
    pub source: u8,
    /// Seeds delivered to the target row, bit i = column i.
    pub target: u8,
}

impl Configuration {
    /// Seeds in the source row, in the target row, and in the ant's grip.
    #[inline(always)]
    pub fn seed_count(&self) -> usize {
        (self.source.count_ones() + self.target.count_ones()) as usize + self.carrying as usize
    }

    /// Every seed delivered and none in transit.
    #[inline(always)]
    pub fn is_terminal(&self, grid: &Grid) -> bool {
        self.target.count_ones() as usize == grid.markers && !self.carrying
    }

    pub fn is_valid(&self, grid: &Grid) -> bool {
        let (x, y) = (self.x as usize, self.y as usize);
        let full = grid.full_row();
        if x >= grid.size || y >= grid.size || self.source & !full != 0 || self.target & !full != 0
        {
            return false;
        }

        // Carrying in the target row only happens above an already-filled cell;
        // an empty one would have taken the seed.
        if y == TARGET_ROW && self.carrying && !is_column_set(self.target, x) {
            return false;
        }

        // Standing empty-handed on a seeded source cell is impossible: it would
        // have been picked up on arrival.
        if y == grid.source_row() && !self.carrying && is_column_set(self.source, x) {
            return false;
        }

        // The walk ends on the drop, so a finished ant is in the target row.
        if self.is_terminal(grid) && y != TARGET_ROW {
            return false;
        }

        self.seed_count() == grid.markers
    }

    #[inline(always)]
    pub fn key(&self, grid: &Grid) -> u32 {
        state_key(
            grid.size,
            self.x as usize,
            self.y as usize,
            self.carrying,
            self.source,
            self.target,
        )
    }

    /// Inverse of [`Configuration::key`] for keys below [`Grid::key_space`].
    pub fn from_key(grid: &Grid, key: u32) -> Self {
        let (x, y, carrying, source, target) = unpack_key(grid.size, key);
        Self {
            x: x as u8,
            y: y as u8,
            carrying,
            source,
            target,
        }
    }

    /// Directions that stay on the grid, in [`Move::ALL`] order.
    pub fn legal_moves(&self, grid: &Grid) -> Vec<Move> {
        Move::ALL
            .into_iter()
            .filter(|m| m.target(grid.size, self.x as usize, self.y as usize).is_some())
            .collect()
    }
}

/// Every valid configuration of one grid, keyed by packed key.
#[derive(Debug, Clone)]
pub struct StateSpace {
    pub grid: Grid,
    pub states: BTreeMap<u32, Configuration>,
    /// Key of the starting configuration.
    pub initial: u32,
    /// Keys of the absorbing configurations, ascending.
    pub terminal: Vec<u32>,
    /// Largest key present in `states`.
    pub max_key: u32,
}

impl StateSpace {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, key: u32) -> Option<&Configuration> {
        self.states.get(&key)
    }

    /// Length of a dense vector indexable by any key in the space.
    pub fn dense_len(&self) -> usize {
        self.max_key as usize + 1
    }
}

/// Transition multisets in sparse CSR (Compressed Sparse Row) storage.
///
/// Row `i` describes the non-terminal configuration `sources[i]`; its possible
/// successors are `targets[row_start[i]..row_start[i+1]]`, one entry per legal
/// move in [`Move::ALL`] order. Duplicate entries are kept: each entry carries
/// probability `1 / out_degree`. Rows are sorted by source key.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    pub sources: Vec<u32>,
    pub row_start: Vec<u32>,
    pub targets: Vec<u32>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionTable {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            row_start: vec![0],
            targets: Vec::new(),
        }
    }

    /// Append a row. Callers push sources in ascending key order.
    pub fn push_row(&mut self, source: u32, successors: &[u32]) {
        debug_assert!(self.sources.last().map_or(true, |&last| last < source));
        self.sources.push(source);
        self.targets.extend_from_slice(successors);
        self.row_start.push(self.targets.len() as u32);
    }

    /// Number of rows (non-terminal configurations).
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Successor multiset of row `i`.
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[u32] {
        let start = self.row_start[i] as usize;
        let end = self.row_start[i + 1] as usize;
        &self.targets[start..end]
    }

    /// Successor multiset of configuration `key`, if it has a row.
    pub fn successors(&self, key: u32) -> Option<&[u32]> {
        self.sources
            .binary_search(&key)
            .ok()
            .map(|i| self.row(i))
    }

    /// `(source, successors)` rows in ascending source order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> + '_ {
        self.sources
            .iter()
            .enumerate()
            .map(move |(i, &source)| (source, self.row(i)))
    }
}
