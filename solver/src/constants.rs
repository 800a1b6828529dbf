//! Problem constants and the configuration-key packing.
//!
//! Maps the problem statement to concrete values:
//! - grid side length = [`GRID_SIZE`] = 5
//! - number of seeds to relocate = [`MARKER_COUNT`] = 5
//! - source row (seeds start here) = `size - 1`, target row = [`TARGET_ROW`] = 0
//! - KEY(x, y, c, S, T) = [`state_key`]`(..)` = `((((c << n | T) << n | S) * n + x) * n + y`
//!
//! With n = 5 the key occupies 17 bits (`ctttttsssss` times 25 plus the position),
//! so every key of the reference instance is below 51,200 and can index a dense
//! `Vec<f64>` directly.

/// Side length of the reference grid.
pub const GRID_SIZE: usize = 5;

/// Seeds to relocate in the reference instance (one per source-row column).
pub const MARKER_COUNT: usize = 5;

/// Smallest supported grid: the start cell must lie strictly between the two edge rows.
pub const MIN_GRID_SIZE: usize = 3;

/// Largest supported grid. The key space grows as `2^(2n+1) * n^2`
/// (8.4M slots at n = 8, ~67 MB of f64 per distribution buffer).
pub const MAX_GRID_SIZE: usize = 8;

/// Row the seeds are delivered to.
pub const TARGET_ROW: usize = 0;

/// Default iteration budget for the expectation solver. The reference instance
/// converges at step 1892 under the consecutive rule and at step 1713 under the
/// cumulative rule.
pub const DEFAULT_MAX_STEPS: u32 = 10_000;

/// A per-step contribution below this counts towards convergence.
pub const CONVERGENCE_EPSILON: f64 = 1e-6;

/// Consecutive sub-epsilon steps required before the solver stops.
pub const CONVERGENCE_WINDOW: u32 = 10;

/// Decimal places kept when rounding per-step contributions and final results.
pub const RESULT_DECIMALS: u32 = 6;

/// Pack a configuration into its dense key.
///
/// Layout for side length `n`: the carry flag, then the `n`-bit target-row set,
/// then the `n`-bit source-row set, then the position in mixed radix `n`.
/// Injective for `x, y < n` and row sets below `2^n`.
#[inline(always)]
pub fn state_key(n: usize, x: usize, y: usize, carrying: bool, source: u8, target: u8) -> u32 {
    let mut key = carrying as u32;
    key = (key << n) | target as u32;
    key = (key << n) | source as u32;
    key = key * n as u32 + x as u32;
    key * n as u32 + y as u32
}

/// Inverse of [`state_key`]: `(x, y, carrying, source, target)`.
#[inline(always)]
pub fn unpack_key(n: usize, key: u32) -> (usize, usize, bool, u8, u8) {
    let side = n as u32;
    let row_mask = (1u32 << n) - 1;
    let y = key % side;
    let rest = key / side;
    let x = rest % side;
    let bits = rest / side;
    let source = bits & row_mask;
    let target = (bits >> n) & row_mask;
    let carrying = (bits >> (2 * n)) & 1 == 1;
    (x as usize, y as usize, carrying, source as u8, target as u8)
}

/// Test whether column `col` is set in a row occupancy set.
#[inline(always)]
pub fn is_column_set(row: u8, col: usize) -> bool {
    (row & (1 << col)) != 0
}
