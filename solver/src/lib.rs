//! # Antwalk — expected steps of the seed-carrying ant
//!
//! An ant starts in the center of an n×n grid (5×5 in the reference problem).
//! Each seed starts in a cell of the bottom row. At every step the ant moves
//! to a uniformly random neighbouring cell. Stepping empty-handed onto a seeded
//! bottom cell picks the seed up. Stepping onto an empty top cell while carrying
//! drops it. The walk ends when every seed lies in the top row. This crate
//! computes the expected number of steps.
//!
//! ## Algorithm overview
//!
//! The walk is an absorbing Markov chain over an explicitly enumerated state
//! space. The expectation is found by pushing the probability distribution
//! forward step by step, not by solving the linear system.
//!
//! | Phase | Rust module | Description |
//! |-------|-------------|-------------|
//! | 0 | [`state_space`] | Enumerate all valid configurations (10,270 for 5×5), locate start and terminal states |
//! | 1 | [`transitions`] | Successor multiset per non-terminal configuration, CSR layout |
//! | 2 | [`expectation`] | Forward propagation, E = Σ t·P(absorbed at t), convergence detection |
//! | 3 | [`aggregate`] | Optional redundant worker runs and their reduction |
//!
//! [`simulation`] plays the walk directly as a Monte Carlo cross-check.
//!
//! ## State representation
//!
//! A configuration C = (x, y, c, S, T): the ant's cell, the carry flag and two
//! n-bit row occupancy sets. Key: `((((c << n | T) << n | S) * n + x) * n + y`,
//! below 51,200 for n = 5, so distributions are dense `Vec<f64>` indexed by key.
//!
//! ## Numerics
//!
//! - f64 throughout, no renormalization between steps.
//! - Each step's contribution `t·P` is rounded to 6 decimals before it is added
//!   (switchable), which leaves the 5×5 result at 430.088222 against an exact
//!   value of about 430.088247.

pub mod aggregate;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod expectation;
pub mod report;
pub mod simulation;
pub mod state_space;
pub mod transitions;
pub mod types;

pub use error::SolveError;
