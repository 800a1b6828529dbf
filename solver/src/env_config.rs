//! Environment configuration shared by the binaries.
//!
//! `ANTWALK_WORKERS` (fallback `RAYON_NUM_THREADS`, then the machine's
//! available parallelism) and `ANTWALK_MAX_STEPS`. Command-line flags take
//! precedence over both.

use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_MAX_STEPS;

/// Worker count: `ANTWALK_WORKERS`, else `RAYON_NUM_THREADS`, else available
/// parallelism (at least 1).
pub fn worker_count() -> usize {
    std::env::var("ANTWALK_WORKERS")
        .or_else(|_| std::env::var("RAYON_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
}

/// Solver step budget: `ANTWALK_MAX_STEPS`, default [`DEFAULT_MAX_STEPS`].
pub fn max_steps() -> u32 {
    std::env::var("ANTWALK_MAX_STEPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_STEPS)
}

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `info`). Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
