//! antwalk-simulate: Monte Carlo estimate of the expected step count.
//!
//! Plays N independent walks and compares the sample mean against the Markov
//! chain result for the same grid.

use std::path::PathBuf;

use clap::Parser;

use antwalk::constants::{GRID_SIZE, MARKER_COUNT};
use antwalk::env_config;
use antwalk::expectation::{run_pipeline, SolverConfig};
use antwalk::report::write_json;
use antwalk::simulation::simulate_batch;
use antwalk::types::Grid;
use antwalk::SolveError;

/// Simulate the seed-carrying ant directly.
#[derive(Parser, Debug)]
#[command(name = "antwalk-simulate")]
struct Args {
    /// Grid side length
    #[arg(long, default_value_t = GRID_SIZE)]
    size: usize,
    /// Seeds to relocate
    #[arg(long, default_value_t = MARKER_COUNT)]
    markers: usize,
    /// Number of walks
    #[arg(long, default_value_t = 100_000)]
    walks: usize,
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Abandon a walk after this many steps
    #[arg(long, default_value_t = 1_000_000)]
    max_walk_steps: u32,
    /// Skip the Markov chain comparison
    #[arg(long)]
    no_compare: bool,
    /// Write summary statistics as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), SolveError> {
    let grid = Grid::new(args.size, args.markers)?;

    println!("=== antwalk-simulate ===");
    println!(
        "Grid: {}x{}, {} seeds, {} walks, seed {}",
        grid.size, grid.size, grid.markers, args.walks, args.seed
    );

    let result = simulate_batch(&grid, args.walks, args.seed, args.max_walk_steps);
    println!("  Mean:    {:.3} ± {:.3}", result.mean, result.std_error);
    println!("  Std dev: {:.3}", result.std_dev);
    println!("  Median:  {}", result.median);
    println!("  Min/Max: {} / {}", result.min, result.max);
    println!("  Elapsed: {:.2}s", result.elapsed.as_secs_f64());
    if result.truncated > 0 {
        eprintln!(
            "WARNING: {} walks hit the {}-step cap",
            result.truncated, args.max_walk_steps
        );
    }

    if !args.no_compare {
        let exact = run_pipeline(&grid, &SolverConfig::default())?;
        let z = if result.std_error > 0.0 {
            (result.mean - exact.expected_steps) / result.std_error
        } else {
            0.0
        };
        println!(
            "\nMarkov chain: {:.6} (simulation off by {:.2} standard errors)",
            exact.expected_steps, z
        );
    }

    if let Some(path) = &args.output {
        write_json(path, &result)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn main() {
    env_config::init_tracing();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
