//! antwalk-solve: expected step count via forward propagation, averaged over workers.
//!
//! Writes the three-line text report and, on request, a JSON report and a
//! per-step convergence trace.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use antwalk::aggregate::run_workers;
use antwalk::constants::{CONVERGENCE_EPSILON, CONVERGENCE_WINDOW, GRID_SIZE, MARKER_COUNT};
use antwalk::env_config;
use antwalk::expectation::{run_pipeline, ConvergenceRule, SolverConfig};
use antwalk::report::{format_report, write_json, write_report};
use antwalk::types::Grid;
use antwalk::SolveError;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Rule {
    /// Window must be filled without interruption
    Consecutive,
    /// Every qualifying step counts
    Cumulative,
}

impl From<Rule> for ConvergenceRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Consecutive => ConvergenceRule::Consecutive,
            Rule::Cumulative => ConvergenceRule::Cumulative,
        }
    }
}

/// Expected steps for the ant to carry every seed from the bottom row to the top row.
#[derive(Parser, Debug)]
#[command(name = "antwalk-solve")]
struct Args {
    /// Grid side length
    #[arg(long, default_value_t = GRID_SIZE)]
    size: usize,
    /// Seeds to relocate
    #[arg(long, default_value_t = MARKER_COUNT)]
    markers: usize,
    /// Redundant solver runs [default: RAYON_NUM_THREADS or CPU count]
    #[arg(long, short = 'j', env = "ANTWALK_WORKERS")]
    workers: Option<usize>,
    /// Step budget per solve [default: 10000]
    #[arg(long, env = "ANTWALK_MAX_STEPS")]
    max_steps: Option<u32>,
    /// Contribution below which a step counts towards convergence
    #[arg(long, default_value_t = CONVERGENCE_EPSILON)]
    epsilon: f64,
    /// Qualifying steps needed to stop
    #[arg(long, default_value_t = CONVERGENCE_WINDOW)]
    window: u32,
    /// How qualifying steps are counted
    #[arg(long, value_enum, default_value_t = Rule::Consecutive)]
    rule: Rule,
    /// Accumulate exact contributions instead of rounding each to 6 decimals
    #[arg(long)]
    no_rounding: bool,
    /// Text report path
    #[arg(long, default_value = "outputs/antwalk_report.txt")]
    output: PathBuf,
    /// Also write the report as JSON
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write a per-step convergence trace (JSON) from one extra solve
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), SolveError> {
    let grid = Grid::new(args.size, args.markers)?;
    let workers = args.workers.unwrap_or_else(env_config::worker_count);
    let config = SolverConfig {
        max_steps: args.max_steps.unwrap_or_else(env_config::max_steps),
        epsilon: args.epsilon,
        convergence_window: args.window,
        convergence_rule: args.rule.into(),
        round_contributions: !args.no_rounding,
        record_trace: false,
    };

    println!("=== antwalk-solve ===");
    println!(
        "Grid: {}x{}, {} seeds, {} workers",
        grid.size, grid.size, grid.markers, workers
    );

    let t0 = Instant::now();
    let report = run_workers(&grid, &config, workers)?;
    println!("Solved in {:.2}s", t0.elapsed().as_secs_f64());
    if report.failed_workers > 0 {
        eprintln!(
            "WARNING: {} of {} workers did not converge and were excluded",
            report.failed_workers, report.workers
        );
    }

    print!("\n{}", format_report(&report));
    write_report(&args.output, &report)?;
    println!("\nWrote {}", args.output.display());

    if let Some(path) = &args.json {
        write_json(path, &report)?;
        println!("Wrote {}", path.display());
    }

    if let Some(path) = &args.trace {
        let traced = run_pipeline(
            &grid,
            &SolverConfig {
                record_trace: true,
                ..config.clone()
            },
        )?;
        write_json(path, &traced)?;
        println!("Wrote {} ({} steps)", path.display(), traced.trace.len());
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
