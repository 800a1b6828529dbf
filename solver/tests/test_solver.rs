//! End-to-end tests: enumerate → build → solve on the reference grid.
//!
//! The golden values were captured once from this pipeline and are asserted
//! to 6 decimals. A full 5×5 solve takes ~1900 steps over 10,265 rows.

use std::sync::OnceLock;

use antwalk::aggregate::run_workers;
use antwalk::expectation::{
    round6, run_pipeline, solve_expected_steps, ConvergenceRule, Propagator, SolverConfig,
};
use antwalk::state_space::enumerate_states;
use antwalk::transitions::build_transitions;
use antwalk::types::{Grid, StateSpace, TransitionTable};
use antwalk::SolveError;

const GOLDEN_EXPECTED_STEPS: f64 = 430.088222;
const GOLDEN_CONVERGENCE_STEP: u32 = 1892;

// Shared state space, built once per test binary.
static MODEL: OnceLock<(StateSpace, TransitionTable)> = OnceLock::new();

fn model() -> &'static (StateSpace, TransitionTable) {
    MODEL.get_or_init(|| {
        let space = enumerate_states(&Grid::reference()).unwrap();
        let table = build_transitions(&space).unwrap();
        (space, table)
    })
}

#[test]
fn reference_state_space_shape() {
    let (space, table) = model();
    assert_eq!(space.len(), 10_270);
    assert_eq!(space.terminal.len(), 5);
    assert_eq!(table.len(), 10_265);
    assert!(space.states.contains_key(&space.initial));
    for &key in &space.terminal {
        assert!(space.get(key).unwrap().is_terminal(&space.grid));
    }
}

#[test]
fn every_transition_target_is_valid() {
    let (space, table) = model();
    for (source, row) in table.iter() {
        assert!(!row.is_empty(), "row {source} is empty");
        for &target in row {
            let c = space
                .get(target)
                .unwrap_or_else(|| panic!("{source} -> {target} leaves the state space"));
            assert!(c.is_valid(&space.grid));
        }
    }
}

#[test]
fn corner_edge_interior_out_degrees() {
    let (space, table) = model();
    let mut seen = [false; 3];
    for (source, row) in table.iter() {
        let c = space.get(source).unwrap();
        let edges = (c.x == 0 || c.x == 4) as usize + (c.y == 0 || c.y == 4) as usize;
        assert_eq!(row.len(), 4 - edges);
        seen[edges] = true;
    }
    assert_eq!(seen, [true, true, true]);
}

#[test]
fn reference_expectation_golden() {
    let (space, table) = model();
    let result = solve_expected_steps(space, table, &SolverConfig::default()).unwrap();
    assert_eq!(result.steps_to_converge, GOLDEN_CONVERGENCE_STEP);
    assert!(
        (round6(result.expected_steps) - GOLDEN_EXPECTED_STEPS).abs() < 1e-9,
        "expected steps {:.6}",
        result.expected_steps
    );
    assert!(result.absorbed_mass <= 1.0 + 1e-9);
    assert!(1.0 - result.absorbed_mass < 1e-6);
}

#[test]
fn reference_program_counting_rule() {
    let (space, table) = model();
    let config = SolverConfig {
        convergence_rule: ConvergenceRule::Cumulative,
        ..SolverConfig::default()
    };
    let result = solve_expected_steps(space, table, &config).unwrap();
    assert_eq!(result.steps_to_converge, 1713);
    assert!((round6(result.expected_steps) - 430.088069).abs() < 1e-9);
}

#[test]
fn unrounded_contributions_approach_exact_value() {
    let (space, table) = model();
    let config = SolverConfig {
        round_contributions: false,
        ..SolverConfig::default()
    };
    let result = solve_expected_steps(space, table, &config).unwrap();
    assert_eq!(result.steps_to_converge, 1836);
    assert!((result.expected_steps - 430.088208).abs() < 1e-5);
}

#[test]
fn pipeline_is_deterministic() {
    let grid = Grid::new(4, 4).unwrap();
    let a = run_pipeline(&grid, &SolverConfig::default()).unwrap();
    let b = run_pipeline(&grid, &SolverConfig::default()).unwrap();
    assert_eq!(a.expected_steps.to_bits(), b.expected_steps.to_bits());
    assert_eq!(a.steps_to_converge, b.steps_to_converge);
    assert_eq!(a.steps_to_converge, 917);
    assert!((round6(a.expected_steps) - 189.997541).abs() < 1e-9);
}

#[test]
fn partial_row_of_seeds() {
    let grid = Grid::new(3, 2).unwrap();
    let result = run_pipeline(&grid, &SolverConfig::default()).unwrap();
    assert_eq!(result.steps_to_converge, 298);
    assert!((round6(result.expected_steps) - 40.198139).abs() < 1e-9);
}

#[test]
fn probability_mass_conserved() {
    let (space, table) = model();
    let mut prop = Propagator::new(space, table);
    let mut absorbed = 0.0;
    for _ in 0..300 {
        absorbed += prop.advance();
        let total: f64 = prop.distribution().iter().sum();
        assert!(total <= 1.0 + 1e-9);
        assert!((absorbed + prop.mass_in_circulation() - 1.0).abs() < 1e-9);
    }
    assert!(absorbed > 0.0);
}

#[test]
fn step_budget_reports_non_convergence() {
    let (space, table) = model();
    let config = SolverConfig {
        max_steps: 1000,
        ..SolverConfig::default()
    };
    let err = solve_expected_steps(space, table, &config).unwrap_err();
    match err {
        SolveError::NonConvergence {
            max_steps,
            expected_steps,
        } => {
            assert_eq!(max_steps, 1000);
            assert!(expected_steps > 400.0 && expected_steps < GOLDEN_EXPECTED_STEPS);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn workers_reproduce_single_run() {
    let report = run_workers(&Grid::reference(), &SolverConfig::default(), 2).unwrap();
    assert_eq!(report.workers, 2);
    assert_eq!(report.failed_workers, 0);
    assert!((report.expected_steps - GOLDEN_EXPECTED_STEPS).abs() < 1e-9);
    assert_eq!(report.steps_to_converge, GOLDEN_CONVERGENCE_STEP as u64);
}

#[test]
fn invalid_grid_rejected_before_solving() {
    assert!(matches!(
        Grid::new(2, 2),
        Err(SolveError::InvalidGrid { .. })
    ));
}
