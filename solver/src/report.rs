//! Report artifacts: the plain-text summary and optional JSON dumps.
//!
//! Text format (three labelled lines separated by blank lines):
//!
//! ```text
//! Number of workers: 8
//!
//! Expected number of steps: 430.088222
//!
//! Steps needed for solution convergence: 1892
//! ```

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregate::AggregateReport;
use crate::error::SolveError;

/// Render the text summary.
pub fn format_report(report: &AggregateReport) -> String {
    format!(
        "Number of workers: {}\n\nExpected number of steps: {:.6}\n\nSteps needed for solution convergence: {}\n",
        report.workers, report.expected_steps, report.steps_to_converge
    )
}

/// Write the text summary to `path`, creating parent directories.
pub fn write_report(path: &Path, report: &AggregateReport) -> Result<(), SolveError> {
    write_text(path, &format_report(report))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SolveError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| SolveError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &json)?;
    info!(path = %path.display(), "wrote json");
    Ok(())
}

fn write_text(path: &Path, contents: &str) -> Result<(), SolveError> {
    let io_err = |source| SolveError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::SolverConfig;
    use crate::types::Grid;

    fn report() -> AggregateReport {
        AggregateReport {
            grid: Grid::reference(),
            workers: 4,
            failed_workers: 0,
            expected_steps: 430.088222,
            steps_to_converge: 1892,
            solver: SolverConfig::default(),
            elapsed_secs: 1.5,
        }
    }

    #[test]
    fn test_format_report() {
        assert_eq!(
            format_report(&report()),
            "Number of workers: 4\n\nExpected number of steps: 430.088222\n\nSteps needed for solution convergence: 1892\n"
        );
    }

    #[test]
    fn test_write_report_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("out/report.txt");
        write_report(&text_path, &report()).unwrap();
        let text = fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("Expected number of steps: 430.088222"));

        let json_path = dir.path().join("report.json");
        write_json(&json_path, &report()).unwrap();
        let parsed: AggregateReport =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, report());
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = write_report(&blocker.join("report.txt"), &report()).unwrap_err();
        assert!(matches!(err, SolveError::Io { .. }));
    }
}
