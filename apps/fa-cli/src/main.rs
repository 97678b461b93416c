mod case;
mod error;

use case::{Case, PreparedCase};
use clap::{Parser, Subcommand};
use error::CliResult;
use fa_core::Axis;
use fa_solver::bounds::resolve_pair;
use fa_solver::{Allocation, Verification, solve, verify};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fa-cli")]
#[command(about = "Force allocation for redundant actuator arrays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a case file without solving it
    Validate {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Allocate forces for a case
    Solve {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Solve { case_path, json } => cmd_solve(&case_path, json),
    }
}

fn cmd_validate(case_path: &Path) -> CliResult<()> {
    println!("Validating case: {}", case_path.display());
    let prepared = Case::load(case_path)?.prepare()?;
    let problem = prepared.problem();
    problem.validate()?;
    prepared.config.validate()?;

    let active = problem.active_indices().len();
    resolve_pair(problem.lower, problem.upper, active)?;
    let groups = prepared.segments.coupled_groups(&prepared.retracted)?;

    println!("✓ Case is valid");
    println!(
        "  {} elements, {} active, {} coupled segments",
        problem.n_elements(),
        active,
        groups.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct SolveReport {
    allocation: Allocation,
    verification: Verification,
}

fn cmd_solve(case_path: &Path, json: bool) -> CliResult<()> {
    let prepared = Case::load(case_path)?.prepare()?;
    let problem = prepared.problem();
    let allocation = solve(&problem, Some(prepared.config))?;
    let verification = verify(&problem, &allocation.forces)?;

    if json {
        let report = SolveReport {
            allocation,
            verification,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_allocation(&prepared, &allocation, &verification)
}

fn print_allocation(
    prepared: &PreparedCase,
    allocation: &Allocation,
    check: &Verification,
) -> CliResult<()> {
    let achieved = prepared
        .influence
        .resultant_excluding(&allocation.forces, &prepared.retracted)?;

    if allocation.success() {
        println!("✓ Allocation {} ({} iterations)", allocation.status, allocation.iterations);
    } else {
        println!("✗ Allocation {}: {}", allocation.status, allocation.message);
        println!("  holding previous forces");
    }

    println!("  {:>4}  {:>12}  {}", "#", "force [N]", "segment");
    for (i, f) in allocation.forces.iter().enumerate() {
        let note = if prepared.retracted[i] { "  retracted" } else { "" };
        println!(
            "  {:>4}  {:>12.4}  {:>7}{}",
            i,
            f,
            prepared.segments.labels()[i],
            note
        );
    }

    println!("  target vs achieved:");
    for axis in Axis::ALL {
        println!(
            "    {:>2}  {:>12.4}  {:>12.4}",
            axis,
            prepared.target.get(axis),
            achieved.get(axis)
        );
    }
    println!(
        "  residual {:.3e}, segment spread {:.3e}, bound violation {:.3e}",
        check.resultant_residual, check.segment_spread, check.bound_violation
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::CliError;
    use fa_geometry::GeometryError;
    use fa_solver::AllocStatus;

    fn ring_case() -> PreparedCase {
        let yaml = include_str!("../cases/ring16.yaml");
        let case: Case = serde_yaml::from_str(yaml).unwrap();
        case.prepare().unwrap()
    }

    #[test]
    fn table_output_for_solved_case() {
        let prepared = ring_case();
        let problem = prepared.problem();
        let allocation = solve(&problem, Some(prepared.config)).unwrap();
        let check = verify(&problem, &allocation.forces).unwrap();
        assert!(print_allocation(&prepared, &allocation, &check).is_ok());
    }

    #[test]
    fn table_output_reports_bad_force_length() {
        let prepared = ring_case();
        let problem = prepared.problem();
        let check = verify(&problem, &prepared.previous).unwrap();
        let allocation = Allocation {
            forces: vec![0.0; 3],
            status: AllocStatus::Numerical,
            message: "short".to_string(),
            iterations: 0,
        };
        let err = print_allocation(&prepared, &allocation, &check).unwrap_err();
        assert!(matches!(err, CliError::Geometry(GeometryError::Core(_))));
    }
}
