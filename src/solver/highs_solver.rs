// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// Translates binary selection problems to the HiGHS row-wise API

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, SolutionStatus as DomainSolutionStatus},
};
use highs::{HighsModelStatus, RowProblem, Sense};
use std::time::Instant;
use tracing::debug;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        // Validate first
        self.validate(problem)?;

        let start_time = Instant::now();
        let num_vars = problem.num_variables();
        let statistics = |start: Instant| SolverStatistics {
            solve_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            num_variables: num_vars as u32,
            num_constraints: problem.constraints.len() as u32,
        };

        // Nothing to choose; HiGHS reports an empty model as an error
        if num_vars == 0 {
            return Ok(DomainSolution::optimal(0.0, Vec::new())
                .with_statistics(statistics(start_time)));
        }

        let mut pb = RowProblem::default();

        // One binary column per variable
        let cols: Vec<_> = problem
            .objective
            .coefficients
            .iter()
            .map(|&coeff| pb.add_integer_column(coeff, 0.0..=1.0))
            .collect();

        // Add constraints
        for constraint in &problem.constraints {
            let terms: Vec<_> = constraint
                .coefficients
                .iter()
                .zip(&cols)
                .filter(|(coeff, _)| **coeff != 0.0)
                .map(|(&coeff, &col)| (col, coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let config = &problem.solver_config;
        let mut model = pb.optimise(Sense::Maximise);
        model.set_option("output_flag", config.verbose);
        if let Some(limit) = config.time_limit {
            model.set_option("time_limit", limit);
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }
        if config.pool.requested() > 0 {
            debug!(
                requested = config.pool.requested(),
                "HiGHS keeps no solution pool, reporting the incumbent only"
            );
        }

        let solved = model.solve();
        let statistics = statistics(start_time);

        // Statuses under which HiGHS may still hold a usable primal point
        let status = match solved.status() {
            HighsModelStatus::Optimal => DomainSolutionStatus::Optimal,
            HighsModelStatus::ReachedTimeLimit => DomainSolutionStatus::TimeLimit,
            HighsModelStatus::ReachedIterationLimit => DomainSolutionStatus::IterationLimit,
            HighsModelStatus::ObjectiveBound | HighsModelStatus::ObjectiveTarget => {
                DomainSolutionStatus::Feasible
            }
            HighsModelStatus::Infeasible => {
                return Ok(DomainSolution::new(
                    DomainSolutionStatus::Infeasible,
                    "Problem is infeasible: no selection satisfies all constraints",
                )
                .with_statistics(statistics));
            }
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                return Ok(DomainSolution::new(
                    DomainSolutionStatus::Unbounded,
                    "Problem is unbounded",
                )
                .with_statistics(statistics));
            }
            status => {
                return Err(SolverError::ExecutionFailed(format!(
                    "HiGHS solver returned status: {:?}",
                    status
                )))
            }
        };

        if !found_primal_point(status, solved.mip_gap()) {
            return Ok(DomainSolution::new(
                status,
                format!("{} without an incumbent", status),
            )
            .with_statistics(statistics));
        }

        let variable_values = solved.get_solution().columns().to_vec();

        let objective = problem.objective.evaluate(&variable_values);
        let mut solution = DomainSolution::with_incumbent(status, objective, variable_values)
            .with_statistics(statistics);
        solution.message = format!("{} solution found for '{}'", status, problem.name);

        Ok(solution)
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}

/// HiGHS fills every column even when a limit stops it before any feasible
/// point; the MIP gap stays infinite until an incumbent exists.
fn found_primal_point(status: DomainSolutionStatus, mip_gap: f64) -> bool {
    status == DomainSolutionStatus::Optimal || mip_gap.is_finite()
}
