use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, SolutionStatus as DomainSolutionStatus},
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use std::time::Instant;
use tracing::debug;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
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

        if num_vars == 0 {
            return Ok(DomainSolution::optimal(0.0, Vec::new())
                .with_statistics(statistics(start_time)));
        }

        // Build binary variables using good_lp
        let mut vars = variables!();
        let lp_variables: Vec<GoodLpVariable> =
            (0..num_vars).map(|_| vars.add(variable().binary())).collect();

        let mut obj_expr: Expression = 0.into();
        for (&coeff, &var) in problem.objective.coefficients.iter().zip(&lp_variables) {
            if coeff != 0.0 {
                obj_expr += coeff * var;
            }
        }

        let mut lp_model = vars.maximise(obj_expr).using(coin_cbc::coin_cbc);

        let config = &problem.solver_config;
        lp_model.set_parameter("log", if config.verbose { "1" } else { "0" });
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("sec", &limit.to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }
        if config.pool.requested() > 0 {
            debug!(
                requested = config.pool.requested(),
                "CBC keeps no solution pool, reporting the incumbent only"
            );
        }

        // Build constraints
        for constraint in &problem.constraints {
            let mut lhs: Expression = 0.into();
            for (&coeff, &var) in constraint.coefficients.iter().zip(&lp_variables) {
                if coeff != 0.0 {
                    lhs += coeff * var;
                }
            }

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    lp_model = lp_model.with(lhs.leq(constraint.bound));
                }
                ConstraintType::Equal => {
                    lp_model = lp_model.with(lhs.eq(constraint.bound));
                }
                ConstraintType::GreaterThanOrEqual => {
                    lp_model = lp_model.with(lhs.geq(constraint.bound));
                }
            }
        }

        // Solve the problem
        let solution_result = lp_model.solve();
        let statistics = statistics(start_time);

        // CBC stops silently at `sec`; an answer arriving at the limit is not proven optimal
        let hit_limit = config
            .time_limit
            .is_some_and(|limit| statistics.solve_time_ms >= limit * 1000.0);

        match solution_result {
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let objective = problem.objective.evaluate(&variable_values);
                let status = if hit_limit {
                    DomainSolutionStatus::TimeLimit
                } else {
                    DomainSolutionStatus::Optimal
                };

                let mut solution =
                    DomainSolution::with_incumbent(status, objective, variable_values)
                        .with_statistics(statistics);
                solution.message = format!("{} solution found for '{}'", status, problem.name);

                Ok(solution)
            }
            Err(ResolutionError::Infeasible) => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no selection satisfies all constraints",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Unbounded) => Ok(DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Other(reason)) if hit_limit => Ok(DomainSolution::new(
                DomainSolutionStatus::TimeLimit,
                format!("CBC stopped at the time limit without an incumbent: {}", reason),
            )
            .with_statistics(statistics)),
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }
}
