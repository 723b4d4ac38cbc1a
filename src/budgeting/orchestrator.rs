//! Configures the solver for one attempt, runs it and classifies the outcome.

use std::fmt;

use tracing::{info, warn};

use super::model_builder::BudgetModel;
use super::rules::RuleConfiguration;
use crate::domain::{
    PoolSearch, Solution, SolutionStatus, SolverConfig, SolverError, SolverService,
};

/// Pool tolerance used when the rules leave `pool_gap` unset: any alternative
/// the solver finds is accepted.
pub const PERMISSIVE_POOL_GAP: f64 = f64::INFINITY;

/// Largest constraint violation a rounded incumbent may show.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Terminal status of one solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Optimal,
    TimeLimitWithIncumbent,
    SuboptimalWithIncumbent,
    Infeasible,
    Unbounded,
    NoIncumbent,
}

impl SolveStatus {
    /// Only these statuses carry selections worth reporting.
    pub fn has_incumbent(&self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal
                | SolveStatus::TimeLimitWithIncumbent
                | SolveStatus::SuboptimalWithIncumbent
        )
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::TimeLimitWithIncumbent => write!(f, "time-limit-with-incumbent"),
            SolveStatus::SuboptimalWithIncumbent => write!(f, "suboptimal-with-incumbent"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::NoIncumbent => write!(f, "no-incumbent"),
        }
    }
}

/// Model, raw solver output and classified status of one attempt.
#[derive(Debug, Clone)]
pub struct SolveAttempt {
    pub model: BudgetModel,
    pub solution: Solution,
    pub status: SolveStatus,
}

/// Solver parameters for an attempt under `rules`.
///
/// Always starts from the inert default so nothing leaks in from an earlier
/// attempt; alternative search is switched on only for `pool_size > 0`.
pub fn solver_config(rules: &RuleConfiguration) -> SolverConfig {
    let mut config = SolverConfig {
        pool: PoolSearch::Off,
        ..SolverConfig::default()
    };

    if rules.pool_size > 0 {
        config.pool = PoolSearch::Alternatives {
            count: rules.pool_size,
            gap: rules.pool_gap.unwrap_or(PERMISSIVE_POOL_GAP),
        };
    }
    config.time_limit = rules.time_limit_secs;
    config.gap_tolerance = rules.mip_gap;

    config
}

/// Classifies a raw solution, given whether its incumbent survived rounding.
pub fn classify(solution: &Solution, incumbent_feasible: bool) -> SolveStatus {
    let incumbent = solution.has_incumbent() && incumbent_feasible;
    match solution.status {
        SolutionStatus::Optimal if incumbent => SolveStatus::Optimal,
        SolutionStatus::TimeLimit if incumbent => SolveStatus::TimeLimitWithIncumbent,
        SolutionStatus::Feasible
        | SolutionStatus::IterationLimit
        | SolutionStatus::NodeLimit
        | SolutionStatus::Interrupted
            if incumbent =>
        {
            SolveStatus::SuboptimalWithIncumbent
        }
        SolutionStatus::Infeasible => SolveStatus::Infeasible,
        SolutionStatus::Unbounded => SolveStatus::Unbounded,
        _ => SolveStatus::NoIncumbent,
    }
}

/// Runs one solve of `model` under `rules`.
///
/// Only a failure to invoke the solver is an error; every terminal status,
/// including infeasible, comes back as a [`SolveAttempt`].
pub fn solve(
    solver: &dyn SolverService,
    mut model: BudgetModel,
    rules: &RuleConfiguration,
) -> Result<SolveAttempt, SolverError> {
    model.problem.solver_config = solver_config(rules);

    let solution = solver.solve(&model.problem)?;

    let quality = if solution.has_incumbent() {
        model.problem.assess(&solution.variable_values)
    } else {
        Default::default()
    };
    let complete = solution.variable_values.len() == model.project_ids.len();
    let feasible = complete && quality.is_feasible(FEASIBILITY_TOLERANCE);
    if solution.has_incumbent() && !feasible {
        warn!(
            solver = solver.name(),
            violation = quality.max_constraint_violation,
            "rounded incumbent violates the model, discarding it"
        );
    }

    let status = classify(&solution, feasible);
    info!(
        solver = solver.name(),
        raw_status = %solution.status,
        %status,
        objective = ?solution.objective_value,
        pool_count = solution.pool_count,
        solve_time_ms = solution.statistics.solve_time_ms,
        "solve finished"
    );

    Ok(SolveAttempt {
        model,
        solution: solution.with_quality(quality),
        status,
    })
}
