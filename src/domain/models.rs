use super::value_objects::{ConstraintType, SolutionStatus, SolverBackend};

/// Binary decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
}

impl Variable {
    pub fn binary(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Linear objective function, always maximized
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub coefficients: Vec<f64>,
}

impl ObjectiveFunction {
    pub fn maximize(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    /// Objective value of an assignment
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }
}

/// Linear constraint on variables
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub coefficients: Vec<f64>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, coefficients: Vec<f64>, bound: f64) -> Self {
        Self {
            constraint_type,
            coefficients,
            bound,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    pub fn violation(&self, values: &[f64]) -> f64 {
        self.constraint_type.violation(self.lhs(values), self.bound)
    }
}

/// Alternative-solution search mode
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PoolSearch {
    /// Only the incumbent is reported
    #[default]
    Off,
    /// Collect up to `count` distinct solutions no worse than `gap`
    /// (fractional) below the best one
    Alternatives { count: usize, gap: f64 },
}

impl PoolSearch {
    pub fn requested(&self) -> usize {
        match self {
            PoolSearch::Off => 0,
            PoolSearch::Alternatives { count, .. } => *count,
        }
    }
}

/// Configuration for the solver
///
/// The default is fully inert: no time limit, no gap, no alternative search.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub pool: PoolSearch,
    pub verbose: bool,
}

/// Complete binary optimization problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction) -> Self {
        Self {
            name: String::new(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.num_variables()
    }

    /// Rounds values at 0.5 and measures how far the result and the raw
    /// values are from a feasible binary assignment.
    pub fn assess(&self, values: &[f64]) -> SolutionQuality {
        let rounded: Vec<f64> = values
            .iter()
            .map(|&v| if v > 0.5 { 1.0 } else { 0.0 })
            .collect();

        let max_constraint_violation = self
            .constraints
            .iter()
            .map(|c| c.violation(&rounded))
            .fold(0.0, f64::max);
        let max_integrality_violation = values
            .iter()
            .map(|&v| (v - v.round()).abs())
            .fold(0.0, f64::max);

        SolutionQuality {
            max_constraint_violation,
            max_integrality_violation,
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Default)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
    pub max_integrality_violation: f64,
}

impl SolutionQuality {
    pub fn is_feasible(&self, tolerance: f64) -> bool {
        self.max_constraint_violation <= tolerance
    }
}

/// One slot of a solver's alternative-solution pool
///
/// Either field is `None` when the backend could not read that slot back.
#[derive(Debug, Clone, Default)]
pub struct AlternativeSolution {
    pub variable_values: Option<Vec<f64>>,
    pub objective_value: Option<f64>,
}

/// Raw output of one solve
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    /// Number of pool solutions the backend says it found (incumbent included)
    pub pool_count: usize,
    pub alternatives: Vec<AlternativeSolution>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            pool_count: 0,
            alternatives: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self::with_incumbent(SolutionStatus::Optimal, value, variable_values)
    }

    /// Solution carrying an incumbent under any status
    pub fn with_incumbent(status: SolutionStatus, value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status,
            objective_value: Some(value),
            variable_values,
            pool_count: 1,
            alternatives: Vec::new(),
            message: format!("{} solution found", status),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<AlternativeSolution>) -> Self {
        self.pool_count = alternatives.len();
        self.alternatives = alternatives;
        self
    }

    /// An empty problem has an incumbent with no values.
    pub fn has_incumbent(&self) -> bool {
        self.objective_value.is_some()
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
