// Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use capbudget::domain::{AlternativeSolution, PoolSearch, SolverConfig};
use capbudget::{
    OptimizationProblem, Project, ProjectDataset, Solution, SolutionStatus, SolverError,
    SolverService,
};

/// Reference solver that tries every assignment.
///
/// Ties keep enumeration order, so results are deterministic. With a native
/// pool it fills alternative slots best first; slots listed in
/// `broken_slots` come back unreadable.
pub struct ExhaustiveSolver {
    native_pool: bool,
    broken_slots: BTreeSet<usize>,
    configs: Mutex<Vec<SolverConfig>>,
}

impl ExhaustiveSolver {
    /// No native pool, like the production backends.
    pub fn new() -> Self {
        Self {
            native_pool: false,
            broken_slots: BTreeSet::new(),
            configs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pool() -> Self {
        Self {
            native_pool: true,
            ..Self::new()
        }
    }

    pub fn breaking_slot(mut self, slot: usize) -> Self {
        self.broken_slots.insert(slot);
        self
    }

    pub fn calls(&self) -> usize {
        self.configs.lock().unwrap().len()
    }

    /// Solver configuration of every call, in order.
    pub fn configs(&self) -> Vec<SolverConfig> {
        self.configs.lock().unwrap().clone()
    }

    fn ranked(problem: &OptimizationProblem) -> Vec<(f64, Vec<f64>)> {
        let n = problem.num_variables();
        assert!(n <= 20, "exhaustive solver is for small fixtures");

        let mut feasible: Vec<(f64, Vec<f64>)> = (0u32..1 << n)
            .map(|mask| {
                (0..n)
                    .map(|i| if mask & (1 << i) != 0 { 1.0 } else { 0.0 })
                    .collect::<Vec<f64>>()
            })
            .filter(|values| problem.constraints.iter().all(|c| c.violation(values) <= 1e-9))
            .map(|values| (problem.objective.evaluate(&values), values))
            .collect();
        feasible.sort_by(|a, b| b.0.total_cmp(&a.0));
        feasible
    }
}

impl SolverService for ExhaustiveSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution, SolverError> {
        self.validate(problem)?;
        self.configs
            .lock()
            .unwrap()
            .push(problem.solver_config.clone());

        let ranked = Self::ranked(problem);
        let Some((best, values)) = ranked.first().cloned() else {
            return Ok(Solution::new(SolutionStatus::Infeasible, "no feasible assignment"));
        };
        let solution = Solution::optimal(best, values);

        match problem.solver_config.pool {
            PoolSearch::Alternatives { count, gap } if self.native_pool => {
                let slots = ranked
                    .into_iter()
                    .filter(|(obj, _)| gap.is_infinite() || best - obj <= gap * best.abs() + 1e-9)
                    .take(count)
                    .enumerate()
                    .map(|(slot, (obj, values))| {
                        if self.broken_slots.contains(&slot) {
                            AlternativeSolution::default()
                        } else {
                            AlternativeSolution {
                                variable_values: Some(values),
                                objective_value: Some(obj),
                            }
                        }
                    })
                    .collect();
                Ok(solution.with_alternatives(slots))
            }
            _ => Ok(solution),
        }
    }

    fn name(&self) -> &str {
        "exhaustive"
    }

    fn supports_solution_pool(&self) -> bool {
        self.native_pool
    }
}

/// `(id, cost, benefit)` triples as a dataset.
pub fn dataset(projects: &[(&str, f64, f64)]) -> ProjectDataset {
    projects
        .iter()
        .map(|&(id, cost, benefit)| Project::new(id, cost, benefit))
        .collect()
}

/// P1 (100, 50), P2 (200, 90), P3 (50, 30)
pub fn three_projects() -> ProjectDataset {
    dataset(&[("P1", 100.0, 50.0), ("P2", 200.0, 90.0), ("P3", 50.0, 30.0)])
}

/// Ten projects exercising every rule family.
pub fn city_projects() -> ProjectDataset {
    ProjectDataset::new(vec![
        Project::new("road_a", 300.0, 280.0)
            .with_region("North")
            .with_exclusive_group("corridor")
            .with_resource("labour", 700.0),
        Project::new("road_b", 240.0, 230.0)
            .with_region("North")
            .with_exclusive_group("corridor")
            .with_resource("labour", 500.0),
        Project::new("water_main", 200.0, 150.0)
            .with_region("North")
            .with_resource("labour", 400.0),
        Project::new("clinic", 260.0, 310.0)
            .with_region("North")
            .requiring("water_main")
            .with_resource("labour", 600.0),
        Project::new("school", 350.0, 330.0)
            .with_region("South")
            .with_resource("labour", 800.0),
        Project::new("park", 90.0, 70.0)
            .with_region("South")
            .with_resource("labour", 150.0),
        Project::new("library", 150.0, 120.0)
            .with_region("East")
            .with_resource("labour", 300.0),
        Project::new("bridge", 420.0, 390.0)
            .with_region("East")
            .with_resource("labour", 900.0),
        Project::new("depot", 120.0, 60.0)
            .with_region("East")
            .requiring("road_a"),
        Project::new("market", 180.0, 140.0)
            .with_region("South")
            .with_resource("labour", 250.0),
    ])
}

pub fn ids(selection: &[&str]) -> Vec<String> {
    selection.iter().map(|s| s.to_string()).collect()
}
