//! Translates a project dataset and its rules into a binary program.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::dataset::{DataWarning, ProjectDataset};
use super::rules::RuleConfiguration;
use crate::domain::{Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, Variable};

/// Values above this count as "selected".
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// A built program plus the bookkeeping needed to read answers back.
#[derive(Debug, Clone)]
pub struct BudgetModel {
    pub problem: OptimizationProblem,
    /// Project id of each variable, in variable order.
    pub project_ids: Vec<String>,
    /// References the builder had to skip.
    pub skipped: Vec<DataWarning>,
}

impl BudgetModel {
    /// Ids whose value exceeds [`SELECTION_THRESHOLD`], in variable order.
    pub fn selection(&self, values: &[f64]) -> Vec<String> {
        self.project_ids
            .iter()
            .zip(values)
            .filter(|(_, v)| **v > SELECTION_THRESHOLD)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Objective of selecting exactly `ids`; unknown ids contribute nothing.
    pub fn objective_of<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> f64 {
        let wanted: BTreeSet<&String> = ids.into_iter().collect();
        self.project_ids
            .iter()
            .zip(&self.problem.objective.coefficients)
            .filter(|(id, _)| wanted.contains(id))
            .map(|(_, c)| c)
            .sum()
    }
}

/// Emits the program for one solve attempt.
///
/// Variables follow dataset order and constraint names are derived from the
/// rule they encode, so two builds of the same input are identical.
pub fn build_model(
    dataset: &ProjectDataset,
    rules: &RuleConfiguration,
    coefficients: &HashMap<String, f64>,
) -> BudgetModel {
    let projects = dataset.projects();
    let n = projects.len();
    let project_ids: Vec<String> = projects.iter().map(|p| p.id.clone()).collect();
    let mut skipped = Vec::new();

    let objective = ObjectiveFunction::maximize(
        project_ids
            .iter()
            .map(|id| coefficients.get(id).copied().unwrap_or(0.0))
            .collect(),
    );
    let variables = project_ids
        .iter()
        .map(|id| Variable::binary(format!("x_{}", id)))
        .collect();

    let mut problem = OptimizationProblem::new(objective)
        .with_name("capital_budget")
        .with_variables(variables);

    // Budget
    problem = problem.add_constraint(
        Constraint::new(
            ConstraintType::LessThanOrEqual,
            projects.iter().map(|p| p.cost).collect(),
            rules.budget,
        )
        .with_name("budget"),
    );

    // Cardinality
    if let Some(limit) = rules.cardinality_limit {
        problem = problem.add_constraint(
            Constraint::new(ConstraintType::LessThanOrEqual, vec![1.0; n], limit as f64)
                .with_name("cardinality"),
        );
    }

    // Exclusivity
    for (group_idx, group) in rules.exclusive_groups.iter().enumerate() {
        let mut row = vec![0.0; n];
        let mut present = 0;
        for id in group {
            match dataset.index_of(id) {
                Some(i) => {
                    row[i] = 1.0;
                    present += 1;
                }
                None => skipped.push(DataWarning::UnknownGroupMember {
                    group: group_idx,
                    id: id.clone(),
                }),
            }
        }
        if present > 0 {
            problem = problem.add_constraint(
                Constraint::new(ConstraintType::LessThanOrEqual, row, 1.0)
                    .with_name(format!("exclusive_{}", group_idx)),
            );
        }
    }

    // Dependencies
    for dependency in &rules.dependencies {
        let (Some(pre), Some(dep)) = (
            dataset.index_of(&dependency.prerequisite),
            dataset.index_of(&dependency.dependent),
        ) else {
            skipped.push(DataWarning::UnknownDependencyId {
                prerequisite: dependency.prerequisite.clone(),
                dependent: dependency.dependent.clone(),
            });
            continue;
        };
        if pre == dep {
            continue;
        }
        let mut row = vec![0.0; n];
        row[dep] = 1.0;
        row[pre] = -1.0;
        problem = problem.add_constraint(
            Constraint::new(ConstraintType::LessThanOrEqual, row, 0.0).with_name(format!(
                "dependency_{}_{}",
                dependency.prerequisite, dependency.dependent
            )),
        );
    }

    // Resource capacities
    let attributes = dataset.resource_names();
    for (resource, &capacity) in &rules.resource_caps {
        if !attributes.contains(resource.as_str()) {
            debug!(%resource, "no project consumes resource, cap ignored");
            continue;
        }
        problem = problem.add_constraint(
            Constraint::new(
                ConstraintType::LessThanOrEqual,
                projects.iter().map(|p| p.consumption(resource)).collect(),
                capacity,
            )
            .with_name(format!("resource_{}", resource)),
        );
    }

    // Regional quotas
    for (region, quota) in &rules.region_quotas {
        let row: Vec<f64> = projects
            .iter()
            .map(|p| {
                if p.region.as_deref() == Some(region.as_str()) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        if row.iter().all(|&c| c == 0.0) {
            debug!(%region, "no project in region, quota ignored");
            continue;
        }
        if let Some(max) = quota.max {
            problem = problem.add_constraint(
                Constraint::new(ConstraintType::LessThanOrEqual, row.clone(), max as f64)
                    .with_name(format!("region_max_{}", region)),
            );
        }
        if let Some(min) = quota.min.filter(|&m| m > 0) {
            problem = problem.add_constraint(
                Constraint::new(ConstraintType::GreaterThanOrEqual, row, min as f64)
                    .with_name(format!("region_min_{}", region)),
            );
        }
    }

    // Previously found selections
    for (idx, selection) in rules.exclusion_sets.iter().enumerate() {
        let row: Vec<f64> = project_ids
            .iter()
            .map(|id| if selection.contains(id) { 1.0 } else { -1.0 })
            .collect();
        problem = problem.add_constraint(
            Constraint::new(
                ConstraintType::LessThanOrEqual,
                row,
                selection.len() as f64 - 1.0,
            )
            .with_name(format!("exclusion_{}", idx)),
        );
    }

    debug!(
        variables = n,
        constraints = problem.constraints.len(),
        exclusions = rules.exclusion_sets.len(),
        "built capital budgeting model"
    );

    BudgetModel {
        problem,
        project_ids,
        skipped,
    }
}
