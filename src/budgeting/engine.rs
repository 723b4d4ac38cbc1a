//! Entry point: validates, solves, and fills the alternative set.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::dataset::{DataWarning, ProjectDataset};
use super::enumerator::KBestEnumerator;
use super::extractor::{extract, PortfolioSolution};
use super::feasibility::check_selection;
use super::model_builder::build_model;
use super::objective::blended_coefficients;
use super::orchestrator::{self, SolveStatus};
use super::rules::{ConfigError, RuleConfiguration};
use crate::domain::{SolverError, SolverService, SolverStatistics};

/// Failures that stop a solve outright.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("solver error: {0}")]
    Solver(#[from] SolverError),
}

/// Everything a caller learns from one engine run.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Status of the primary attempt.
    pub status: SolveStatus,
    pub solutions: Vec<PortfolioSolution>,
    pub diagnostics: Vec<DataWarning>,
    /// Whether the alternatives came from iterative exclusion.
    pub used_fallback: bool,
    /// Statistics of the primary attempt.
    pub statistics: SolverStatistics,
}

impl SolveReport {
    pub fn best(&self) -> Option<&PortfolioSolution> {
        self.solutions.first()
    }
}

/// Capital budgeting engine over an arbitrary solver backend.
///
/// `solve` blocks until the backend returns; callers that must stay
/// responsive run it on a worker thread.
#[derive(Clone)]
pub struct CapitalBudgetingEngine {
    solver: Arc<dyn SolverService>,
}

impl CapitalBudgetingEngine {
    pub fn new(solver: Arc<dyn SolverService>) -> Self {
        Self { solver }
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Configuration errors and data-quality findings, without solving.
    pub fn inspect(
        &self,
        dataset: &ProjectDataset,
        rules: &RuleConfiguration,
    ) -> Result<Vec<DataWarning>, ConfigError> {
        let rules = &rules.clone().with_dataset_rules(dataset);
        rules.validate(dataset)?;
        let coefficients = blended_coefficients(dataset, rules.objective_weight);
        let model = build_model(dataset, rules, &coefficients);

        let mut diagnostics = dataset.diagnostics();
        diagnostics.extend(model.skipped);
        Ok(diagnostics)
    }

    /// Best selection and, when `rules.pool_size > 0`, up to `pool_size`
    /// distinct alternatives.
    ///
    /// `exclusive_group` tags and `requires` lists on the projects are always
    /// enforced, on top of whatever `rules` lists explicitly.
    pub fn solve(
        &self,
        dataset: &ProjectDataset,
        rules: &RuleConfiguration,
    ) -> Result<SolveReport, EngineError> {
        let rules = &rules.clone().with_dataset_rules(dataset);
        rules.validate(dataset)?;

        let mut diagnostics = dataset.diagnostics();
        let coefficients = blended_coefficients(dataset, rules.objective_weight);
        let model = build_model(dataset, rules, &coefficients);
        diagnostics.extend(model.skipped.iter().cloned());
        for warning in &diagnostics {
            warn!(%warning, "data quality");
        }

        let attempt = orchestrator::solve(self.solver.as_ref(), model, rules)?;
        let status = attempt.status;
        let statistics = attempt.solution.statistics.clone();
        let mut solutions = extract(&attempt, rules.pool_size);

        let short = rules.pool_size > 0 && solutions.len() < rules.pool_size;
        let used_fallback = short && status.has_incumbent();
        if used_fallback {
            info!(
                requested = rules.pool_size,
                native = solutions.len(),
                "native pool came up short, enumerating alternatives"
            );
            let outcome = KBestEnumerator::new(rules.pool_size).run(|found| {
                let round_rules = rules.excluding(found);
                let model = build_model(dataset, &round_rules, &coefficients);
                let attempt = orchestrator::solve(self.solver.as_ref(), model, &round_rules)?;
                Ok::<_, SolverError>(extract(&attempt, 0).into_iter().next())
            })?;
            debug!(terminal = ?outcome.terminal, found = outcome.solutions.len(), "enumeration finished");

            solutions = outcome.solutions;
            solutions.truncate(rules.pool_size);
        }

        for solution in &solutions {
            for violation in check_selection(dataset, rules, &solution.selected_ids) {
                warn!(
                    sequence = solution.sequence_number,
                    %violation,
                    "returned selection breaks a rule"
                );
            }
        }

        info!(
            %status,
            solutions = solutions.len(),
            best = ?solutions.first().map(|s| s.objective_value),
            used_fallback,
            "capital budgeting solve complete"
        );

        Ok(SolveReport {
            status,
            solutions,
            diagnostics,
            used_fallback,
            statistics,
        })
    }
}
