//! Reads selections out of a solved model and removes repeats.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use super::model_builder::BudgetModel;
use super::orchestrator::{SolveAttempt, SolveStatus};

/// Relative difference tolerated between a reported and recomputed objective.
const OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// One returned alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSolution {
    /// 0-based rank within the returned batch.
    pub sequence_number: usize,
    /// Selected project ids, in dataset order.
    pub selected_ids: Vec<String>,
    pub objective_value: f64,
    /// Status of the attempt that produced this selection.
    pub status: SolveStatus,
}

impl PortfolioSolution {
    /// Order-independent identity of the selection.
    pub fn canonical(&self) -> BTreeSet<String> {
        self.selected_ids.iter().cloned().collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|s| s == id)
    }
}

/// Solutions carried by `attempt`, deduplicated and numbered from 0.
///
/// With `pool_size == 0` only the incumbent is read. Otherwise slots
/// `0..min(pool_count, pool_size)` are read; a slot the backend could not read
/// back falls back to the incumbent.
pub fn extract(attempt: &SolveAttempt, pool_size: usize) -> Vec<PortfolioSolution> {
    if !attempt.status.has_incumbent() {
        return Vec::new();
    }

    let solution = &attempt.solution;
    let primary_values = &solution.variable_values;
    let primary_objective = solution.objective_value;

    if pool_size == 0 || solution.pool_count == 0 {
        return vec![read(
            &attempt.model,
            0,
            primary_values,
            primary_objective,
            attempt.status,
        )];
    }

    let slots = solution.pool_count.min(pool_size);
    let width = attempt.model.project_ids.len();
    let mut batch = Vec::with_capacity(slots);

    for slot in 0..slots {
        let alternative = solution.alternatives.get(slot);
        if alternative.is_none() {
            debug!(slot, "no alternative slot, using incumbent");
        }

        let values = match alternative.and_then(|a| a.variable_values.as_ref()) {
            Some(values) if values.len() == width => values,
            Some(values) => {
                warn!(
                    slot,
                    len = values.len(),
                    expected = width,
                    "alternative slot has wrong width, using incumbent values"
                );
                primary_values
            }
            None => {
                if alternative.is_some() {
                    warn!(slot, "alternative slot unreadable, using incumbent values");
                }
                primary_values
            }
        };
        let objective = alternative
            .and_then(|a| a.objective_value)
            .or(primary_objective);

        batch.push(read(
            &attempt.model,
            slot,
            values,
            objective,
            attempt.status,
        ));
    }

    deduplicate(batch)
}

/// Drops later exact repeats (by canonical id set) and renumbers the rest.
pub fn deduplicate(batch: Vec<PortfolioSolution>) -> Vec<PortfolioSolution> {
    let mut seen = HashSet::new();
    let mut unique: Vec<PortfolioSolution> = batch
        .into_iter()
        .filter(|s| {
            let fresh = seen.insert(s.canonical());
            if !fresh {
                debug!(sequence = s.sequence_number, "dropping duplicate selection");
            }
            fresh
        })
        .collect();

    for (rank, solution) in unique.iter_mut().enumerate() {
        solution.sequence_number = rank;
    }
    unique
}

fn read(
    model: &BudgetModel,
    sequence_number: usize,
    values: &[f64],
    reported: Option<f64>,
    status: SolveStatus,
) -> PortfolioSolution {
    let selected_ids = model.selection(values);
    let recomputed = model.objective_of(&selected_ids);

    let tolerance = OBJECTIVE_TOLERANCE * recomputed.abs().max(1.0);

    let objective_value = match reported {
        Some(value) if (value - recomputed).abs() <= tolerance => value,
        Some(value) => {
            warn!(
                sequence_number,
                reported = value,
                recomputed,
                "reported objective disagrees with selection, using recomputed value"
            );
            recomputed
        }
        None => recomputed,
    };

    PortfolioSolution {
        sequence_number,
        selected_ids,
        objective_value,
        status,
    }
}
