//! Objective coefficients, optionally blending benefit with a secondary score.

use std::collections::HashMap;

use super::dataset::ProjectDataset;

/// Added to min-max denominators so an all-equal column does not divide by
/// zero.
pub const NORMALIZATION_EPSILON: f64 = 1e-9;

/// Objective coefficient per project id.
///
/// Without any secondary score the coefficient is the raw benefit and `alpha`
/// is ignored. Otherwise benefit and score (missing scores count as 0) are
/// min-max normalized over the whole candidate set, blended as
/// `alpha * benefit + (1 - alpha) * score`, and scaled by the mean benefit so
/// the objective keeps the magnitude of the raw data.
pub fn blended_coefficients(dataset: &ProjectDataset, alpha: f64) -> HashMap<String, f64> {
    let projects = dataset.projects();
    if !dataset.has_secondary_score() {
        return projects
            .iter()
            .map(|p| (p.id.clone(), p.benefit))
            .collect();
    }

    let benefits: Vec<f64> = projects.iter().map(|p| p.benefit).collect();
    let scores: Vec<f64> = projects
        .iter()
        .map(|p| p.secondary_score.unwrap_or(0.0))
        .collect();

    let benefit_norm = Normalizer::fit(&benefits);
    let score_norm = Normalizer::fit(&scores);
    let mean_benefit = benefits.iter().sum::<f64>() / benefits.len() as f64;

    projects
        .iter()
        .zip(benefits.iter().zip(&scores))
        .map(|(p, (&b, &s))| {
            let blend = alpha * benefit_norm.apply(b) + (1.0 - alpha) * score_norm.apply(s);
            (p.id.clone(), blend * mean_benefit)
        })
        .collect()
}

struct Normalizer {
    min: f64,
    span: f64,
}

impl Normalizer {
    fn fit(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            min,
            span: max - min + NORMALIZATION_EPSILON,
        }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.min) / self.span
    }
}
