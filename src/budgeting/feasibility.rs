//! Re-checks a selection against the rules by direct summation.

use std::collections::BTreeSet;
use std::fmt;

use super::dataset::{Project, ProjectDataset};
use super::rules::RuleConfiguration;

const TOLERANCE: f64 = 1e-6;

/// A rule a selection breaks.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    UnknownProject(String),
    Budget { spent: f64, budget: f64 },
    Cardinality { selected: usize, limit: u32 },
    Exclusivity { group: usize, selected: usize },
    Dependency { prerequisite: String, dependent: String },
    Resource { resource: String, used: f64, capacity: f64 },
    RegionMin { region: String, selected: usize, min: u32 },
    RegionMax { region: String, selected: usize, max: u32 },
    Excluded { index: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnknownProject(id) => write!(f, "unknown project '{}'", id),
            Violation::Budget { spent, budget } => {
                write!(f, "spends {} over a budget of {}", spent, budget)
            }
            Violation::Cardinality { selected, limit } => {
                write!(f, "selects {} projects, limit {}", selected, limit)
            }
            Violation::Exclusivity { group, selected } => {
                write!(f, "selects {} members of exclusive group {}", selected, group)
            }
            Violation::Dependency {
                prerequisite,
                dependent,
            } => write!(f, "'{}' selected without '{}'", dependent, prerequisite),
            Violation::Resource {
                resource,
                used,
                capacity,
            } => write!(f, "uses {} of '{}', capacity {}", used, resource, capacity),
            Violation::RegionMin {
                region,
                selected,
                min,
            } => write!(f, "selects {} in '{}', minimum {}", selected, region, min),
            Violation::RegionMax {
                region,
                selected,
                max,
            } => write!(f, "selects {} in '{}', maximum {}", selected, region, max),
            Violation::Excluded { index } => write!(f, "matches excluded selection {}", index),
        }
    }
}

/// Every rule `selected` breaks; empty when the selection is feasible.
///
/// References to unknown projects in the rules are skipped the same way the
/// model builder skips them.
pub fn check_selection(
    dataset: &ProjectDataset,
    rules: &RuleConfiguration,
    selected: &[String],
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let chosen: BTreeSet<&str> = selected.iter().map(String::as_str).collect();

    let mut projects = Vec::with_capacity(chosen.len());
    for id in &chosen {
        match dataset.get(id) {
            Some(project) => projects.push(project),
            None => violations.push(Violation::UnknownProject(id.to_string())),
        }
    }

    let spent: f64 = projects.iter().map(|p| p.cost).sum();
    if spent > rules.budget + TOLERANCE {
        violations.push(Violation::Budget {
            spent,
            budget: rules.budget,
        });
    }

    if let Some(limit) = rules.cardinality_limit {
        if projects.len() > limit as usize {
            violations.push(Violation::Cardinality {
                selected: projects.len(),
                limit,
            });
        }
    }

    for (group, members) in rules.exclusive_groups.iter().enumerate() {
        let members: BTreeSet<&str> = members.iter().map(String::as_str).collect();
        let selected = members.intersection(&chosen).count();
        if selected > 1 {
            violations.push(Violation::Exclusivity { group, selected });
        }
    }

    for dependency in &rules.dependencies {
        if !dataset.contains(&dependency.prerequisite) || !dataset.contains(&dependency.dependent)
        {
            continue;
        }
        if chosen.contains(dependency.dependent.as_str())
            && !chosen.contains(dependency.prerequisite.as_str())
        {
            violations.push(Violation::Dependency {
                prerequisite: dependency.prerequisite.clone(),
                dependent: dependency.dependent.clone(),
            });
        }
    }

    let attributes = dataset.resource_names();
    for (resource, &capacity) in &rules.resource_caps {
        if !attributes.contains(resource.as_str()) {
            continue;
        }
        let used: f64 = projects.iter().map(|p| p.consumption(resource)).sum();
        if used > capacity + TOLERANCE {
            violations.push(Violation::Resource {
                resource: resource.clone(),
                used,
                capacity,
            });
        }
    }

    for (region, quota) in &rules.region_quotas {
        let resident = |p: &Project| p.region.as_deref() == Some(region.as_str());
        if !dataset.projects().iter().any(resident) {
            continue;
        }
        let count = projects.iter().filter(|&&p| resident(p)).count();
        if let Some(max) = quota.max {
            if count > max as usize {
                violations.push(Violation::RegionMax {
                    region: region.clone(),
                    selected: count,
                    max,
                });
            }
        }
        if let Some(min) = quota.min {
            if count < min as usize {
                violations.push(Violation::RegionMin {
                    region: region.clone(),
                    selected: count,
                    min,
                });
            }
        }
    }

    for (index, excluded) in rules.exclusion_sets.iter().enumerate() {
        let excluded: BTreeSet<&str> = excluded.iter().map(String::as_str).collect();
        if excluded == chosen {
            violations.push(Violation::Excluded { index });
        }
    }

    violations
}
