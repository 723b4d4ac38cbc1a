//! Project records and the normalized candidate set.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use tracing::debug;

use super::rules::Dependency;

/// A candidate investment project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub cost: f64,
    pub benefit: f64,
    pub secondary_score: Option<f64>,
    pub region: Option<String>,
    pub exclusive_group: Option<String>,
    /// Ids of projects that must also be selected when this one is.
    pub requires: Vec<String>,
    pub resources: BTreeMap<String, f64>,
    /// Advisory only; no rule is derived from it.
    pub priority: Option<f64>,
}

impl Project {
    pub fn new(id: impl Into<String>, cost: f64, benefit: f64) -> Self {
        Self {
            id: id.into(),
            cost,
            benefit,
            secondary_score: None,
            region: None,
            exclusive_group: None,
            requires: Vec::new(),
            resources: BTreeMap::new(),
            priority: None,
        }
    }

    pub fn with_secondary_score(mut self, score: f64) -> Self {
        self.secondary_score = Some(score);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_exclusive_group(mut self, group: impl Into<String>) -> Self {
        self.exclusive_group = Some(group.into());
        self
    }

    pub fn requiring(mut self, prerequisite: impl Into<String>) -> Self {
        self.requires.push(prerequisite.into());
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, consumption: f64) -> Self {
        self.resources.insert(name.into(), consumption);
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Consumption of `resource`, zero when the project does not list it.
    pub fn consumption(&self, resource: &str) -> f64 {
        self.resources.get(resource).copied().unwrap_or(0.0)
    }
}

/// Non-fatal data-quality finding.
#[derive(Debug, Clone, PartialEq)]
pub enum DataWarning {
    DuplicateId(String),
    NonPositiveCost { id: String, cost: f64 },
    NonPositiveBenefit { id: String, benefit: f64 },
    NegativeConsumption { id: String, resource: String, value: f64 },
    UnknownPrerequisite { id: String, requires: String },
    UnknownGroupMember { group: usize, id: String },
    UnknownDependencyId { prerequisite: String, dependent: String },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::DuplicateId(id) => write!(f, "duplicate project id '{}' ignored", id),
            DataWarning::NonPositiveCost { id, cost } => {
                write!(f, "project '{}' has non-positive cost {}", id, cost)
            }
            DataWarning::NonPositiveBenefit { id, benefit } => {
                write!(f, "project '{}' has non-positive benefit {}", id, benefit)
            }
            DataWarning::NegativeConsumption {
                id,
                resource,
                value,
            } => write!(
                f,
                "project '{}' has negative consumption {} of '{}'",
                id, value, resource
            ),
            DataWarning::UnknownPrerequisite { id, requires } => {
                write!(f, "project '{}' requires missing project '{}'", id, requires)
            }
            DataWarning::UnknownGroupMember { group, id } => {
                write!(f, "exclusive group {} names missing project '{}'", group, id)
            }
            DataWarning::UnknownDependencyId {
                prerequisite,
                dependent,
            } => write!(
                f,
                "dependency '{}' -> '{}' references a missing project",
                prerequisite, dependent
            ),
        }
    }
}

/// Deduplicated candidate set in input order.
///
/// The first record with a given id wins; later ones are dropped and reported
/// through [`ProjectDataset::diagnostics`].
#[derive(Debug, Clone, Default)]
pub struct ProjectDataset {
    projects: Vec<Project>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl ProjectDataset {
    pub fn new(records: impl IntoIterator<Item = Project>) -> Self {
        let mut index = HashMap::new();
        let mut projects = Vec::new();
        let mut duplicates = Vec::new();

        for project in records {
            if !index.contains_key(&project.id) {
                index.insert(project.id.clone(), projects.len());
                projects.push(project);
            } else {
                debug!(id = %project.id, "dropping duplicate project record");
                duplicates.push(project.id);
            }
        }

        Self {
            projects,
            index,
            duplicates,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.index_of(id).map(|i| &self.projects[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn has_region_attribute(&self) -> bool {
        self.projects.iter().any(|p| p.region.is_some())
    }

    pub fn has_secondary_score(&self) -> bool {
        self.projects.iter().any(|p| p.secondary_score.is_some())
    }

    /// Names of every resource some project consumes.
    pub fn resource_names(&self) -> BTreeSet<&str> {
        self.projects
            .iter()
            .flat_map(|p| p.resources.keys().map(String::as_str))
            .collect()
    }

    /// One group per distinct non-empty `exclusive_group` tag, in order of
    /// first appearance.
    pub fn exclusive_groups(&self) -> Vec<Vec<String>> {
        let mut order: Vec<&str> = Vec::new();
        let mut members: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for project in &self.projects {
            let Some(tag) = project.exclusive_group.as_deref() else {
                continue;
            };
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            if !members.contains_key(tag) {
                order.push(tag);
            }
            members.entry(tag).or_default().push(project.id.clone());
        }

        order
            .into_iter()
            .filter_map(|tag| members.remove(tag))
            .collect()
    }

    /// `(prerequisite, dependent)` pairs from every `requires` list.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.projects
            .iter()
            .flat_map(|p| {
                p.requires
                    .iter()
                    .map(|r| r.trim())
                    .filter(|r| !r.is_empty())
                    .map(|r| Dependency::new(r, p.id.clone()))
            })
            .collect()
    }

    /// Data-quality findings about the records themselves.
    pub fn diagnostics(&self) -> Vec<DataWarning> {
        let mut warnings: Vec<DataWarning> = self
            .duplicates
            .iter()
            .cloned()
            .map(DataWarning::DuplicateId)
            .collect();

        for project in &self.projects {
            if project.cost <= 0.0 {
                warnings.push(DataWarning::NonPositiveCost {
                    id: project.id.clone(),
                    cost: project.cost,
                });
            }
            if project.benefit <= 0.0 {
                warnings.push(DataWarning::NonPositiveBenefit {
                    id: project.id.clone(),
                    benefit: project.benefit,
                });
            }
            for (resource, &value) in &project.resources {
                if value < 0.0 {
                    warnings.push(DataWarning::NegativeConsumption {
                        id: project.id.clone(),
                        resource: resource.clone(),
                        value,
                    });
                }
            }
            for requires in project.requires.iter().map(|r| r.trim()) {
                if !requires.is_empty() && !self.contains(requires) {
                    warnings.push(DataWarning::UnknownPrerequisite {
                        id: project.id.clone(),
                        requires: requires.to_string(),
                    });
                }
            }
        }

        warnings
    }
}

impl FromIterator<Project> for ProjectDataset {
    fn from_iter<T: IntoIterator<Item = Project>>(iter: T) -> Self {
        Self::new(iter)
    }
}
