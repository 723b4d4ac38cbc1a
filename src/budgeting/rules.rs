//! Rule configuration describing the shape of the binary program.
//!
//! Rules load from TOML so a budgeting scenario can change without code
//! changes:
//!
//! ```
//! use capbudget::RuleConfiguration;
//!
//! let rules = RuleConfiguration::from_toml_str(r#"
//!     budget = 2000000.0
//!     objective_weight = 0.9
//!     pool_size = 3
//!
//!     [resource_caps]
//!     labour = 2000.0
//!
//!     [region_quotas.RegionD]
//!     min = 1
//! "#).unwrap();
//!
//! assert_eq!(rules.pool_size, 3);
//! assert_eq!(rules.region_quotas["RegionD"].min, Some(1));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::dataset::ProjectDataset;

/// Fatal configuration problem, raised before any solve.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("region quotas configured but no project has a region")]
    MissingRegionAttribute,

    #[error("objective weight must lie in [0, 1], got {0}")]
    ObjectiveWeightOutOfRange(f64),

    #[error("budget must be finite and non-negative, got {0}")]
    InvalidBudget(f64),

    #[error("pool gap must be non-negative, got {0}")]
    NegativePoolGap(f64),

    #[error("capacity of resource '{resource}' must be non-negative, got {capacity}")]
    NegativeCapacity { resource: String, capacity: f64 },

    #[error("quota for region '{region}' has min {min} above max {max}")]
    QuotaBoundsInverted { region: String, min: u32, max: u32 },

    #[error("time limit must be positive, got {0}")]
    InvalidTimeLimit(f64),

    #[error("MIP gap must be non-negative, got {0}")]
    NegativeMipGap(f64),
}

/// `dependent` may only be selected together with `prerequisite`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Dependency {
    pub prerequisite: String,
    pub dependent: String,
}

impl Dependency {
    pub fn new(prerequisite: impl Into<String>, dependent: impl Into<String>) -> Self {
        Self {
            prerequisite: prerequisite.into(),
            dependent: dependent.into(),
        }
    }
}

/// Bounds on how many projects of a region may be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct RegionQuota {
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}

impl RegionQuota {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: u32) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: u32) -> Self {
        Self::new(None, Some(max))
    }
}

fn default_objective_weight() -> f64 {
    1.0
}

/// Immutable description of one capital budgeting scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleConfiguration {
    pub budget: f64,

    #[serde(default)]
    pub resource_caps: BTreeMap<String, f64>,

    #[serde(default)]
    pub exclusive_groups: Vec<Vec<String>>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub region_quotas: BTreeMap<String, RegionQuota>,

    #[serde(default)]
    pub cardinality_limit: Option<u32>,

    /// Weight of the primary benefit against the secondary score.
    #[serde(default = "default_objective_weight")]
    pub objective_weight: f64,

    /// Number of distinct solutions wanted; 0 asks for the best one only.
    #[serde(default)]
    pub pool_size: usize,

    #[serde(default)]
    pub pool_gap: Option<f64>,

    #[serde(default)]
    pub time_limit_secs: Option<f64>,

    /// Relative optimality gap at which the solver may stop.
    #[serde(default)]
    pub mip_gap: Option<f64>,

    /// Selections to forbid outright.
    #[serde(skip)]
    pub exclusion_sets: Vec<BTreeSet<String>>,
}

impl RuleConfiguration {
    pub fn new(budget: f64) -> Self {
        Self {
            budget,
            resource_caps: BTreeMap::new(),
            exclusive_groups: Vec::new(),
            dependencies: Vec::new(),
            region_quotas: BTreeMap::new(),
            cardinality_limit: None,
            objective_weight: default_objective_weight(),
            pool_size: 0,
            pool_gap: None,
            time_limit_secs: None,
            mip_gap: None,
            exclusion_sets: Vec::new(),
        }
    }

    /// Loads rules from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses rules from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_resource_cap(mut self, resource: impl Into<String>, capacity: f64) -> Self {
        self.resource_caps.insert(resource.into(), capacity);
        self
    }

    pub fn with_exclusive_group<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusive_groups
            .push(members.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dependency(
        mut self,
        prerequisite: impl Into<String>,
        dependent: impl Into<String>,
    ) -> Self {
        self.dependencies
            .push(Dependency::new(prerequisite, dependent));
        self
    }

    pub fn with_region_quota(mut self, region: impl Into<String>, quota: RegionQuota) -> Self {
        self.region_quotas.insert(region.into(), quota);
        self
    }

    pub fn with_cardinality_limit(mut self, limit: u32) -> Self {
        self.cardinality_limit = Some(limit);
        self
    }

    pub fn with_objective_weight(mut self, weight: f64) -> Self {
        self.objective_weight = weight;
        self
    }

    pub fn with_pool(mut self, size: usize, gap: Option<f64>) -> Self {
        self.pool_size = size;
        self.pool_gap = gap;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_secs = Some(seconds);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = Some(gap);
        self
    }

    pub fn with_exclusion<I, S>(mut self, selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusion_sets
            .push(selection.into_iter().map(Into::into).collect());
        self
    }

    /// Appends the groups implied by `exclusive_group` tags and the
    /// dependencies implied by `requires` lists. Applying it twice is a no-op.
    pub fn with_dataset_rules(mut self, dataset: &ProjectDataset) -> Self {
        for group in dataset.exclusive_groups() {
            if !self.exclusive_groups.contains(&group) {
                self.exclusive_groups.push(group);
            }
        }
        for dependency in dataset.dependencies() {
            if !self.dependencies.contains(&dependency) {
                self.dependencies.push(dependency);
            }
        }
        self
    }

    /// Copy of these rules with extra selections forbidden and the pool off.
    pub fn excluding(&self, selections: &[BTreeSet<String>]) -> Self {
        let mut rules = self.clone();
        rules.exclusion_sets.extend(selections.iter().cloned());
        rules.pool_size = 0;
        rules.pool_gap = None;
        rules
    }

    /// Checks the rules against the dataset they will be applied to.
    pub fn validate(&self, dataset: &ProjectDataset) -> Result<(), ConfigError> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(ConfigError::InvalidBudget(self.budget));
        }
        if !(0.0..=1.0).contains(&self.objective_weight) {
            return Err(ConfigError::ObjectiveWeightOutOfRange(self.objective_weight));
        }
        if let Some(gap) = self.pool_gap {
            if gap.is_nan() || gap < 0.0 {
                return Err(ConfigError::NegativePoolGap(gap));
            }
        }
        if let Some(gap) = self.mip_gap {
            if gap.is_nan() || gap < 0.0 {
                return Err(ConfigError::NegativeMipGap(gap));
            }
        }
        if let Some(limit) = self.time_limit_secs {
            if limit.is_nan() || limit <= 0.0 {
                return Err(ConfigError::InvalidTimeLimit(limit));
            }
        }
        for (resource, &capacity) in &self.resource_caps {
            if capacity.is_nan() || capacity < 0.0 {
                return Err(ConfigError::NegativeCapacity {
                    resource: resource.clone(),
                    capacity,
                });
            }
        }
        for (region, quota) in &self.region_quotas {
            if let (Some(min), Some(max)) = (quota.min, quota.max) {
                if min > max {
                    return Err(ConfigError::QuotaBoundsInverted {
                        region: region.clone(),
                        min,
                        max,
                    });
                }
            }
        }
        if !self.region_quotas.is_empty() && !dataset.has_region_attribute() {
            return Err(ConfigError::MissingRegionAttribute);
        }
        Ok(())
    }
}
