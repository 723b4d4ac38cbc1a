//! Capital budgeting: projects and rules in, ranked portfolios out.
//!
//! The flow for one request is
//! [`RuleConfiguration::validate`] → [`blended_coefficients`] →
//! [`build_model`] → [`orchestrator::solve`] → [`extract`], with
//! [`KBestEnumerator`] filling in alternatives when the backend's own pool
//! comes up short. [`CapitalBudgetingEngine`] wires these together.

pub mod dataset;
pub mod engine;
pub mod enumerator;
pub mod extractor;
pub mod feasibility;
pub mod model_builder;
pub mod objective;
pub mod orchestrator;
pub mod rules;

pub use dataset::{DataWarning, Project, ProjectDataset};
pub use engine::{CapitalBudgetingEngine, EngineError, SolveReport};
pub use enumerator::{EnumerationOutcome, EnumeratorState, KBestEnumerator};
pub use extractor::{deduplicate, extract, PortfolioSolution};
pub use feasibility::{check_selection, Violation};
pub use model_builder::{build_model, BudgetModel, SELECTION_THRESHOLD};
pub use objective::{blended_coefficients, NORMALIZATION_EPSILON};
pub use orchestrator::{SolveAttempt, SolveStatus};
pub use rules::{ConfigError, Dependency, RegionQuota, RuleConfiguration};
