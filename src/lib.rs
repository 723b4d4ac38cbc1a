// Domain layer: solver-facing models and the solver contract
pub mod domain;

// Capital budgeting: rules, model building, solving and alternatives
pub mod budgeting;

// Project data import and logging setup
pub mod importer;
pub mod logging;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Application layer: gRPC service and mappers
#[cfg(feature = "server")]
pub mod application;

// Infrastructure layer: External concerns (gRPC, server)
#[cfg(feature = "server")]
pub mod infrastructure;

// Re-export commonly used types
pub use budgeting::{
    CapitalBudgetingEngine, ConfigError, DataWarning, Dependency, EngineError, PortfolioSolution,
    Project, ProjectDataset, RegionQuota, RuleConfiguration, SolveReport, SolveStatus,
};
pub use domain::{
    Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, Solution, SolutionStatus,
    SolverBackend, SolverError, SolverService, Variable,
};
pub use importer::{load_projects, parse_projects, ImportError};

pub use solver::SolverFactory;
#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;

#[cfg(feature = "server")]
pub use application::GrpcCapitalBudgetingService;
#[cfg(feature = "server")]
pub use infrastructure::{start_server, ServerConfig};
