// Mappers: Convert between gRPC protobuf types and domain models
// Keeps protobuf types out of the budgeting core

use crate::budgeting::{
    CapitalBudgetingEngine, ConfigError, Dependency, EngineError, Project, ProjectDataset,
    RegionQuota, RuleConfiguration, SolveReport, SolveStatus,
};
use crate::domain::{SolverError, SolverBackend};
use tonic::Status;

pub mod capbudget {
    tonic::include_proto!("capbudget");
}

use capbudget as proto;

/// Convert protobuf Project to domain Project
pub fn proto_to_domain_project(proto_project: proto::Project) -> Project {
    let mut project = Project::new(proto_project.id, proto_project.cost, proto_project.benefit);
    project.secondary_score = proto_project.secondary_score;
    project.region = proto_project.region.filter(|r| !r.trim().is_empty());
    project.exclusive_group = proto_project.exclusive_group.filter(|g| !g.trim().is_empty());
    project.requires = proto_project.requires;
    project.resources = proto_project.resources.into_iter().collect();
    project.priority = proto_project.priority;
    project
}

/// Convert protobuf projects to a deduplicated dataset
pub fn proto_to_domain_dataset(projects: Vec<proto::Project>) -> ProjectDataset {
    projects.into_iter().map(proto_to_domain_project).collect()
}

/// Convert protobuf Rules to a domain RuleConfiguration
///
/// Range checks are left to [`RuleConfiguration::validate`].
pub fn proto_to_domain_rules(
    proto_rules: Option<proto::Rules>,
    dataset: &ProjectDataset,
) -> std::result::Result<RuleConfiguration, Box<Status>> {
    let proto_rules =
        proto_rules.ok_or_else(|| Box::new(Status::invalid_argument("Rules are required")))?;

    let mut rules = RuleConfiguration::new(proto_rules.budget);
    rules.resource_caps = proto_rules.resource_caps.into_iter().collect();
    rules.exclusive_groups = proto_rules
        .exclusive_groups
        .into_iter()
        .map(|g| g.project_ids)
        .collect();
    rules.dependencies = proto_rules
        .dependencies
        .into_iter()
        .map(|d| Dependency::new(d.prerequisite, d.dependent))
        .collect();
    rules.region_quotas = proto_rules
        .region_quotas
        .into_iter()
        .map(|(region, q)| (region, RegionQuota::new(q.min, q.max)))
        .collect();
    rules.cardinality_limit = proto_rules.cardinality_limit;
    if let Some(weight) = proto_rules.objective_weight {
        rules.objective_weight = weight;
    }
    rules.pool_size = proto_rules.pool_size as usize;
    rules.pool_gap = proto_rules.pool_gap;
    rules.time_limit_secs = proto_rules.time_limit_secs;
    rules.mip_gap = proto_rules.mip_gap;

    Ok(rules.with_dataset_rules(dataset))
}

/// Convert protobuf SolverBackend to domain SolverBackend
pub fn proto_to_domain_backend(value: i32) -> std::result::Result<SolverBackend, Box<Status>> {
    match proto::SolverBackend::try_from(value) {
        Ok(proto::SolverBackend::Auto) => Ok(SolverBackend::Auto),
        Ok(proto::SolverBackend::CoinCbc) => Ok(SolverBackend::CoinCbc),
        Ok(proto::SolverBackend::Highs) => Ok(SolverBackend::Highs),
        Err(_) => Err(Box::new(Status::invalid_argument("Invalid solver backend"))),
    }
}

pub fn domain_to_proto_status(status: SolveStatus) -> proto::SolveStatus {
    match status {
        SolveStatus::Optimal => proto::SolveStatus::Optimal,
        SolveStatus::TimeLimitWithIncumbent => proto::SolveStatus::TimeLimitWithIncumbent,
        SolveStatus::SuboptimalWithIncumbent => proto::SolveStatus::SuboptimalWithIncumbent,
        SolveStatus::Infeasible => proto::SolveStatus::Infeasible,
        SolveStatus::Unbounded => proto::SolveStatus::Unbounded,
        SolveStatus::NoIncumbent => proto::SolveStatus::NoIncumbent,
    }
}

/// Convert an engine report to the protobuf response
pub fn domain_to_proto_response(
    report: &SolveReport,
    dataset: &ProjectDataset,
    engine: &CapitalBudgetingEngine,
) -> proto::SolveResponse {
    let portfolios = report
        .solutions
        .iter()
        .map(|s| proto::Portfolio {
            sequence_number: s.sequence_number as u32,
            selected_ids: s.selected_ids.clone(),
            objective_value: s.objective_value,
            status: domain_to_proto_status(s.status) as i32,
            total_cost: s
                .selected_ids
                .iter()
                .filter_map(|id| dataset.get(id))
                .map(|p| p.cost)
                .sum(),
        })
        .collect();

    proto::SolveResponse {
        status: domain_to_proto_status(report.status) as i32,
        portfolios,
        warnings: report.diagnostics.iter().map(ToString::to_string).collect(),
        used_fallback: report.used_fallback,
        solver_name: engine.solver_name().to_string(),
        solve_time_ms: report.statistics.solve_time_ms,
    }
}

/// Map configuration problems to INVALID_ARGUMENT and everything else to INTERNAL
pub fn engine_error_to_status(error: EngineError) -> Status {
    match error {
        EngineError::Config(e) => config_error_to_status(e),
        EngineError::Solver(SolverError::InvalidProblem(msg)) => {
            Status::invalid_argument(format!("Invalid problem: {}", msg))
        }
        EngineError::Solver(e) => Status::internal(format!("Solver error: {}", e)),
    }
}

pub fn config_error_to_status(error: ConfigError) -> Status {
    Status::invalid_argument(format!("Configuration error: {}", error))
}
