use futures::TryStreamExt;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use super::mappers::{self, capbudget};
use crate::budgeting::CapitalBudgetingEngine;
use crate::domain::SolverBackend;
use crate::solver::SolverFactory;

/// gRPC service implementation
///
/// Each call builds its own engine and runs it on the blocking pool. A client
/// that drops the call stops waiting; the solve itself runs to completion.
pub struct GrpcCapitalBudgetingService {
    default_backend: SolverBackend,
}

impl GrpcCapitalBudgetingService {
    pub fn new(default_backend: SolverBackend) -> Self {
        Self { default_backend }
    }

    fn engine(&self, requested: i32) -> Result<CapitalBudgetingEngine, Status> {
        let backend = match mappers::proto_to_domain_backend(requested).map_err(|e| *e)? {
            SolverBackend::Auto => self.default_backend,
            backend => backend,
        };
        let solver = SolverFactory::create_from_backend(backend)
            .map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(CapitalBudgetingEngine::new(solver))
    }

    async fn run(
        &self,
        request_name: String,
        solver: i32,
        projects: Vec<capbudget::Project>,
        rules: Option<capbudget::Rules>,
    ) -> Result<capbudget::SolveResponse, Status> {
        let engine = self.engine(solver)?;
        let dataset = mappers::proto_to_domain_dataset(projects);
        let rules = mappers::proto_to_domain_rules(rules, &dataset).map_err(|e| *e)?;

        info!(
            request = %request_name,
            projects = dataset.len(),
            pool_size = rules.pool_size,
            solver = engine.solver_name(),
            "solving portfolio"
        );

        let (engine, dataset, report) = tokio::task::spawn_blocking(move || {
            let report = engine.solve(&dataset, &rules);
            (engine, dataset, report)
        })
        .await
        .map_err(|e| Status::internal(format!("Solve task failed: {}", e)))?;
        let report = report.map_err(mappers::engine_error_to_status)?;

        info!(
            request = %request_name,
            status = %report.status,
            portfolios = report.solutions.len(),
            "portfolio solved"
        );

        Ok(mappers::domain_to_proto_response(&report, &dataset, &engine))
    }
}

impl Default for GrpcCapitalBudgetingService {
    fn default() -> Self {
        Self::new(SolverBackend::Auto)
    }
}

#[tonic::async_trait]
impl capbudget::capital_budgeting_server::CapitalBudgeting for GrpcCapitalBudgetingService {
    async fn solve_portfolio(
        &self,
        request: Request<capbudget::SolveRequest>,
    ) -> Result<Response<capbudget::SolveResponse>, Status> {
        let req = request.into_inner();
        let response = self
            .run(req.request_name, req.solver, req.projects, req.rules)
            .await?;
        Ok(Response::new(response))
    }

    async fn solve_portfolio_stream(
        &self,
        request: Request<tonic::Streaming<capbudget::PortfolioChunk>>,
    ) -> Result<Response<capbudget::SolveResponse>, Status> {
        let chunks: Vec<capbudget::PortfolioChunk> = request.into_inner().try_collect().await?;

        let mut projects = Vec::new();
        let mut rules = None;
        let mut request_name = String::new();
        let mut solver = capbudget::SolverBackend::Auto as i32;

        for chunk in chunks {
            match chunk.chunk {
                Some(capbudget::portfolio_chunk::Chunk::Project(p)) => projects.push(p),
                Some(capbudget::portfolio_chunk::Chunk::Rules(r)) => rules = Some(r),
                Some(capbudget::portfolio_chunk::Chunk::Metadata(m)) => {
                    request_name = m.request_name;
                    solver = m.solver;
                }
                None => {}
            }
        }
        debug!(projects = projects.len(), "received streamed portfolio");

        let response = self.run(request_name, solver, projects, rules).await?;
        Ok(Response::new(response))
    }

    async fn validate_portfolio(
        &self,
        request: Request<capbudget::SolveRequest>,
    ) -> Result<Response<capbudget::ValidationResult>, Status> {
        let req = request.into_inner();
        let engine = self.engine(req.solver)?;
        let dataset = mappers::proto_to_domain_dataset(req.projects);
        let num_projects = dataset.len() as u32;
        let rules = mappers::proto_to_domain_rules(req.rules, &dataset).map_err(|e| *e)?;

        // Data warnings are reported even when the rules are rejected
        let (errors, warnings) = match engine.inspect(&dataset, &rules) {
            Ok(warnings) => (Vec::new(), warnings),
            Err(e) => (vec![e.to_string()], dataset.diagnostics()),
        };
        let warnings = warnings.iter().map(ToString::to_string).collect();

        Ok(Response::new(capbudget::ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            num_projects,
        }))
    }

    async fn get_available_solvers(
        &self,
        _request: Request<capbudget::Empty>,
    ) -> Result<Response<capbudget::AvailableSolvers>, Status> {
        let solvers = SolverFactory::available_backends()
            .into_iter()
            .filter_map(|backend| SolverFactory::create_from_backend(backend).ok())
            .map(|solver| capbudget::SolverInfo {
                name: solver.name().to_string(),
                supports_solution_pool: solver.supports_solution_pool(),
                capabilities: vec![
                    "Binary Programming".to_string(),
                    "Alternative Portfolios".to_string(),
                    "Time Limit".to_string(),
                    "Relative Gap".to_string(),
                ],
            })
            .collect();

        Ok(Response::new(capbudget::AvailableSolvers { solvers }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capbudget::capital_budgeting_server::CapitalBudgeting;

    #[tokio::test]
    async fn unknown_backend_is_invalid_argument() {
        let service = GrpcCapitalBudgetingService::default();
        let request = capbudget::SolveRequest {
            projects: Vec::new(),
            rules: Some(capbudget::Rules::default()),
            solver: 42,
            request_name: "bad".to_string(),
        };
        let err = service
            .solve_portfolio(Request::new(request))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[cfg(feature = "highs")]
    #[tokio::test]
    async fn solves_small_portfolio() {
        let service = GrpcCapitalBudgetingService::new(SolverBackend::Highs);
        let project = |id: &str, cost: f64, benefit: f64| capbudget::Project {
            id: id.to_string(),
            cost,
            benefit,
            ..Default::default()
        };
        let request = capbudget::SolveRequest {
            projects: vec![
                project("P1", 100.0, 50.0),
                project("P2", 200.0, 90.0),
                project("P3", 50.0, 30.0),
            ],
            rules: Some(capbudget::Rules {
                budget: 250.0,
                ..Default::default()
            }),
            solver: capbudget::SolverBackend::Auto as i32,
            request_name: "small".to_string(),
        };

        let response = service
            .solve_portfolio(Request::new(request))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.status, capbudget::SolveStatus::Optimal as i32);
        assert_eq!(response.portfolios.len(), 1);
        assert_eq!(response.portfolios[0].selected_ids, vec!["P2", "P3"]);
        assert_eq!(response.portfolios[0].total_cost, 250.0);
        assert_eq!(response.solver_name, "HiGHS");
    }

    #[tokio::test]
    async fn validation_reports_config_errors() {
        let service = GrpcCapitalBudgetingService::default();
        let request = capbudget::SolveRequest {
            projects: Vec::new(),
            rules: Some(capbudget::Rules {
                budget: -5.0,
                ..Default::default()
            }),
            solver: 0,
            request_name: String::new(),
        };
        let result = service.validate_portfolio(Request::new(request)).await;
        match result {
            Ok(response) => {
                let response = response.into_inner();
                assert!(!response.is_valid);
                assert_eq!(response.errors.len(), 1);
            }
            // no backend compiled in
            Err(status) => assert_eq!(status.code(), tonic::Code::Unavailable),
        }
    }
}
