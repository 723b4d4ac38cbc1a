// Infrastructure: Server setup and configuration
// Single Responsibility: Manage server lifecycle and configuration

use std::net::SocketAddr;
use tonic::transport::Server;
use tracing::info;

use crate::application::mappers::capbudget::capital_budgeting_server::CapitalBudgetingServer;
use crate::application::GrpcCapitalBudgetingService;
use crate::domain::SolverBackend;
use crate::solver::SolverFactory;

/// Environment variable holding the listen address
pub const ADDRESS_ENV: &str = "CAPBUDGET_ADDR";
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:50051";

pub struct ServerConfig {
    pub address: SocketAddr,
    /// Backend used when a request asks for `AUTO`
    pub default_backend: SolverBackend,
}

impl ServerConfig {
    pub fn new(address: SocketAddr, default_backend: SolverBackend) -> Self {
        Self {
            address,
            default_backend,
        }
    }

    /// Address from `CAPBUDGET_ADDR`, falling back to [`DEFAULT_ADDRESS`]
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let address = std::env::var(ADDRESS_ENV)
            .unwrap_or_else(|_| DEFAULT_ADDRESS.to_string())
            .parse()?;
        Ok(Self::new(address, SolverBackend::Auto))
    }
}

pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = GrpcCapitalBudgetingService::new(config.default_backend);

    let backends: Vec<String> = SolverFactory::available_backends()
        .iter()
        .map(ToString::to_string)
        .collect();
    info!(
        address = %config.address,
        default_backend = %config.default_backend,
        ?backends,
        "capital budgeting server listening"
    );

    Server::builder()
        .add_service(CapitalBudgetingServer::new(service))
        .serve(config.address)
        .await?;

    Ok(())
}
