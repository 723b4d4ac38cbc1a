// Application layer: gRPC surface over the budgeting engine

pub mod grpc_service;
pub mod mappers;

pub use grpc_service::GrpcCapitalBudgetingService;
